use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Output formats an export can produce, named by their file name.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr, Serialize,
)]
pub enum ExportFormat {
    #[strum(serialize = "constraints.txt")]
    #[serde(rename = "constraints.txt")]
    ConstraintsTxt,
    #[strum(serialize = "requirements.txt")]
    #[serde(rename = "requirements.txt")]
    RequirementsTxt,
}

/// What a format lets through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportPolicy {
    /// Keep `name[extra]` on registry and local lines.
    pub include_extras: bool,
    /// Emit `-e` lines for packages locked in develop mode.
    pub allow_editable: bool,
}

impl ExportFormat {
    #[must_use]
    pub fn policy(self) -> ExportPolicy {
        match self {
            Self::RequirementsTxt => ExportPolicy {
                include_extras: true,
                allow_editable: true,
            },
            Self::ConstraintsTxt => ExportPolicy {
                include_extras: false,
                allow_editable: false,
            },
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Every supported format name.
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::iter().map(Self::as_str).collect()
    }
}
