//! Poetry version constraints (`^1.2`, `~1.2`, `>=1,<2 || ==3.0`, `*`).
//!
//! Constraints are normalized into plain PEP 440 clauses so `pep440_rs` can
//! answer membership questions, and so the project's python constraint can be
//! rendered as an environment marker.

use std::fmt;
use std::str::FromStr;

use pep440_rs::{Version, VersionSpecifiers};

use crate::marker::{MarkerOperator, MarkerTree};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionConstraint {
    raw: String,
    /// Union of conjunctions; empty means "any version".
    alternatives: Vec<Vec<Bound>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Bound {
    operator: &'static str,
    version: String,
}

impl Bound {
    fn new(operator: &'static str, version: impl Into<String>) -> Self {
        Self {
            operator,
            version: version.into(),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid version constraint `{constraint}`: {reason}")]
pub struct ConstraintParseError {
    pub constraint: String,
    pub reason: String,
}

const OPERATORS: [&str; 9] = ["===", "==", "!=", "~=", "<=", ">=", "<", ">", "="];

impl VersionConstraint {
    #[must_use]
    pub fn any() -> Self {
        Self {
            raw: "*".to_string(),
            alternatives: Vec::new(),
        }
    }

    #[must_use]
    pub fn exact(version: &str) -> Self {
        Self {
            raw: version.to_string(),
            alternatives: vec![vec![Bound::new("==", version)]],
        }
    }

    pub fn parse(text: &str) -> Result<Self, ConstraintParseError> {
        let raw = text.trim();
        let mut alternatives = Vec::new();
        for branch in raw.split("||").flat_map(|part| part.split('|')) {
            let bounds = parse_conjunction(branch).map_err(|reason| ConstraintParseError {
                constraint: raw.to_string(),
                reason,
            })?;
            if bounds.is_empty() {
                // one unconstrained branch makes the whole union unconstrained
                return Ok(Self {
                    raw: raw.to_string(),
                    alternatives: Vec::new(),
                });
            }
            alternatives.push(bounds);
        }
        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        self.alternatives.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `version` satisfies the constraint. Versions or clauses that
    /// fail to parse are treated as allowed.
    pub fn allows(&self, version: &str) -> bool {
        if self.is_any() {
            return true;
        }
        let Ok(version) = Version::from_str(version.trim()) else {
            return true;
        };
        self.alternatives.iter().any(|bounds| {
            let joined = join_bounds(bounds);
            VersionSpecifiers::from_str(&joined)
                .map(|specifiers| specifiers.contains(&version))
                .unwrap_or(true)
        })
    }

    /// PEP 440 rendering; unions stay `||`-separated since PEP 440 has no
    /// disjunction.
    #[must_use]
    pub fn to_pep440(&self) -> String {
        self.alternatives
            .iter()
            .map(|bounds| join_bounds(bounds))
            .collect::<Vec<_>>()
            .join(" || ")
    }

    /// Renders the constraint as a marker over the interpreter version.
    #[must_use]
    pub fn to_python_marker(&self) -> MarkerTree {
        if self.is_any() {
            return MarkerTree::Any;
        }
        self.alternatives
            .iter()
            .map(|bounds| {
                bounds
                    .iter()
                    .map(python_marker_for)
                    .fold(MarkerTree::Any, |acc, marker| acc.intersect(&marker))
            })
            .fold(MarkerTree::Empty, |acc, marker| acc.union(&marker))
    }
}

impl FromStr for VersionConstraint {
    type Err = ConstraintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            f.write_str("*")
        } else {
            f.write_str(&self.to_pep440())
        }
    }
}

fn join_bounds(bounds: &[Bound]) -> String {
    bounds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_conjunction(branch: &str) -> Result<Vec<Bound>, String> {
    let mut clauses = Vec::new();
    let mut pending: Option<String> = None;
    for token in branch
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|token| !token.is_empty())
    {
        let token = match pending.take() {
            Some(op) => format!("{op}{token}"),
            None => token.to_string(),
        };
        if OPERATORS.contains(&token.as_str()) || token == "^" || token == "~" {
            pending = Some(token);
            continue;
        }
        clauses.push(token);
    }
    if let Some(op) = pending {
        return Err(format!("operator `{op}` has no version"));
    }

    let mut bounds = Vec::new();
    for clause in clauses {
        bounds.extend(parse_clause(&clause)?);
    }
    Ok(bounds)
}

fn parse_clause(clause: &str) -> Result<Vec<Bound>, String> {
    if clause == "*" {
        return Ok(Vec::new());
    }
    if let Some(version) = clause.strip_prefix('^') {
        return caret(version);
    }
    if let Some(version) = clause.strip_prefix("~=") {
        let upper = bump(version, release_len(version)?.saturating_sub(2))?;
        return Ok(vec![Bound::new(">=", version), Bound::new("<", upper)]);
    }
    if let Some(version) = clause.strip_prefix('~') {
        let index = usize::from(release_len(version)? >= 2);
        return Ok(vec![Bound::new(">=", version), Bound::new("<", bump(version, index)?)]);
    }
    for operator in OPERATORS {
        if let Some(version) = clause.strip_prefix(operator) {
            let operator = if operator == "=" { "==" } else { operator };
            return Ok(vec![Bound::new(operator, version)]);
        }
    }
    Ok(vec![Bound::new("==", clause)])
}

fn caret(version: &str) -> Result<Vec<Bound>, String> {
    let release = release_segments(version)?;
    let index = release
        .iter()
        .position(|segment| *segment != 0)
        .unwrap_or(release.len() - 1);
    Ok(vec![
        Bound::new(">=", version),
        Bound::new("<", bump(version, index)?),
    ])
}

fn release_segments(version: &str) -> Result<Vec<u64>, String> {
    let segments: Vec<u64> = version
        .split('.')
        .map_while(|part| part.parse::<u64>().ok())
        .collect();
    if segments.is_empty() {
        return Err(format!("`{version}` has no release segments"));
    }
    Ok(segments)
}

fn release_len(version: &str) -> Result<usize, String> {
    release_segments(version).map(|segments| segments.len())
}

/// Increments the release segment at `index`, zeroing the rest while keeping
/// the original number of segments.
fn bump(version: &str, index: usize) -> Result<String, String> {
    let mut release = release_segments(version)?;
    let index = index.min(release.len() - 1);
    release[index] += 1;
    for segment in release.iter_mut().skip(index + 1) {
        *segment = 0;
    }
    Ok(release
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("."))
}

fn python_marker_for(bound: &Bound) -> MarkerTree {
    let operator = match bound.operator {
        "==" => MarkerOperator::Equal,
        "!=" => MarkerOperator::NotEqual,
        "<" => MarkerOperator::LessThan,
        "<=" => MarkerOperator::LessEqual,
        ">" => MarkerOperator::GreaterThan,
        ">=" => MarkerOperator::GreaterEqual,
        "~=" => MarkerOperator::Compatible,
        _ => MarkerOperator::Arbitrary,
    };
    if let Some(prefix) = bound.version.strip_suffix(".*") {
        return MarkerTree::expression("python_version", operator, prefix);
    }
    let variable = if bound.version.split('.').count() >= 3 {
        "python_full_version"
    } else {
        "python_version"
    };
    MarkerTree::expression(variable, operator, &bound.version)
}
