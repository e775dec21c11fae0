//! CLI-facing outcome shaping.

mod messages;
pub(crate) mod outcome;

pub(crate) use messages::*;
