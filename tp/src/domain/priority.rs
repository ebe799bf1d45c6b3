//! Priority buckets for analyzed tasks

use serde::{Deserialize, Serialize};

/// Priority bucket a task is placed in
///
/// Variants are declared from most to least urgent, so `Ord` sorts
/// `Must` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Must,
    Should,
    Optional,
}

impl Priority {
    /// All buckets, highest priority first
    pub const ALL: [Priority; 3] = [Priority::Must, Priority::Should, Priority::Optional];

    /// Key used for this bucket in the engine's JSON
    pub fn key(&self) -> &'static str {
        match self {
            Self::Must => "must",
            Self::Should => "should",
            Self::Optional => "optional",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
