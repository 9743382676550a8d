//! Perspective model.
//!
//! # Invariants
//! - Perspective names are unique by exact, case-sensitive match.
//! - `DEFAULT_PERSPECTIVE` is permanent.

use serde::{Deserialize, Serialize};

/// Name of the permanent perspective every domain is created under.
pub const DEFAULT_PERSPECTIVE: &str = "Default";

/// Label rendered for an active selection that is not registered.
pub const UNKNOWN_PERSPECTIVE_LABEL: &str = "N/A";

/// Store-assigned numeric perspective id.
pub type PerspectiveId = i64;

/// Persisted perspective row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perspective {
    pub id: PerspectiveId,
    #[serde(rename = "perspective_name")]
    pub name: String,
}

impl Perspective {
    pub fn is_default(&self) -> bool {
        is_default_perspective(&self.name)
    }
}

pub fn is_default_perspective(name: &str) -> bool {
    name == DEFAULT_PERSPECTIVE
}

/// Trims raw input; blank input yields `None`.
pub fn normalize_perspective_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{is_default_perspective, normalize_perspective_name};

    #[test]
    fn default_match_is_case_sensitive() {
        assert!(is_default_perspective("Default"));
        assert!(!is_default_perspective("default"));
    }

    #[test]
    fn normalize_trims_and_rejects_blank() {
        assert_eq!(normalize_perspective_name("  Ops "), Some("Ops".to_string()));
        assert_eq!(normalize_perspective_name(" \t"), None);
    }
}
