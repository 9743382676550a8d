//! In-memory perspective registry and active selection.
//!
//! # Invariants
//! - `Default` is always registered and always first.
//! - Names are unique by exact match.
//! - Removing the active perspective resets the selection to `Default`.

use crate::model::perspective::{
    is_default_perspective, normalize_perspective_name, DEFAULT_PERSPECTIVE,
    UNKNOWN_PERSPECTIVE_LABEL,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PerspectiveRegistrySnapshot", into = "PerspectiveRegistrySnapshot")]
pub struct PerspectiveRegistry {
    names: Vec<String>,
    active: String,
}

impl Default for PerspectiveRegistry {
    fn default() -> Self {
        Self {
            names: vec![DEFAULT_PERSPECTIVE.to_string()],
            active: DEFAULT_PERSPECTIVE.to_string(),
        }
    }
}

impl PerspectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from stored names, keeping the first occurrence of
    /// each and putting `Default` first.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        registry.replace_names(names);
        registry
    }

    /// Replaces registered names with a freshly read list. The active
    /// selection is kept as-is, even when no longer registered.
    pub fn replace_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names = vec![DEFAULT_PERSPECTIVE.to_string()];
        for name in names {
            self.add(name.as_ref());
        }
    }

    /// Registers a perspective; returns whether it was added.
    ///
    /// Blank or already registered names are ignored.
    pub fn add(&mut self, name: &str) -> bool {
        let Some(name) = normalize_perspective_name(name) else {
            return false;
        };
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// Unregisters a perspective; returns whether it was removed.
    ///
    /// `Default` is never removed. `name` is trimmed the same way `add`
    /// trims it.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(name) = normalize_perspective_name(name) else {
            return false;
        };
        if is_default_perspective(&name) {
            return false;
        }
        let before = self.names.len();
        self.names.retain(|existing| *existing != name);
        let removed = self.names.len() != before;
        if self.active == name {
            self.active = DEFAULT_PERSPECTIVE.to_string();
        }
        removed
    }

    /// Changes the active selection. Unknown names are accepted.
    pub fn set_active(&mut self, name: impl Into<String>) {
        self.active = name.into();
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    /// Display label of the active selection; `N/A` when not registered.
    pub fn active_label(&self) -> &str {
        if self.contains(&self.active) {
            &self.active
        } else {
            UNKNOWN_PERSPECTIVE_LABEL
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|existing| existing == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[derive(Serialize, Deserialize)]
struct PerspectiveRegistrySnapshot {
    names: Vec<String>,
    active: String,
}

impl TryFrom<PerspectiveRegistrySnapshot> for PerspectiveRegistry {
    type Error = String;

    fn try_from(value: PerspectiveRegistrySnapshot) -> Result<Self, Self::Error> {
        if value.active.is_empty() {
            return Err("active perspective cannot be empty".to_string());
        }
        let mut registry = Self::from_names(value.names);
        registry.set_active(value.active);
        Ok(registry)
    }
}

impl From<PerspectiveRegistry> for PerspectiveRegistrySnapshot {
    fn from(value: PerspectiveRegistry) -> Self {
        Self {
            names: value.names,
            active: value.active,
        }
    }
}
