//! In-memory domain registry.
//!
//! # Invariants
//! - `list()` preserves insertion order.
//! - Invalid form input leaves the registry untouched.
//! - `remove` of an unknown id is a no-op, not an error.

use crate::model::domain::{Domain, DomainId, DomainPatch, DomainType};
use crate::state::StateError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainRegistry {
    domains: Vec<Domain>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from records already ordered by the caller.
    pub fn from_domains(domains: Vec<Domain>) -> Self {
        Self { domains }
    }

    /// Adds a domain from form input.
    ///
    /// Returns `None` without touching the registry when `name` is blank or
    /// `kind` is missing.
    pub fn add(&mut self, name: &str, kind: Option<DomainType>) -> Option<Domain> {
        let domain = Domain::from_form(name, kind)?;
        self.domains.push(domain.clone());
        Some(domain)
    }

    /// Merges `patch` into the domain with `id`.
    ///
    /// # Errors
    /// - `DomainNotFound` for an unknown id.
    /// - `Validation` when the merged record is invalid; the registry is
    ///   left unchanged.
    pub fn update(&mut self, id: DomainId, patch: &DomainPatch) -> Result<Domain, StateError> {
        let slot = self.slot_mut(id)?;
        let mut merged = slot.clone();
        merged.apply_patch(patch);
        merged.validate()?;
        *slot = merged.clone();
        Ok(merged)
    }

    /// Replaces the whole record with the same id.
    pub fn replace(&mut self, domain: Domain) -> Result<Domain, StateError> {
        domain.validate()?;
        let slot = self.slot_mut(domain.id)?;
        *slot = domain.clone();
        Ok(domain)
    }

    /// Records one particle value for a domain.
    pub fn set_particle(
        &mut self,
        id: DomainId,
        perspective: &str,
        key: &str,
        value: &str,
    ) -> Result<Domain, StateError> {
        self.update(id, &DomainPatch::particle(perspective, key, value))
    }

    /// Removes the domain; returns whether anything was removed.
    pub fn remove(&mut self, id: DomainId) -> bool {
        let before = self.domains.len();
        self.domains.retain(|domain| domain.id != id);
        self.domains.len() != before
    }

    pub fn get(&self, id: DomainId) -> Option<&Domain> {
        self.domains.iter().find(|domain| domain.id == id)
    }

    pub fn list(&self) -> &[Domain] {
        &self.domains
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    fn slot_mut(&mut self, id: DomainId) -> Result<&mut Domain, StateError> {
        self.domains
            .iter_mut()
            .find(|domain| domain.id == id)
            .ok_or(StateError::DomainNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::DomainRegistry;
    use crate::model::domain::{DomainPatch, DomainType};
    use crate::state::StateError;
    use uuid::Uuid;

    #[test]
    fn add_with_blank_name_or_missing_type_is_ignored() {
        let mut registry = DomainRegistry::new();
        assert!(registry.add("", Some(DomainType::Trust)).is_none());
        assert!(registry.add("  ", Some(DomainType::Trust)).is_none());
        assert!(registry.add("Acme", None).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn add_appends_one_record_with_default_perspective() {
        let mut registry = DomainRegistry::new();
        let domain = registry.add("Acme", Some(DomainType::Trust)).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list()[0].id, domain.id);
        assert!(domain.perspectives.contains_key("Default"));
    }

    #[test]
    fn list_keeps_insertion_order() {
        let mut registry = DomainRegistry::new();
        let first = registry.add("B", Some(DomainType::Tools)).unwrap();
        let second = registry.add("A", Some(DomainType::Tools)).unwrap();

        let ids = registry.list().iter().map(|d| d.id).collect::<Vec<_>>();
        assert_eq!(ids, [first.id, second.id]);
    }

    #[test]
    fn update_unknown_id_reports_not_found() {
        let mut registry = DomainRegistry::new();
        let missing = Uuid::new_v4();
        let err = registry
            .update(missing, &DomainPatch::default())
            .unwrap_err();
        assert_eq!(err, StateError::DomainNotFound(missing));
    }

    #[test]
    fn update_with_blank_name_keeps_previous_record() {
        let mut registry = DomainRegistry::new();
        let domain = registry.add("Acme", Some(DomainType::Trust)).unwrap();
        let patch = DomainPatch {
            name: Some(" ".to_string()),
            ..DomainPatch::default()
        };

        assert!(matches!(
            registry.update(domain.id, &patch),
            Err(StateError::Validation(_))
        ));
        assert_eq!(registry.get(domain.id).unwrap().name, "Acme");
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = DomainRegistry::new();
        let domain = registry.add("Acme", Some(DomainType::Trust)).unwrap();

        assert!(registry.remove(domain.id));
        assert!(!registry.remove(domain.id));
        assert!(registry.is_empty());
    }
}
