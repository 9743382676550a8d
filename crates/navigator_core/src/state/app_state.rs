//! Navigator application state and its transition function.
//!
//! # Responsibility
//! - Hold every piece of view state in one serializable value.
//! - Turn user actions into new states plus an outcome.
//!
//! # Invariants
//! - `apply` clones; the receiver is never modified.
//! - Validation rejections produce `Outcome::Ignored` and no notice.
//! - Unknown-id updates produce `Outcome::Failed` and one error notice.
//! - A rejected draft submission keeps the form open with its input.

use crate::model::domain::{Domain, DomainId, DomainPatch, DomainType};
use crate::model::particle::{resolve_particles, ParticleView};
use crate::state::domain_registry::DomainRegistry;
use crate::state::notice::Notice;
use crate::state::perspective_registry::PerspectiveRegistry;
use crate::state::{MutationKind, StateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unsaved domain form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<DomainType>,
}

/// User-initiated state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    BeginAddDomain,
    CancelAddDomain,
    EditDraftName(String),
    EditDraftType(Option<DomainType>),
    /// Submits the current draft as a new domain.
    SubmitDraft,
    AddDomain {
        name: String,
        kind: Option<DomainType>,
    },
    UpdateDomain {
        id: DomainId,
        patch: DomainPatch,
    },
    ReplaceDomain(Domain),
    SetParticle {
        id: DomainId,
        perspective: String,
        key: String,
        value: String,
    },
    RemoveDomain(DomainId),
    AddPerspective(String),
    RemovePerspective(String),
    SetActivePerspective(String),
}

/// Result classification of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored,
    Failed(StateError),
}

/// New state produced by `AppState::apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: AppState,
    pub outcome: Outcome,
    /// Domain created or changed by the action, when there is one.
    pub domain: Option<Domain>,
}

/// Complete navigator view state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub domains: DomainRegistry,
    pub perspectives: PerspectiveRegistry,
    #[serde(default)]
    pub draft: DomainDraft,
    #[serde(default)]
    pub is_adding_domain: bool,
    /// In-flight marks are process-local and never part of a snapshot.
    #[serde(skip)]
    pending: BTreeSet<MutationKind>,
    #[serde(default)]
    notices: Vec<Notice>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one action and returns the resulting state.
    pub fn apply(&self, action: Action) -> Transition {
        let mut next = self.clone();
        let result = next.apply_in_place(action);
        let (outcome, domain) = match result {
            Ok(Some(domain)) => (Outcome::Applied, Some(domain)),
            Ok(None) => (Outcome::Applied, None),
            Err(StateError::Validation(_)) => (Outcome::Ignored, None),
            Err(err) => {
                next.push_notice(Notice::error("Action failed", err.to_string()));
                (Outcome::Failed(err), None)
            }
        };
        let outcome = if outcome == Outcome::Applied && domain.is_none() && next == *self {
            Outcome::Ignored
        } else {
            outcome
        };
        Transition {
            state: next,
            outcome,
            domain,
        }
    }

    fn apply_in_place(&mut self, action: Action) -> Result<Option<Domain>, StateError> {
        match action {
            Action::BeginAddDomain => {
                self.is_adding_domain = true;
                Ok(None)
            }
            Action::CancelAddDomain => {
                self.is_adding_domain = false;
                self.draft = DomainDraft::default();
                Ok(None)
            }
            Action::EditDraftName(name) => {
                self.draft.name = name;
                Ok(None)
            }
            Action::EditDraftType(kind) => {
                self.draft.kind = kind;
                Ok(None)
            }
            Action::SubmitDraft => {
                let created = self.domains.add(&self.draft.name, self.draft.kind);
                if created.is_some() {
                    self.complete_draft();
                }
                Ok(created)
            }
            Action::AddDomain { name, kind } => Ok(self.domains.add(&name, kind)),
            Action::UpdateDomain { id, patch } => self.domains.update(id, &patch).map(Some),
            Action::ReplaceDomain(domain) => self.domains.replace(domain).map(Some),
            Action::SetParticle {
                id,
                perspective,
                key,
                value,
            } => self
                .domains
                .set_particle(id, &perspective, &key, &value)
                .map(Some),
            Action::RemoveDomain(id) => {
                self.domains.remove(id);
                Ok(None)
            }
            Action::AddPerspective(name) => {
                self.perspectives.add(&name);
                Ok(None)
            }
            Action::RemovePerspective(name) => {
                self.perspectives.remove(&name);
                Ok(None)
            }
            Action::SetActivePerspective(name) => {
                self.perspectives.set_active(name);
                Ok(None)
            }
        }
    }

    /// Clears the form after a confirmed creation.
    pub fn complete_draft(&mut self) {
        self.draft = DomainDraft::default();
        self.is_adding_domain = false;
    }

    /// Particles of one domain under the active perspective.
    pub fn particles(&self, id: DomainId) -> Option<Vec<ParticleView>> {
        self.domains
            .get(id)
            .map(|domain| resolve_particles(domain, self.perspectives.active()))
    }

    /// Marks `kind` as in flight.
    ///
    /// # Errors
    /// - `Busy` when the same kind is already in flight; the triggering
    ///   control is expected to be disabled in that window.
    pub fn begin_mutation(&mut self, kind: MutationKind) -> Result<(), StateError> {
        if !self.pending.insert(kind) {
            return Err(StateError::Busy(kind));
        }
        Ok(())
    }

    pub fn finish_mutation(&mut self, kind: MutationKind) {
        self.pending.remove(&kind);
    }

    pub fn is_pending(&self, kind: MutationKind) -> bool {
        self.pending.contains(&kind)
    }

    /// Drops every in-flight mark.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Takes every queued notice, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }
}
