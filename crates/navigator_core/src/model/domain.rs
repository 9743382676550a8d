//! Domain record model.
//!
//! # Responsibility
//! - Define the canonical domain record and its fixed type set.
//! - Provide creation, merge-patch and particle edit helpers.
//!
//! # Invariants
//! - `name` is never blank after `validate()`.
//! - A domain built by `Domain::from_form` has a `Default` perspective entry.
//! - Patches merge particle maps per perspective; they never drop keys.

use crate::model::perspective::DEFAULT_PERSPECTIVE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a domain record.
pub type DomainId = Uuid;

/// Particle name -> value for one perspective.
pub type ParticleMap = BTreeMap<String, String>;

/// Perspective name -> particle map.
pub type PerspectiveMap = BTreeMap<String, ParticleMap>;

/// Fixed set of domain categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DomainType {
    Trust,
    Knowledge,
    Tools,
    Exchange,
}

impl DomainType {
    /// All selectable types in display order.
    pub const ALL: [DomainType; 4] = [
        DomainType::Trust,
        DomainType::Knowledge,
        DomainType::Tools,
        DomainType::Exchange,
    ];

    /// Human-facing label, also used in form selections.
    pub fn label(self) -> &'static str {
        match self {
            Self::Trust => "Trust",
            Self::Knowledge => "Knowledge",
            Self::Tools => "Tools",
            Self::Exchange => "Exchange",
        }
    }

    /// Parses a form selection label. Matching ignores case and surrounding
    /// whitespace; an empty selection yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(trimmed))
    }

    /// Particle keys shown for a domain of this type when nothing is recorded.
    pub fn default_particles(self) -> &'static [&'static str] {
        match self {
            Self::Trust => &["Security Protocol", "Identity Verification", "Trust Score"],
            Self::Knowledge => &["Learning Path", "Webinar", "Information Sharing"],
            Self::Tools => &["Task Management", "Timeline", "Resource Allocation"],
            Self::Exchange => &["Payment Processing", "Service Listing", "Reviews"],
        }
    }
}

impl Display for DomainType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Validation errors for domain records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainValidationError {
    EmptyName,
    EmptyPerspectiveName,
    EmptyParticleKey { perspective: String },
}

impl Display for DomainValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "domain name cannot be empty"),
            Self::EmptyPerspectiveName => write!(f, "perspective name cannot be empty"),
            Self::EmptyParticleKey { perspective } => {
                write!(f, "particle key cannot be empty (perspective `{perspective}`)")
            }
        }
    }
}

impl Error for DomainValidationError {}

/// Canonical domain record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    pub name: String,
    /// Serialized as `type` to match the form field naming.
    #[serde(rename = "type")]
    pub kind: DomainType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub perspectives: PerspectiveMap,
}

impl Domain {
    /// Creates a domain with a fresh id and an empty `Default` entry.
    pub fn new(name: impl Into<String>, kind: DomainType) -> Self {
        Self::with_id(Uuid::new_v4(), name, kind)
    }

    /// Creates a domain with a caller-provided id.
    ///
    /// Used by read paths where identity already exists in the store.
    pub fn with_id(id: DomainId, name: impl Into<String>, kind: DomainType) -> Self {
        let mut perspectives = PerspectiveMap::new();
        perspectives.insert(DEFAULT_PERSPECTIVE.to_string(), ParticleMap::new());
        Self {
            id,
            name: name.into(),
            kind,
            description: None,
            perspectives,
        }
    }

    /// Builds a new domain from raw form input.
    ///
    /// Returns `None` for a blank name or a missing type; callers treat that
    /// as a silent rejection.
    pub fn from_form(name: &str, kind: Option<DomainType>) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, kind?))
    }

    /// Checks record-level invariants before persistence or state changes.
    pub fn validate(&self) -> Result<(), DomainValidationError> {
        if self.name.trim().is_empty() {
            return Err(DomainValidationError::EmptyName);
        }
        for (perspective, particles) in &self.perspectives {
            if perspective.trim().is_empty() {
                return Err(DomainValidationError::EmptyPerspectiveName);
            }
            if particles.keys().any(|key| key.trim().is_empty()) {
                return Err(DomainValidationError::EmptyParticleKey {
                    perspective: perspective.clone(),
                });
            }
        }
        Ok(())
    }

    /// Merges `patch` into this record.
    pub fn apply_patch(&mut self, patch: &DomainPatch) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        for (perspective, particles) in &patch.perspectives {
            self.perspectives
                .entry(perspective.clone())
                .or_default()
                .extend(particles.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    /// Records one particle value under `perspective`.
    pub fn set_particle(
        &mut self,
        perspective: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.perspectives
            .entry(perspective.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Recorded particles for one perspective, if any.
    pub fn particles_for(&self, perspective: &str) -> Option<&ParticleMap> {
        self.perspectives.get(perspective)
    }
}

/// Partial update for a domain.
///
/// `None` fields are left untouched. `description: Some(None)` clears the
/// description. `perspectives` entries are merged key by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<DomainType>,
    #[serde(default)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub perspectives: PerspectiveMap,
}

impl DomainPatch {
    /// Patch that records a single particle value.
    pub fn particle(
        perspective: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let mut particles = ParticleMap::new();
        particles.insert(key.into(), value.into());
        let mut perspectives = PerspectiveMap::new();
        perspectives.insert(perspective.into(), particles);
        Self {
            perspectives,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.description.is_none()
            && self.perspectives.is_empty()
    }
}
