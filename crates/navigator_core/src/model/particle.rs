//! Particle view resolution.
//!
//! Pure projection from a domain and the active perspective to the ordered
//! list of key/value pairs the UI renders. Type defaults are a display
//! fallback only and are never written back to a domain.

use crate::model::domain::Domain;
use serde::{Deserialize, Serialize};

/// Value shown for type-default particles that have no recorded value.
pub const PARTICLE_PLACEHOLDER: &str = "Not configured";

/// Where a resolved particle value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleSource {
    Recorded,
    TypeDefault,
}

/// One displayable particle row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleView {
    pub key: String,
    pub value: String,
    pub source: ParticleSource,
}

/// Resolves the particles to display for `domain` under `active`.
///
/// Order of resolution:
/// 1. recorded entries for `active`, in key order, when non-empty;
/// 2. the type's default keys with `PARTICLE_PLACEHOLDER`;
/// 3. nothing.
pub fn resolve_particles(domain: &Domain, active: &str) -> Vec<ParticleView> {
    if let Some(recorded) = domain.particles_for(active).filter(|map| !map.is_empty()) {
        return recorded
            .iter()
            .map(|(key, value)| ParticleView {
                key: key.clone(),
                value: value.clone(),
                source: ParticleSource::Recorded,
            })
            .collect();
    }

    domain
        .kind
        .default_particles()
        .iter()
        .map(|key| ParticleView {
            key: (*key).to_string(),
            value: PARTICLE_PLACEHOLDER.to_string(),
            source: ParticleSource::TypeDefault,
        })
        .collect()
}
