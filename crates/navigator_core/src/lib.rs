//! Core domain logic for the Domain Navigator.
//! This crate is the single source of truth for domain, perspective and
//! particle invariants.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod state;

pub use cache::{QueryCache, QueryKey};
pub use config::NavigatorConfig;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::domain::{
    Domain, DomainId, DomainPatch, DomainType, DomainValidationError, ParticleMap, PerspectiveMap,
};
pub use model::particle::{resolve_particles, ParticleSource, ParticleView, PARTICLE_PLACEHOLDER};
pub use model::perspective::{
    Perspective, PerspectiveId, DEFAULT_PERSPECTIVE, UNKNOWN_PERSPECTIVE_LABEL,
};
pub use model::user::{UserId, UserPatch, UserRecord};
pub use repo::domain_repo::{DomainRepository, SqliteDomainRepository};
pub use repo::perspective_repo::{PerspectiveRepository, SqlitePerspectiveRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult, Table};
pub use service::navigator_service::{NavigatorError, NavigatorResult, NavigatorService};
pub use state::app_state::{Action, AppState, DomainDraft, Outcome, Transition};
pub use state::domain_registry::DomainRegistry;
pub use state::notice::{Notice, NoticeLevel};
pub use state::perspective_registry::PerspectiveRegistry;
pub use state::{MutationKind, StateError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
