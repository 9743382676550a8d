//! Typed domain model for the navigator.
//!
//! # Responsibility
//! - Define domains, perspectives, particles and user records.
//! - Keep particle data in typed nested maps instead of ad-hoc objects.
//!
//! # Invariants
//! - Every domain is identified by a stable `DomainId`.
//! - The `Default` perspective always exists and is never removed.

pub mod domain;
pub mod particle;
pub mod perspective;
pub mod user;
