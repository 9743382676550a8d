//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls, cache invalidation and state
//!   reconciliation for the remote-backed navigator.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod navigator_service;
