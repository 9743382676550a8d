//! Flutter-facing bindings for the Domain Navigator core.

pub mod api;
