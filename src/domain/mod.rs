//! Domain layer types and invariants.

pub mod analytics;
pub mod entities;
pub mod error;
pub mod slug;
pub mod types;
