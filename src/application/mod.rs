//! Application services layer.

pub mod analytics;
pub mod blog;
pub mod content;
pub mod error;
pub mod repos;
