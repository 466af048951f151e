//! Blog content API: categories, posts, headings and per-post engagement
//! counters served over HTTP.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
