//! HTTP surfaces: the public `/posts` router and the admin router.

pub mod admin;
mod client_ip;
pub mod error;
mod middleware;
pub mod models;
pub mod public;

pub use admin::{AdminState, build_admin_router};
pub use client_ip::ClientIp;
pub use error::ApiError;
pub use public::{HttpState, build_router};
