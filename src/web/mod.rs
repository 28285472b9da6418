//! Inbound control API module (spec.md §6).

pub mod auth;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::WebState;
