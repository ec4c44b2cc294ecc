//! HTTP front end.
//!
//! Exposes the enriched vehicle list and per-stop estimates as JSON.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
