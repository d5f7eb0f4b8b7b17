//! Lectern server library: the HTTP API over the classroom services.

pub mod http;

pub use http::{router, serve, ApiError, AppState};
