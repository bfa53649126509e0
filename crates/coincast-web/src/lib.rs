//! coincast-web library target.
//!
//! Exposes the router, state and settings so `tests/` can drive the service
//! in-process. `main.rs` only wires tracing, middleware and the listener.

pub mod api_types;
pub mod error;
pub mod routes;
pub mod settings;
pub mod state;
