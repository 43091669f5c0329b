//! Paper Digest server: batch pipeline runner and HTTP endpoints.

pub mod pipeline;
pub mod routes;
pub mod state;

pub use state::AppState;
