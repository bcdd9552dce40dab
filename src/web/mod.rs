//! Web server module
//!
//! Provides the search form, results table, CSV download and JSON API.

mod handlers;
mod routes;
mod state;
mod templates;

pub use routes::create_router;
pub use state::AppState;
pub use templates::Templates;
