//! Conversational query gateway for the health dashboard.
//!
//! Free-text questions from the dashboard's chat widget become turns in a
//! Genie conversation; answers are polled for and rendered into HTML
//! fragments kept in a per-session history.

pub mod config;
pub mod error;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod services;
pub mod state;

pub use error::GatewayError;
pub use services::gateway::Gateway;
pub use state::{AppState, SessionHandle, SessionStore};
