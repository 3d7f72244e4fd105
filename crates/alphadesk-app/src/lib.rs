//! alphadesk command-line client.
//!
//! Wires configuration, the REST client and the view state together:
//! - entity and alias triage (search, link, ignore, create, edit)
//! - mention feed with expandable message branches
//! - swap and floor-price rule tuning

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
mod render;

pub use app::Application;
pub use cli::Command;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
