//! AWS adapters, configuration and HTTP plumbing shared by the lambdas.

pub mod auth;
pub mod config;
pub mod contact;
pub mod email;
pub mod http;
pub mod state;

pub use config::{Config, ConfigError};
pub use state::AppState;
