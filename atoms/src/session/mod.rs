// Re-export model types and service functions
pub mod context;
pub mod model;
pub mod provider;
pub mod service;

pub use context::SessionContext;
pub use model::{Identity, Session, SessionTokens};
pub use provider::IdentityProvider;
pub use service::*;
