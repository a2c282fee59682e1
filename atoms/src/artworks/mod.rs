// Re-export model types and service functions
pub mod http;
pub mod model;
pub mod service;
pub mod store;

pub use http::*;
pub use model::{Artwork, ArtworkFilter, ArtworkPatch, NewArtwork};
pub use service::*;
pub use store::{ArtworkStore, DynamoArtworkStore};
