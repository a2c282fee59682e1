//! Domain atoms for the portfolio backend.
//!
//! Each atom owns a model, the port (trait) through which the hosted backend
//! is reached, the service functions the rest of the system calls, and the
//! HTTP handlers that expose those functions. Atoms take their ports as
//! arguments; nothing here reaches for global clients.

pub mod artworks;
pub mod clock;
pub mod contact;
pub mod error;
pub mod media;
pub mod respond;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use clock::{Clock, SystemClock};
pub use error::{AuthError, ContactError, DataError, UploadError, ValidationError};
