//! View models for the public site and the admin area.
//!
//! Nothing here renders. Each view holds the state a page needs and talks to
//! the data-access atoms through the ports it is handed.

pub mod contact;
pub mod dashboard;
pub mod gallery;
pub mod login;
pub mod overlay;
pub mod shell;
pub mod upload;

pub use contact::{ContactField, ContactForm, SubmitStatus};
pub use dashboard::AdminDashboard;
pub use gallery::GalleryView;
pub use login::LoginForm;
pub use overlay::{DetailOverlay, OverlayKey, OverlayState};
pub use shell::{navigate, Navigation, Route};
pub use upload::{FormMode, Preview, SelectedImage, UploadForm};
