pub mod mailer;
pub mod model;
pub mod service;

pub use mailer::ContactMailer;
pub use model::{looks_like_email, ContactMessage};
pub use service::deliver_contact;
