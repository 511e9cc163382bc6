pub mod blob;
pub mod error;
pub mod mailbox;
pub mod mime;
pub mod models;
pub mod store;

pub use error::{MailError, Result};
