//! Local mailbox state: categorized emails, draft reconciliation and
//! attachment encoding, persisted to a key-value blob store.

pub mod app;
pub mod config;
pub mod core;

pub use app::MailClient;
pub use config::Config;
pub use crate::core::mailbox::{Mailbox, MailboxUpdate};
pub use crate::core::models::{Attachment, AttachmentData, AttachmentInput, Category, Email, EmailId};
pub use crate::core::store::Store;
pub use crate::core::{MailError, Result};
