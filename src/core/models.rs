use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{MailError, Result};
use crate::core::mime;

pub type EmailId = Uuid;

pub const DEFAULT_SUBJECT: &str = "No Subject";

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

/// One of the fixed mailbox categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Inbox,
    Sent,
    Drafts,
    Archived,
    Favourites,
    Postponed,
}

impl Category {
    /// Every category, in persisted order.
    pub const ALL: [Category; 6] = [
        Category::Inbox,
        Category::Sent,
        Category::Drafts,
        Category::Archived,
        Category::Favourites,
        Category::Postponed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Inbox => "inbox",
            Category::Sent => "sent",
            Category::Drafts => "drafts",
            Category::Archived => "archived",
            Category::Favourites => "favourites",
            Category::Postponed => "postponed",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| MailError::InvalidCategory(s.to_string()))
    }
}

/// A fully encoded attachment as stored on an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "mimeType", alias = "type")]
    pub mime_type: String,
    /// `data:<mime>;base64,<payload>`
    pub content: String,
}

impl Attachment {
    /// Reject anything that is not a complete, decodable data URI.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(MailError::Encoding("attachment has no name".into()));
        }
        if self.mime_type.is_empty() {
            return Err(MailError::Encoding(format!(
                "attachment {:?} has no MIME type",
                self.name
            )));
        }
        mime::decode_data_uri(&self.content)
            .map(|_| ())
            .map_err(|e| MailError::Encoding(format!("attachment {:?}: {e}", self.name)))
    }

    /// Decoded payload bytes.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        mime::decode_data_uri(&self.content).map(|(_, data)| data)
    }
}

/// Raw attachment bytes handed over by a collaborator (file picker, clipboard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentData {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// An attachment as it enters the system.
///
/// Only `Encoded` values may be stored directly; the other variants are
/// turned into an [`Attachment`] before any mailbox change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentInput {
    Encoded(Attachment),
    File(PathBuf),
    Bytes(AttachmentData),
}

impl AttachmentInput {
    /// Parse a `text/uri-list` payload (drag-and-drop from a file manager).
    ///
    /// Comment lines and non-`file://` URIs are skipped.
    pub fn from_uri_list(list: &str) -> Vec<AttachmentInput> {
        list.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let path = url::Url::parse(line)
                    .ok()
                    .filter(|u| u.scheme() == "file")
                    .and_then(|u| u.to_file_path().ok());
                if path.is_none() {
                    log::warn!("Skipping dropped URI {line:?}: not a local file");
                }
                path
            })
            .map(AttachmentInput::File)
            .collect()
    }
}

impl From<Attachment> for AttachmentInput {
    fn from(a: Attachment) -> Self {
        AttachmentInput::Encoded(a)
    }
}

impl From<AttachmentData> for AttachmentInput {
    fn from(d: AttachmentData) -> Self {
        AttachmentInput::Bytes(d)
    }
}


/// A single email record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: EmailId,
    pub sender: String,
    pub receiver: String,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub favourite: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub sent: bool,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub seen: bool,
}

impl Email {
    /// Fresh email with a new id, the current time and all flags cleared.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        subject: Option<String>,
        body: Option<String>,
        attachments: Vec<Attachment>,
    ) -> Self {
        Email {
            id: Uuid::new_v4(),
            sender: sender.into(),
            receiver: receiver.into(),
            subject: subject.unwrap_or_else(default_subject),
            body: body.unwrap_or_default(),
            attachments,
            date: Utc::now(),
            favourite: false,
            draft: false,
            archived: false,
            sent: false,
            read: false,
            seen: false,
        }
    }
}
