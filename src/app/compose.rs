use std::path::Path;

use chrono::Utc;
use futures::future::try_join_all;

use super::MailClient;
use crate::core::error::{MailError, Result};
use crate::core::mailbox::MailboxUpdate;
use crate::core::mime;
use crate::core::models::{Attachment, AttachmentInput, Category, Email, EmailId};

/// Turn one attachment input into a stored, data-URI encoded attachment.
///
/// Already encoded attachments come back unchanged, so draft edits never
/// re-encode.
pub async fn normalize_attachment(input: AttachmentInput) -> Result<Attachment> {
    match input {
        AttachmentInput::Encoded(attachment) => {
            attachment.validate()?;
            Ok(attachment)
        }
        AttachmentInput::Bytes(data) => {
            let mime_type = match data.mime_type.trim() {
                "" => mime::mime_from_ext(Path::new(&data.filename)).to_owned(),
                given => given.to_owned(),
            };
            let name = if data.filename.trim().is_empty() {
                "attachment".to_owned()
            } else {
                data.filename
            };
            let attachment = Attachment {
                content: mime::encode_data_uri(&mime_type, &data.data),
                mime_type,
                name,
            };
            attachment.validate()?;
            Ok(attachment)
        }
        AttachmentInput::File(path) => {
            let data = tokio::fs::read(&path).await.map_err(|e| {
                MailError::Encoding(format!("Failed to read {}: {e}", path.display()))
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".into());
            let mime_type = mime::mime_from_ext(&path).to_owned();
            log::debug!("Encoded {} ({} bytes)", path.display(), data.len());
            Ok(Attachment {
                content: mime::encode_data_uri(&mime_type, &data),
                name,
                mime_type,
            })
        }
    }
}

/// Normalize all inputs concurrently. Any failure fails the whole batch.
pub async fn normalize_attachments(inputs: Vec<AttachmentInput>) -> Result<Vec<Attachment>> {
    try_join_all(inputs.into_iter().map(normalize_attachment)).await
}

impl MailClient {
    /// Build a new email from the configured sender. Nothing is stored.
    pub async fn create_email(
        &self,
        receiver: impl Into<String>,
        subject: Option<String>,
        body: Option<String>,
        attachments: Vec<AttachmentInput>,
    ) -> Result<Email> {
        let attachments = normalize_attachments(attachments).await?;
        Ok(Email::new(
            self.sender.clone(),
            receiver,
            subject,
            body,
            attachments,
        ))
    }

    /// Update the draft `existing_draft_id` in place, or append a new draft
    /// when there is no such draft. Returns the stored draft.
    ///
    /// Attachments are fully encoded before the mailbox is read; if any
    /// fails, nothing is committed.
    pub async fn save_draft(
        &mut self,
        receiver: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        attachments: Vec<AttachmentInput>,
        existing_draft_id: Option<EmailId>,
    ) -> Result<Email> {
        let (receiver, subject, body) = (receiver.into(), subject.into(), body.into());
        let attachments = normalize_attachments(attachments).await?;

        let mut drafts = self.mailbox().to_vec(Category::Drafts);
        let existing = match existing_draft_id {
            Some(id) => drafts.iter_mut().find(|d| d.id == id),
            None => None,
        };

        let saved = match existing {
            Some(draft) => {
                draft.receiver = receiver;
                draft.subject = subject;
                draft.body = body;
                draft.attachments = attachments;
                draft.date = Utc::now();
                log::debug!("Updated draft {}", draft.id);
                draft.clone()
            }
            None => {
                if let Some(id) = existing_draft_id {
                    log::debug!("Draft {id} is gone, saving as new draft");
                }
                let mut draft =
                    Email::new(self.sender.clone(), receiver, Some(subject), Some(body), attachments);
                draft.draft = true;
                log::debug!("Created draft {}", draft.id);
                drafts.push(draft.clone());
                draft
            }
        };

        self.store.commit(MailboxUpdate::new().set(Category::Drafts, drafts))?;
        Ok(saved)
    }

    /// The draft to load into a compose form, if it still exists.
    pub fn open_draft(&self, id: &EmailId) -> Option<Email> {
        self.mailbox().get(Category::Drafts, id).cloned()
    }

    /// Move a draft to sent. Returns false if there was no such draft.
    /// There is no way back: sent emails never return to drafts.
    pub fn send_draft(&mut self, id: &EmailId) -> Result<bool> {
        let sent = self.move_between(Category::Drafts, Category::Sent, id, |e| {
            e.draft = false;
            e.sent = true;
            e.date = Utc::now();
        })?;
        if sent {
            log::info!("Sent draft {id}");
        }
        Ok(sent)
    }

    /// Create an outgoing email and file it under sent.
    pub async fn send_email(
        &mut self,
        receiver: impl Into<String>,
        subject: Option<String>,
        body: Option<String>,
        attachments: Vec<AttachmentInput>,
    ) -> Result<Email> {
        let mut email = self.create_email(receiver, subject, body, attachments).await?;
        email.sent = true;

        let mut sent = self.mailbox().to_vec(Category::Sent);
        sent.push(email.clone());
        self.store.commit(MailboxUpdate::new().set(Category::Sent, sent))?;
        log::info!("Sent {}", email.id);
        Ok(email)
    }
}
