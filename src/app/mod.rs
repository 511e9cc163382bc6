mod actions;
mod compose;

pub use compose::{normalize_attachment, normalize_attachments};

use crate::config::Config;
use crate::core::error::Result;
use crate::core::mailbox::{Mailbox, MailboxUpdate};
use crate::core::models::{Category, Email, EmailId};
use crate::core::store::{Store, Subscription};

/// Mutation API over one explicitly owned [`Store`].
///
/// Every operation reads the current snapshot and commits once; `&mut self`
/// keeps anything else from running between the read and the commit.
pub struct MailClient {
    store: Store,
    sender: String,
}

impl MailClient {
    pub fn new(store: Store, sender: impl Into<String>) -> Self {
        MailClient {
            store,
            sender: sender.into(),
        }
    }

    /// Open the configured backend and load the persisted mailbox.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = config.open_store()?;
        Ok(Self::new(store, config.sender_name.clone()))
    }

    pub fn mailbox(&self) -> &Mailbox {
        self.store.snapshot()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&Mailbox) + Send + 'static) -> Subscription {
        self.store.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        self.store.unsubscribe(sub)
    }

    /// Apply `f` to the record with `id` in `category` and commit that
    /// category. Returns false (and commits nothing) if the id is absent.
    fn update_in(
        &mut self,
        category: Category,
        id: &EmailId,
        f: impl FnOnce(&mut Email),
    ) -> Result<bool> {
        let mut emails = self.mailbox().to_vec(category);
        let Some(email) = emails.iter_mut().find(|e| e.id == *id) else {
            log::debug!("{id} not in {category}, nothing to update");
            return Ok(false);
        };
        f(email);
        self.store.commit(MailboxUpdate::new().set(category, emails))?;
        Ok(true)
    }

    /// Move `id` from one category to the end of another, after applying `f`.
    /// Returns false if `id` is not in `from`.
    fn move_between(
        &mut self,
        from: Category,
        to: Category,
        id: &EmailId,
        f: impl FnOnce(&mut Email),
    ) -> Result<bool> {
        let mb = self.mailbox();
        let Some(mut email) = mb.get(from, id).cloned() else {
            log::debug!("{id} not in {from}, nothing to move");
            return Ok(false);
        };
        f(&mut email);

        let mut source = mb.to_vec(from);
        source.retain(|e| e.id != *id);
        let mut target = mb.to_vec(to);
        target.retain(|e| e.id != *id);
        target.push(email);

        self.store.commit(MailboxUpdate::new().set(from, source).set(to, target))?;
        Ok(true)
    }
}
