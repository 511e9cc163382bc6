use crate::core::blob::BlobStore;
use crate::core::error::Result;
use crate::core::mailbox::{Mailbox, MailboxUpdate};

/// Default blob key the mailbox is persisted under.
pub const DEFAULT_KEY: &str = "emailData";

type Observer = Box<dyn FnMut(&Mailbox) + Send>;

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Observable, persisted mailbox.
///
/// `commit` is the only write path: it merges the update, writes the whole
/// mailbox to the blob store, then calls every observer in subscription order.
pub struct Store {
    mailbox: Mailbox,
    blob: Box<dyn BlobStore>,
    key: String,
    observers: Vec<(Subscription, Observer)>,
    next_subscription: u64,
}

impl Store {
    /// Load the mailbox persisted under `key`, or start empty.
    pub fn load(blob: impl BlobStore + 'static, key: impl Into<String>) -> Self {
        let key = key.into();
        let mailbox = read_mailbox(&blob, &key);
        Store {
            mailbox,
            blob: Box::new(blob),
            key,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn snapshot(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Merge `update`, persist, notify.
    ///
    /// The in-memory mailbox keeps the update and observers are notified even
    /// when the write fails; the write error is returned.
    pub fn commit(&mut self, update: MailboxUpdate) -> Result<()> {
        let touched: Vec<_> = update.categories().map(|c| c.as_str()).collect();
        self.mailbox.apply(update);
        log::debug!("Commit touching {touched:?}");

        let persisted = self.persist();
        if let Err(e) = &persisted {
            log::error!("Failed to persist mailbox under {:?}: {e}", self.key);
        }

        for (_, observer) in self.observers.iter_mut() {
            observer(&self.mailbox);
        }
        persisted
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&Mailbox) + Send + 'static) -> Subscription {
        let sub = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((sub, Box::new(observer)));
        sub
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(s, _)| *s != sub);
        self.observers.len() != before
    }

    /// Discard in-memory state and re-read the blob. Observers are notified;
    /// nothing is written.
    pub fn reload(&mut self) {
        self.mailbox = read_mailbox(self.blob.as_ref(), &self.key);
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.mailbox);
        }
    }

    fn persist(&mut self) -> Result<()> {
        let data = serde_json::to_string(&self.mailbox)?;
        self.blob.set(&self.key, &data)
    }
}

/// Absent, unreadable or malformed data all mean "empty mailbox".
fn read_mailbox(blob: &dyn BlobStore, key: &str) -> Mailbox {
    match blob.get(key) {
        Ok(Some(data)) => match serde_json::from_str::<Mailbox>(&data) {
            Ok(mailbox) => {
                log::info!("Loaded mailbox from {key:?} ({} emails)", mailbox.record_count());
                mailbox
            }
            Err(e) => {
                log::warn!("Discarding malformed mailbox under {key:?}: {e}");
                Mailbox::default()
            }
        },
        Ok(None) => {
            log::info!("No stored mailbox under {key:?}, starting empty");
            Mailbox::default()
        }
        Err(e) => {
            log::warn!("Failed to read mailbox under {key:?}: {e}");
            Mailbox::default()
        }
    }
}
