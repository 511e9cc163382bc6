use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::models::{Category, Email, EmailId};

/// On-disk representation: one full array of records per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxFile {
    pub inbox: Vec<Email>,
    pub sent: Vec<Email>,
    pub drafts: Vec<Email>,
    pub archived: Vec<Email>,
    pub favourites: Vec<Email>,
    pub postponed: Vec<Email>,
}

impl MailboxFile {
    fn category(&self, category: Category) -> &[Email] {
        match category {
            Category::Inbox => &self.inbox,
            Category::Sent => &self.sent,
            Category::Drafts => &self.drafts,
            Category::Archived => &self.archived,
            Category::Favourites => &self.favourites,
            Category::Postponed => &self.postponed,
        }
    }
}

/// Runtime mailbox: a single record per id plus an ordered id list per
/// category. A category holding an id sees exactly that record, so inbox and
/// favourites can never drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MailboxFile", into = "MailboxFile")]
pub struct Mailbox {
    records: IndexMap<EmailId, Email>,
    categories: [Vec<EmailId>; 6],
}

impl Mailbox {
    pub fn ids(&self, category: Category) -> &[EmailId] {
        &self.categories[category.index()]
    }

    /// Records of a category, in category order.
    pub fn emails(&self, category: Category) -> impl Iterator<Item = &Email> + '_ {
        self.ids(category)
            .iter()
            .filter_map(move |id| self.records.get(id))
    }

    /// Owned copy of a category, for building a [`MailboxUpdate`].
    pub fn to_vec(&self, category: Category) -> Vec<Email> {
        self.emails(category).cloned().collect()
    }

    pub fn len(&self, category: Category) -> usize {
        self.ids(category).len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, category: Category, id: &EmailId) -> bool {
        self.ids(category).contains(id)
    }

    pub fn get(&self, category: Category, id: &EmailId) -> Option<&Email> {
        if self.contains(category, id) {
            self.records.get(id)
        } else {
            None
        }
    }

    /// Look up a record regardless of category.
    pub fn find(&self, id: &EmailId) -> Option<&Email> {
        self.records.get(id)
    }

    /// Number of distinct records across all categories.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Shallow merge: every category named in `update` is replaced wholesale,
    /// its records overwrite any stored record with the same id, and records
    /// no longer referenced anywhere are dropped.
    pub fn apply(&mut self, update: MailboxUpdate) {
        for (category, emails) in update.entries {
            let mut ids = Vec::with_capacity(emails.len());
            for email in emails {
                if ids.contains(&email.id) {
                    log::warn!("Dropping duplicate {} in {category}", email.id);
                    continue;
                }
                ids.push(email.id);
                self.records.insert(email.id, email);
            }
            self.categories[category.index()] = ids;
        }
        self.collect_garbage();
    }

    fn collect_garbage(&mut self) {
        let categories = &self.categories;
        self.records.retain(|id, _| categories.iter().any(|ids| ids.contains(id)));
    }
}

impl From<MailboxFile> for Mailbox {
    /// Categories are read in [`Category::ALL`] order; when stored copies of
    /// the same id disagree, the first one seen (inbox first) wins.
    fn from(file: MailboxFile) -> Self {
        let mut mailbox = Mailbox::default();
        for category in Category::ALL {
            let ids = &mut mailbox.categories[category.index()];
            for email in file.category(category) {
                if ids.contains(&email.id) {
                    log::warn!("Dropping duplicate {} in {category}", email.id);
                    continue;
                }
                ids.push(email.id);
                match mailbox.records.get(&email.id) {
                    Some(existing) if existing != email => {
                        log::debug!("Stale copy of {} in {category}, keeping first", email.id);
                    }
                    Some(_) => {}
                    None => {
                        mailbox.records.insert(email.id, email.clone());
                    }
                }
            }
        }
        mailbox
    }
}

impl From<Mailbox> for MailboxFile {
    fn from(mailbox: Mailbox) -> Self {
        MailboxFile {
            inbox: mailbox.to_vec(Category::Inbox),
            sent: mailbox.to_vec(Category::Sent),
            drafts: mailbox.to_vec(Category::Drafts),
            archived: mailbox.to_vec(Category::Archived),
            favourites: mailbox.to_vec(Category::Favourites),
            postponed: mailbox.to_vec(Category::Postponed),
        }
    }
}

/// A partial category → sequence mapping handed to `Store::commit`.
#[derive(Debug, Clone, Default)]
pub struct MailboxUpdate {
    entries: Vec<(Category, Vec<Email>)>,
}

impl MailboxUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `category` with `emails`. Setting a category twice keeps the
    /// later value.
    pub fn set(mut self, category: Category, emails: Vec<Email>) -> Self {
        self.entries.retain(|(c, _)| *c != category);
        self.entries.push((category, emails));
        self
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }
}
