use super::MailClient;
use crate::core::error::Result;
use crate::core::mailbox::MailboxUpdate;
use crate::core::models::{Category, Email, EmailId};

impl MailClient {
    /// Append to the inbox. An email already there is replaced in place.
    ///
    /// An id already filed anywhere but inbox or favourites (a draft, an
    /// archived or sent email) is left alone.
    pub fn add_email(&mut self, email: Email) -> Result<()> {
        let filed_elsewhere = Category::ALL
            .into_iter()
            .filter(|c| !matches!(c, Category::Inbox | Category::Favourites))
            .find(|c| self.mailbox().contains(*c, &email.id));
        if let Some(category) = filed_elsewhere {
            log::warn!("add_email: {} is already in {category}, ignoring", email.id);
            return Ok(());
        }

        let mut inbox = self.mailbox().to_vec(Category::Inbox);
        match inbox.iter_mut().find(|e| e.id == email.id) {
            Some(existing) => *existing = email,
            None => inbox.push(email),
        }
        self.store.commit(MailboxUpdate::new().set(Category::Inbox, inbox))
    }

    /// Remove `id` from `category` only. Other categories keep their
    /// reference to the same record.
    pub fn delete_email(&mut self, id: &EmailId, category: Category) -> Result<()> {
        if !self.mailbox().contains(category, id) {
            log::debug!("delete: {id} not in {category}");
            return Ok(());
        }
        let mut emails = self.mailbox().to_vec(category);
        emails.retain(|e| e.id != *id);
        log::info!("Deleted {id} from {category}");
        self.store.commit(MailboxUpdate::new().set(category, emails))
    }

    pub fn toggle_read_status(&mut self, id: &EmailId) -> Result<()> {
        self.update_in(Category::Inbox, id, |e| e.read = !e.read).map(|_| ())
    }

    pub fn mark_email_as_seen(&mut self, id: &EmailId) -> Result<()> {
        self.update_in(Category::Inbox, id, |e| e.seen = true).map(|_| ())
    }

    /// Flip `favourite` on the inbox email and add it to or drop it from
    /// favourites. Both categories go out in one commit.
    pub fn toggle_favourite(&mut self, id: &EmailId) -> Result<()> {
        let mb = self.mailbox();
        let Some(mut email) = mb.get(Category::Inbox, id).cloned() else {
            log::debug!("toggle_favourite: {id} not in inbox");
            return Ok(());
        };
        email.favourite = !email.favourite;

        let mut inbox = mb.to_vec(Category::Inbox);
        for e in inbox.iter_mut().filter(|e| e.id == *id) {
            *e = email.clone();
        }
        let mut favourites = mb.to_vec(Category::Favourites);
        favourites.retain(|e| e.id != *id);
        if email.favourite {
            favourites.push(email);
        }

        self.store.commit(
            MailboxUpdate::new()
                .set(Category::Inbox, inbox)
                .set(Category::Favourites, favourites),
        )
    }

    /// Move an inbox email to archived. Calling it again is a no-op.
    pub fn archive_email(&mut self, id: &EmailId) -> Result<()> {
        let moved =
            self.move_between(Category::Inbox, Category::Archived, id, |e| e.archived = true)?;
        if moved {
            log::info!("Archived {id}");
        }
        Ok(())
    }

    /// Move an inbox email to postponed.
    pub fn postpone_email(&mut self, id: &EmailId) -> Result<()> {
        self.move_between(Category::Inbox, Category::Postponed, id, |_| {}).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::app::test_support::client;

    fn email(receiver: &str) -> Email {
        Email::new("Alice", receiver, Some("Hi".into()), Some("hello".into()), vec![])
    }

    fn seeded() -> (MailClient, EmailId) {
        let mut c = client();
        let e = email("bob@x.com");
        let id = e.id;
        c.add_email(e).unwrap();
        (c, id)
    }

    // -- add / delete --

    #[test]
    fn add_appends_to_inbox_in_order() {
        let mut c = client();
        let a = email("a@x.com");
        let b = email("b@x.com");
        c.add_email(a.clone()).unwrap();
        c.add_email(b.clone()).unwrap();
        assert_eq!(c.mailbox().ids(Category::Inbox), &[a.id, b.id]);
    }

    #[test]
    fn add_same_id_twice_does_not_duplicate() {
        let mut c = client();
        let mut e = email("a@x.com");
        c.add_email(e.clone()).unwrap();
        e.body = "edited".into();
        c.add_email(e.clone()).unwrap();
        assert_eq!(c.mailbox().len(Category::Inbox), 1);
        assert_eq!(c.mailbox().get(Category::Inbox, &e.id).unwrap().body, "edited");
    }

    #[test]
    fn add_ignores_archived_id() {
        let mut c = client();
        let e = email("a@x.com");
        c.add_email(e.clone()).unwrap();
        c.archive_email(&e.id).unwrap();

        c.add_email(e.clone()).unwrap();

        assert!(!c.mailbox().contains(Category::Inbox, &e.id));
        assert!(c.mailbox().get(Category::Archived, &e.id).unwrap().archived);
    }

    #[tokio::test]
    async fn add_ignores_draft_id() {
        let mut c = client();
        let draft = c
            .save_draft("bob@x.com", "Hi", "v1", vec![], None)
            .await
            .unwrap();

        c.add_email(Email {
            draft: false,
            ..draft.clone()
        })
        .unwrap();

        assert_eq!(c.mailbox().len(Category::Inbox), 0);
        assert!(c.mailbox().get(Category::Drafts, &draft.id).unwrap().draft);
    }

    #[test]
    fn add_refreshes_favourited_inbox_email() {
        let (mut c, id) = seeded();
        c.toggle_favourite(&id).unwrap();
        let mut e = c.mailbox().get(Category::Inbox, &id).unwrap().clone();
        e.body = "edited".into();

        c.add_email(e).unwrap();

        assert_eq!(c.mailbox().get(Category::Favourites, &id).unwrap().body, "edited");
        assert_eq!(c.mailbox().len(Category::Inbox), 1);
    }

    #[test]
    fn delete_removes_only_from_named_category() {
        let (mut c, id) = seeded();
        c.toggle_favourite(&id).unwrap();
        c.delete_email(&id, Category::Favourites).unwrap();

        assert_eq!(c.mailbox().len(Category::Favourites), 0);
        assert!(c.mailbox().contains(Category::Inbox, &id));
    }

    #[test]
    fn delete_absent_is_noop_without_commit() {
        let (mut c, id) = seeded();
        let commits = Arc::new(Mutex::new(0));
        let n = commits.clone();
        c.subscribe(move |_| *n.lock().unwrap() += 1);

        c.delete_email(&id, Category::Sent).unwrap();
        c.delete_email(&uuid::Uuid::new_v4(), Category::Inbox).unwrap();

        assert_eq!(*commits.lock().unwrap(), 0);
        assert_eq!(c.mailbox().len(Category::Inbox), 1);
    }

    // -- read / seen --

    #[test]
    fn toggle_read_flips_flag() {
        let (mut c, id) = seeded();
        c.toggle_read_status(&id).unwrap();
        assert!(c.mailbox().get(Category::Inbox, &id).unwrap().read);
        c.toggle_read_status(&id).unwrap();
        assert!(!c.mailbox().get(Category::Inbox, &id).unwrap().read);
    }

    #[test]
    fn toggle_read_absent_is_noop() {
        let (mut c, _) = seeded();
        let before = c.mailbox().clone();
        c.toggle_read_status(&uuid::Uuid::new_v4()).unwrap();
        assert_eq!(c.mailbox(), &before);
    }

    #[test]
    fn mark_seen_is_sticky() {
        let (mut c, id) = seeded();
        c.mark_email_as_seen(&id).unwrap();
        c.mark_email_as_seen(&id).unwrap();
        let e = c.mailbox().get(Category::Inbox, &id).unwrap();
        assert!(e.seen);
        assert!(!e.read);
    }

    // -- favourites --

    #[test]
    fn toggle_favourite_twice_restores_state() {
        let (mut c, id) = seeded();
        let before = c.mailbox().clone();

        c.toggle_favourite(&id).unwrap();
        assert!(c.mailbox().get(Category::Inbox, &id).unwrap().favourite);
        assert_eq!(c.mailbox().ids(Category::Favourites), &[id]);

        c.toggle_favourite(&id).unwrap();
        assert_eq!(c.mailbox(), &before);
    }

    #[test]
    fn favourite_view_follows_inbox_edits() {
        let (mut c, id) = seeded();
        c.toggle_favourite(&id).unwrap();
        c.toggle_read_status(&id).unwrap();
        let fav = c.mailbox().get(Category::Favourites, &id).unwrap();
        assert!(fav.read);
        assert_eq!(fav, c.mailbox().get(Category::Inbox, &id).unwrap());
    }

    #[test]
    fn toggle_favourite_commits_once() {
        let (mut c, id) = seeded();
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let s = snapshots.clone();
        c.subscribe(move |mb| {
            let inbox_flag = mb.get(Category::Inbox, &id).map(|e| e.favourite);
            s.lock()
                .unwrap()
                .push((inbox_flag, mb.contains(Category::Favourites, &id)));
        });
        c.toggle_favourite(&id).unwrap();
        assert_eq!(*snapshots.lock().unwrap(), vec![(Some(true), true)]);
    }

    #[test]
    fn toggle_favourite_on_non_inbox_email_is_noop() {
        let mut c = client();
        let before = c.mailbox().clone();
        c.toggle_favourite(&uuid::Uuid::new_v4()).unwrap();
        assert_eq!(c.mailbox(), &before);
    }

    // -- archive / postpone --

    #[test]
    fn archive_moves_out_of_inbox() {
        let (mut c, id) = seeded();
        c.archive_email(&id).unwrap();
        assert_eq!(c.mailbox().len(Category::Inbox), 0);
        let archived = c.mailbox().get(Category::Archived, &id).unwrap();
        assert!(archived.archived);
    }

    #[test]
    fn archive_twice_is_noop() {
        let (mut c, id) = seeded();
        c.archive_email(&id).unwrap();
        let after_first = c.mailbox().clone();
        c.archive_email(&id).unwrap();
        assert_eq!(c.mailbox(), &after_first);
        assert_eq!(c.mailbox().len(Category::Archived), 1);
    }

    #[test]
    fn archived_favourite_stays_consistent() {
        let (mut c, id) = seeded();
        c.toggle_favourite(&id).unwrap();
        c.archive_email(&id).unwrap();
        assert!(c.mailbox().get(Category::Favourites, &id).unwrap().archived);
        assert_eq!(c.mailbox().record_count(), 1);
    }

    #[test]
    fn postpone_moves_out_of_inbox() {
        let (mut c, id) = seeded();
        c.postpone_email(&id).unwrap();
        assert!(!c.mailbox().contains(Category::Inbox, &id));
        assert_eq!(c.mailbox().ids(Category::Postponed), &[id]);
    }
}
