//! In-process contact store with the same semantics as the REST contract.
//!
//! Identifiers are assigned as `max + 1` and never reused, listing filters by full-text search
//! and the favourite flag and returns records in id order. Call counters and
//! one-shot failure injection make it usable as a test double.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::api::consistency::slice_page;
use crate::api::{ApiError, ApiResult, ContactReader, ContactWriter};
use crate::domain::contact::{Contact, NewContact, PageRequest, PageResult};
use crate::domain::types::ContactId;

#[derive(Debug, Default)]
pub struct InMemoryContactApi {
    contacts: Mutex<Vec<Contact>>,
    fail_next: Mutex<Option<ApiError>>,
    /// Highest numeric id handed out so far.
    last_id: AtomicU64,
    list_calls: AtomicUsize,
    write_calls: AtomicUsize,
}

impl InMemoryContactApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `contacts`.
    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        let last_id = contacts
            .iter()
            .filter_map(|c| c.id.as_number())
            .max()
            .unwrap_or(0);
        Self {
            contacts: Mutex::new(contacts),
            last_id: AtomicU64::new(last_id),
            ..Self::default()
        }
    }

    /// Creates a store with `count` generated contacts numbered from 1.
    pub fn seeded(count: u64) -> Self {
        let contacts = (1..=count)
            .map(|n| {
                NewContact::new(
                    format!("Contact {n:02}"),
                    format!("contact{n}@example.com"),
                    format!("+1 555 {n:04}"),
                    format!("{n} Example Street, Springfield"),
                    n % 3 == 0,
                    None,
                )
                .with_id(ContactId::from(n))
            })
            .collect();
        Self::with_contacts(contacts)
    }

    /// Makes the next call fail with `error`.
    pub fn fail_next(&self, error: ApiError) {
        *self
            .fail_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Number of list requests served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of create, update and delete requests served so far.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored contact.
    pub fn snapshot(&self) -> Vec<Contact> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Contact>> {
        self.contacts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(&self) -> ApiResult<()> {
        match self
            .fail_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn filtered(&self, search: &str, favorites_only: bool) -> Vec<Contact> {
        self.lock()
            .iter()
            .filter(|c| !favorites_only || c.favourite)
            .filter(|c| c.matches_search(search))
            .cloned()
            .collect()
    }

    fn next_id(&self, contacts: &[Contact]) -> ContactId {
        let max = contacts
            .iter()
            .filter_map(|c| c.id.as_number())
            .max()
            .unwrap_or(0)
            .max(self.last_id.load(Ordering::SeqCst));
        self.last_id.store(max + 1, Ordering::SeqCst);
        ContactId::from(max + 1)
    }
}

#[async_trait]
impl ContactReader for InMemoryContactApi {
    async fn list_contacts(&self, request: &PageRequest) -> ApiResult<PageResult> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let filtered = self.filtered(&request.search, request.favorites_only);
        Ok(slice_page(request, filtered))
    }

    async fn list_all_contacts(
        &self,
        search: &str,
        favorites_only: bool,
    ) -> ApiResult<Vec<Contact>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let mut contacts = self.filtered(search, favorites_only);
        contacts.sort_by(|a, b| a.id.natural_cmp(&b.id));
        Ok(contacts)
    }
}

#[async_trait]
impl ContactWriter for InMemoryContactApi {
    async fn create_contact(&self, contact: &NewContact) -> ApiResult<Contact> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let mut contacts = self.lock();
        let created = contact.clone().with_id(self.next_id(&contacts));
        contacts.push(created.clone());
        Ok(created)
    }

    async fn update_contact(&self, contact: &Contact) -> ApiResult<Contact> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let mut contacts = self.lock();
        let slot = contacts
            .iter_mut()
            .find(|c| c.id == contact.id)
            .ok_or(ApiError::NotFound)?;
        *slot = contact.clone();
        Ok(contact.clone())
    }

    async fn delete_contact(&self, id: &ContactId) -> ApiResult<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let mut contacts = self.lock();
        let before = contacts.len();
        contacts.retain(|c| &c.id != id);
        if contacts.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}
