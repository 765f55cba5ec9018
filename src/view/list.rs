//! State machine behind the contact list page.
//!
//! [`ContactListView`] owns the current page, the open dialog and the active
//! query of one list. Intents (paging, filtering, form submission, favourite
//! toggles, deletion) mutate it; [`ContactListView::render`] fetches whatever
//! the current key needs and produces a [`ListViewModel`] for the template.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::api::CONTACTS_NAMESPACE;
use crate::domain::contact::{Contact, NewContact, PageRequest};
use crate::domain::types::ContactId;
use crate::forms::FieldErrors;
use crate::forms::contact::ContactForm;
use crate::pagination::{Paginated, Pager};
use crate::query::QueryKey;
use crate::query::client::QueryClient;
use crate::query::observer::ActiveQuery;
use crate::state::{ClientState, StateStore};
use crate::view::{ViewError, ViewResult};

/// The create/edit form while it is open.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FormDialog {
    /// One-shot submission token; empty while a submission is in flight.
    pub token: String,
    /// `None` in create mode.
    pub editing: Option<Contact>,
    pub values: ContactForm,
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dialog {
    #[default]
    Closed,
    Detail {
        contact: Contact,
    },
    ConfirmDelete {
        contact: Contact,
    },
    Form(FormDialog),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Contact),
    Updated(Contact),
}

/// Everything the list template renders.
#[derive(Debug, Serialize)]
pub struct ListViewModel {
    pub contacts: Paginated<Contact>,
    pub search: String,
    pub favorites_only: bool,
    pub is_loading: bool,
    pub is_previous_data: bool,
    pub error: Option<String>,
    pub dialog: Dialog,
    pub busy: bool,
    /// One-off message, e.g. after the page was clamped.
    pub notice: Option<String>,
}

enum Mutation {
    Create(NewContact),
    Update(Contact),
}

/// Marks the view busy for the duration of a store request.
///
/// Dropping it, including when the request future is cancelled, clears the
/// flag and hands a withdrawn form token back to the still-open form.
struct InFlight<'a> {
    view: &'a mut ContactListView,
    token: Option<String>,
}

impl<'a> InFlight<'a> {
    fn start(view: &'a mut ContactListView, token: Option<String>) -> Self {
        view.busy = true;
        Self { view, token }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.view.busy = false;
        if let Some(token) = self.token.take()
            && let Dialog::Form(dialog) = &mut self.view.dialog
            && dialog.token.is_empty()
        {
            dialog.token = token;
        }
    }
}

pub struct ContactListView {
    client: Arc<QueryClient>,
    state: Arc<StateStore>,
    pager: Pager,
    query: ActiveQuery,
    /// Filter the current page was computed for.
    filter: ClientState,
    dialog: Dialog,
    busy: bool,
    notice: Option<String>,
}

impl ContactListView {
    pub fn new(client: Arc<QueryClient>, state: Arc<StateStore>) -> Self {
        let query = ActiveQuery::watching(Arc::clone(client.bus()), CONTACTS_NAMESPACE);
        let filter = state.snapshot();
        Self {
            client,
            state,
            pager: Pager::new(),
            query,
            filter,
            dialog: Dialog::Closed,
            busy: false,
            notice: None,
        }
    }

    pub fn current_page(&self) -> usize {
        self.pager.current()
    }

    pub fn total_pages(&self) -> usize {
        self.pager.total_pages()
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn current_key(&self) -> QueryKey {
        QueryKey::contacts(&PageRequest::new(
            self.pager.current(),
            self.filter.search.clone(),
            self.filter.favorites_only,
        ))
    }

    /// Adopts filter changes made through the shared store, returning to
    /// page 1 when anything changed.
    fn sync_filter(&mut self) {
        let latest = self.state.snapshot();
        if latest != self.filter {
            self.filter = latest;
            self.pager.reset();
        }
    }

    async fn fetch(&mut self, key: QueryKey) -> bool {
        self.query.begin(key.clone());
        let result = self.client.fetch_page(&key).await;
        let total = result.as_ref().ok().map(|page| page.total);
        self.query.resolve(&key, result);
        match total {
            Some(total) => {
                self.pager.set_total(total);
                true
            }
            None => false,
        }
    }

    /// Fetches the current page if the cached copy cannot be used. A page
    /// that turns out to lie past the end is replaced by page 1.
    pub async fn load(&mut self) {
        self.sync_filter();
        let key = self.current_key();
        if !self.query.needs_fetch(&key) && self.client.is_fresh(&key) {
            return;
        }

        if self.fetch(key).await && self.pager.clamp() {
            let requested = self.query.key().map_or(1, |key| key.page);
            log::info!("Page {requested} is past the end, returning to page 1");
            self.notice = Some(format!(
                "Page {requested} no longer exists, showing page 1."
            ));
            let first = self.current_key();
            self.fetch(first).await;
        }
    }

    /// Loads what the current key needs and snapshots the view.
    pub async fn render(&mut self) -> ListViewModel {
        self.load().await;
        self.model()
    }

    /// Snapshot of the view without fetching. Takes the pending notice.
    pub fn model(&mut self) -> ListViewModel {
        let state = self.query.state();
        let items = state
            .data
            .map(|page| page.contacts)
            .unwrap_or_default();
        ListViewModel {
            contacts: Paginated::new(items, self.pager.current(), self.pager.total()),
            search: self.filter.search.clone(),
            favorites_only: self.filter.favorites_only,
            is_loading: state.is_loading,
            is_previous_data: state.is_previous_data,
            error: state.error.map(|err| err.to_string()),
            dialog: self.dialog.clone(),
            busy: self.busy,
            notice: self.notice.take(),
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.pager.next()
    }

    pub fn prev_page(&mut self) -> bool {
        self.pager.prev()
    }

    pub fn set_search(&mut self, search: &str) {
        self.state.set_search(search.trim());
        self.pager.reset();
        self.sync_filter();
    }

    pub fn set_favorites_only(&mut self, favorites_only: bool) {
        self.state.set_favorites_only(favorites_only);
        self.pager.reset();
        self.sync_filter();
    }

    /// Manual retry: forget the current page and fetch it again on the next
    /// load.
    pub fn refetch(&mut self) {
        self.client.forget(&self.current_key());
        self.query.refetch();
    }

    fn find_on_page(&self, id: &ContactId) -> ViewResult<Contact> {
        self.query
            .data()
            .and_then(|page| page.contacts.iter().find(|c| &c.id == id))
            .cloned()
            .ok_or_else(|| ViewError::NotOnPage(id.clone()))
    }

    pub fn open_details(&mut self, id: &ContactId) -> ViewResult<()> {
        let contact = self.find_on_page(id)?;
        self.dialog = Dialog::Detail { contact };
        Ok(())
    }

    fn open_form(&mut self, editing: Option<Contact>) -> String {
        let token = Uuid::new_v4().to_string();
        let values = editing
            .as_ref()
            .map(ContactForm::from_contact)
            .unwrap_or_default();
        self.dialog = Dialog::Form(FormDialog {
            token: token.clone(),
            editing,
            values: ContactForm {
                token: token.clone(),
                ..values
            },
            errors: FieldErrors::new(),
        });
        token
    }

    /// Opens an empty form. Returns its submission token.
    pub fn open_create_form(&mut self) -> String {
        self.open_form(None)
    }

    /// Opens the form pre-filled with a contact of the current page.
    pub fn open_edit_form(&mut self, id: &ContactId) -> ViewResult<String> {
        let contact = self.find_on_page(id)?;
        Ok(self.open_form(Some(contact)))
    }

    pub fn open_delete_confirmation(&mut self, id: &ContactId) -> ViewResult<()> {
        let contact = self.find_on_page(id)?;
        self.dialog = Dialog::ConfirmDelete { contact };
        Ok(())
    }

    pub fn close_dialog(&mut self) {
        self.dialog = Dialog::Closed;
    }

    /// Validates and submits the open form.
    ///
    /// The token must match the open form; it is withdrawn while the request
    /// is in flight and the form is closed on success, so replays of the same
    /// submission are rejected without reaching the store. A failed or
    /// abandoned request hands the token back.
    pub async fn submit_form(&mut self, form: ContactForm) -> ViewResult<SubmitOutcome> {
        if self.busy {
            return Err(ViewError::Busy);
        }
        let Dialog::Form(dialog) = &mut self.dialog else {
            return Err(ViewError::StaleSubmission);
        };
        if dialog.token.is_empty() || dialog.token != form.token.trim() {
            return Err(ViewError::StaleSubmission);
        }

        let mutation = match &dialog.editing {
            None => form.to_new_contact().map(Mutation::Create),
            Some(existing) => form.to_updated_contact(existing).map(Mutation::Update),
        };
        let mutation = match mutation {
            Ok(mutation) => mutation,
            Err(err) => {
                let errors = err.field_errors();
                dialog.values = form;
                dialog.errors = errors.clone();
                return Err(ViewError::Validation(errors));
            }
        };
        let token = std::mem::take(&mut dialog.token);

        let client = Arc::clone(&self.client);
        let mut in_flight = InFlight::start(self, Some(token));
        let result = match &mutation {
            Mutation::Create(new_contact) => client
                .create_contact(new_contact)
                .await
                .map(SubmitOutcome::Created),
            Mutation::Update(contact) => client
                .update_contact(contact)
                .await
                .map(SubmitOutcome::Updated),
        };

        let view = &mut *in_flight.view;
        match result {
            Ok(outcome) => {
                in_flight.token = None;
                view.dialog = Dialog::Closed;
                view.pager.reset();
                Ok(outcome)
            }
            Err(err) => {
                if let Dialog::Form(dialog) = &mut view.dialog {
                    dialog.values = form;
                    dialog.errors.clear();
                }
                Err(ViewError::Api(err))
            }
        }
    }

    /// Flips `favourite` on a contact of the current page and returns to
    /// page 1.
    pub async fn toggle_favourite(&mut self, id: &ContactId) -> ViewResult<Contact> {
        if self.busy {
            return Err(ViewError::Busy);
        }
        let contact = self.find_on_page(id)?;

        let client = Arc::clone(&self.client);
        let in_flight = InFlight::start(self, None);
        let result = client.toggle_favourite(&contact).await;
        drop(in_flight);

        let updated = result?;
        self.pager.reset();
        if let Dialog::Detail { contact } = &mut self.dialog
            && contact.id == updated.id
        {
            *contact = updated.clone();
        }
        Ok(updated)
    }

    /// Deletes the contact awaiting confirmation and returns to page 1.
    pub async fn confirm_delete(&mut self, id: &ContactId) -> ViewResult<()> {
        if self.busy {
            return Err(ViewError::Busy);
        }
        match &self.dialog {
            Dialog::ConfirmDelete { contact } if &contact.id == id => {}
            _ => return Err(ViewError::DeleteNotConfirmed),
        }

        let client = Arc::clone(&self.client);
        let in_flight = InFlight::start(self, None);
        let result = client.delete_contact(id).await;
        drop(in_flight);

        result?;
        self.dialog = Dialog::Closed;
        self.pager.reset();
        Ok(())
    }
}
