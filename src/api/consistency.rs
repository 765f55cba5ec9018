//! Page-consistency fallback.
//!
//! Some stores reorder records or ignore `page`/`limit`. When the fallback is
//! enabled the page returned by the store is compared with a page sliced
//! locally from the full, id-sorted collection, and the local slice wins when
//! the two disagree.

use crate::domain::contact::{Contact, PAGE_SIZE, PageRequest, PageResult};

/// Outcome of [`reconcile_page`].
#[derive(Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// The store's page agreed with the local slice.
    Consistent(PageResult),
    /// The store's page was replaced by the local slice.
    Substituted(PageResult),
}

impl Reconciled {
    pub fn into_inner(self) -> PageResult {
        match self {
            Reconciled::Consistent(page) | Reconciled::Substituted(page) => page,
        }
    }

    pub fn was_substituted(&self) -> bool {
        matches!(self, Reconciled::Substituted(_))
    }
}

/// Sorts `full` by id and slices the page described by `request`.
pub fn slice_page(request: &PageRequest, mut full: Vec<Contact>) -> PageResult {
    full.sort_by(|a, b| a.id.natural_cmp(&b.id));
    let total = full.len();
    let contacts = full
        .into_iter()
        .skip(request.offset())
        .take(PAGE_SIZE)
        .collect();
    PageResult { contacts, total }
}

/// Cross-checks the store's page against the locally sliced one.
///
/// The first id and the page length are compared; the store's `total` is
/// kept only when the page is consistent.
pub fn reconcile_page(request: &PageRequest, server: PageResult, full: Vec<Contact>) -> Reconciled {
    let local = slice_page(request, full);

    let same_first = server.contacts.first().map(|c| &c.id) == local.contacts.first().map(|c| &c.id);
    let same_len = server.contacts.len() == local.contacts.len();

    if same_first && same_len {
        Reconciled::Consistent(server)
    } else {
        Reconciled::Substituted(local)
    }
}
