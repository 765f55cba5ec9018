//! View components: the state behind the contact list page and its dialogs.

use thiserror::Error;

use crate::api::ApiError;
use crate::domain::types::ContactId;
use crate::forms::FieldErrors;

pub mod list;

pub use list::{ContactListView, Dialog, FormDialog, ListViewModel, SubmitOutcome};

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Client-side validation failed; nothing was sent to the store.
    #[error("form validation failed")]
    Validation(FieldErrors),

    #[error("contact {0} is not on the current page")]
    NotOnPage(ContactId),

    /// The submitted form is not the one currently open, or it was already
    /// submitted.
    #[error("this form was already submitted or closed")]
    StaleSubmission,

    #[error("delete was not confirmed")]
    DeleteNotConfirmed,

    #[error("another change is still in progress")]
    Busy,
}

pub type ViewResult<T> = Result<T, ViewError>;
