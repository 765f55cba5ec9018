use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::domain::types::ContactId;
use crate::forms::contact::ContactForm;
use crate::routes::{SharedView, parse_contact_id, redirect, render_index};
use crate::view::{ContactListView, Dialog, SubmitOutcome, ViewError};

fn contact_not_found() -> HttpResponse {
    FlashMessage::error("Contact not found.").send();
    redirect("/")
}

/// Flashes a failed intent and returns to the list.
fn report(err: ViewError) -> HttpResponse {
    match err {
        ViewError::Api(err) => {
            log::error!("Contact store request failed: {err}");
            FlashMessage::error(format!("Request failed: {err}")).send();
        }
        ViewError::NotOnPage(_) => {
            FlashMessage::error("Contact not found.").send();
        }
        ViewError::Validation(_) => {
            FlashMessage::error("Please correct the highlighted fields.").send();
        }
        other => {
            log::warn!("Rejected contact intent: {other}");
            FlashMessage::warning(other.to_string()).send();
        }
    }
    redirect("/")
}

#[get("/contacts/new")]
pub async fn new_contact(
    view: web::Data<SharedView>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let mut view = view.lock().await;
    view.open_create_form();
    render_index(&mut view, &tera, &flash_messages, StatusCode::OK).await
}

/// Opens a dialog for a contact of the current page and renders the list
/// beneath it.
async fn open_dialog<F>(
    view: &SharedView,
    contact_id: web::Path<String>,
    tera: &Tera,
    flash_messages: &IncomingFlashMessages,
    open: F,
) -> HttpResponse
where
    F: FnOnce(&mut ContactListView, &ContactId) -> Result<(), ViewError>,
{
    let Some(id) = parse_contact_id(contact_id) else {
        return contact_not_found();
    };

    let mut view = view.lock().await;
    view.load().await;
    if let Err(err) = open(&mut *view, &id) {
        return report(err);
    }
    render_index(&mut view, tera, flash_messages, StatusCode::OK).await
}

#[get("/contacts/{contact_id}")]
pub async fn show_contact(
    contact_id: web::Path<String>,
    view: web::Data<SharedView>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    open_dialog(&view, contact_id, &tera, &flash_messages, |view, id| {
        view.open_details(id)
    })
    .await
}

#[get("/contacts/{contact_id}/edit")]
pub async fn edit_contact(
    contact_id: web::Path<String>,
    view: web::Data<SharedView>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    open_dialog(&view, contact_id, &tera, &flash_messages, |view, id| {
        view.open_edit_form(id).map(|_| ())
    })
    .await
}

#[get("/contacts/{contact_id}/delete")]
pub async fn confirm_delete_contact(
    contact_id: web::Path<String>,
    view: web::Data<SharedView>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    open_dialog(&view, contact_id, &tera, &flash_messages, |view, id| {
        view.open_delete_confirmation(id)
    })
    .await
}

async fn submit(
    view: &mut ContactListView,
    form: ContactForm,
    tera: &Tera,
    flash_messages: &IncomingFlashMessages,
) -> HttpResponse {
    match view.submit_form(form).await {
        Ok(SubmitOutcome::Created(contact)) => {
            FlashMessage::success(format!("Contact {} created.", contact.name)).send();
            redirect("/")
        }
        Ok(SubmitOutcome::Updated(contact)) => {
            FlashMessage::success(format!("Contact {} updated.", contact.name)).send();
            redirect("/")
        }
        Err(ViewError::Validation(errors)) => {
            log::debug!("Contact form rejected: {errors:?}");
            render_index(
                view,
                tera,
                flash_messages,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await
        }
        Err(err) => report(err),
    }
}

#[post("/contacts")]
pub async fn create_contact(
    view: web::Data<SharedView>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ContactForm>,
) -> impl Responder {
    let mut view = view.lock().await;
    if let Dialog::Form(dialog) = view.dialog()
        && dialog.editing.is_some()
    {
        return report(ViewError::StaleSubmission);
    }
    submit(&mut view, form, &tera, &flash_messages).await
}

#[post("/contacts/{contact_id}")]
pub async fn update_contact(
    contact_id: web::Path<String>,
    view: web::Data<SharedView>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ContactForm>,
) -> impl Responder {
    let Some(id) = parse_contact_id(contact_id) else {
        return contact_not_found();
    };

    let mut view = view.lock().await;
    let editing_this = matches!(
        view.dialog(),
        Dialog::Form(dialog) if dialog.editing.as_ref().is_some_and(|c| c.id == id)
    );
    if !editing_this {
        return report(ViewError::StaleSubmission);
    }
    submit(&mut view, form, &tera, &flash_messages).await
}

#[post("/contacts/{contact_id}/delete")]
pub async fn delete_contact(
    contact_id: web::Path<String>,
    view: web::Data<SharedView>,
) -> impl Responder {
    let Some(id) = parse_contact_id(contact_id) else {
        return contact_not_found();
    };

    match view.lock().await.confirm_delete(&id).await {
        Ok(()) => {
            FlashMessage::success("Contact deleted.").send();
            redirect("/")
        }
        Err(err) => report(err),
    }
}

#[post("/contacts/{contact_id}/favourite")]
pub async fn toggle_favourite(
    contact_id: web::Path<String>,
    view: web::Data<SharedView>,
) -> impl Responder {
    let Some(id) = parse_contact_id(contact_id) else {
        return contact_not_found();
    };

    let mut view = view.lock().await;
    view.load().await;
    match view.toggle_favourite(&id).await {
        Ok(contact) if contact.favourite => {
            FlashMessage::success(format!("{} added to favourites.", contact.name)).send();
            redirect("/")
        }
        Ok(contact) => {
            FlashMessage::info(format!("{} removed from favourites.", contact.name)).send();
            redirect("/")
        }
        Err(err) => report(err),
    }
}
