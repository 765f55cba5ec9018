//! HTTP handlers for the contact manager UI and its JSON endpoint.

use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, web};
use actix_web_flash_messages::{IncomingFlashMessages, Level};
use tera::{Context, Tera};
use tokio::sync::Mutex;

use crate::domain::types::ContactId;
use crate::view::ContactListView;

pub mod api;
pub mod contacts;
pub mod main;

/// The single list view shared by every request. Handlers hold the lock for
/// the whole request so intents apply one at a time.
pub type SharedView = Mutex<ContactListView>;

/// Maps flash message levels to the CSS alert classes used by the templates.
pub fn alert_level_to_str(level: &Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        _ => "info",
    }
}

/// Context shared by every page: pending alerts and the active menu entry.
pub fn base_context(flash_messages: &IncomingFlashMessages, current_page: &str) -> Context {
    let alerts = flash_messages
        .iter()
        .map(|f| (f.content(), alert_level_to_str(&f.level())))
        .collect::<Vec<_>>();

    let mut context = Context::new();
    context.insert("alerts", &alerts);
    context.insert("current_page", current_page);
    context
}

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    render_template_with_status(tera, template, context, StatusCode::OK)
}

pub fn render_template_with_status(
    tera: &Tera,
    template: &str,
    context: &Context,
    status: StatusCode,
) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

/// Renders the list page with whatever dialog is currently open.
pub async fn render_index(
    view: &mut ContactListView,
    tera: &Tera,
    flash_messages: &IncomingFlashMessages,
    status: StatusCode,
) -> HttpResponse {
    let model = view.render().await;
    let mut context = base_context(flash_messages, "index");
    context.insert("view", &model);
    render_template_with_status(tera, "contacts/index.html", &context, status)
}

/// Parses a contact id taken from the URL path.
pub(crate) fn parse_contact_id(raw: web::Path<String>) -> Option<ContactId> {
    match ContactId::new(raw.into_inner()) {
        Ok(id) => Some(id),
        Err(err) => {
            log::warn!("Rejected contact id from path: {err}");
            None
        }
    }
}
