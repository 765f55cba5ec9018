use std::sync::Arc;

use actix_web::{HttpResponse, Responder, get, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::contact::{Contact, PageRequest};
use crate::pagination::total_pages;
use crate::query::QueryKey;
use crate::query::client::QueryClient;
use crate::state::StateStore;

#[derive(Deserialize)]
struct ContactsQueryParams {
    page: Option<usize>,
    search: Option<String>,
    favourite: Option<bool>,
}

#[derive(Serialize)]
struct ContactsResponse {
    contacts: Vec<Contact>,
    total: usize,
    page: usize,
    total_pages: usize,
}

/// One page of contacts as JSON. Filters not given in the query string
/// default to the toolbar state.
#[get("/contacts")]
pub async fn api_contacts(
    params: web::Query<ContactsQueryParams>,
    client: web::Data<Arc<QueryClient>>,
    state: web::Data<Arc<StateStore>>,
) -> impl Responder {
    let params = params.into_inner();
    let defaults = state.snapshot();
    let request = PageRequest::new(
        params.page.unwrap_or(1),
        params.search.unwrap_or(defaults.search),
        params.favourite.unwrap_or(defaults.favorites_only),
    );

    match client.fetch_page(&QueryKey::contacts(&request)).await {
        Ok(page) => HttpResponse::Ok().json(ContactsResponse {
            total_pages: total_pages(page.total),
            total: page.total,
            page: request.page,
            contacts: page.contacts,
        }),
        Err(err) => {
            log::error!("Failed to list contacts: {err}");
            HttpResponse::BadGateway().json(json!({ "error": err.to_string() }))
        }
    }
}
