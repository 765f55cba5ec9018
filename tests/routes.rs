use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::Key;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{App, test, web};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::{FlashMessagesFramework, Level};
use serde_json::Value;
use tera::Tera;
use tokio::sync::Mutex;

use contact_manager::api::memory::InMemoryContactApi;
use contact_manager::domain::contact::NewContact;
use contact_manager::domain::types::ContactId;
use contact_manager::routes::{SharedView, alert_level_to_str};
use contact_manager::view::Dialog;
use contact_manager::{AppServices, configure};

struct Harness {
    store: Arc<InMemoryContactApi>,
    services: AppServices,
    view: web::Data<SharedView>,
}

impl Harness {
    fn new(store: InMemoryContactApi) -> Self {
        let store = Arc::new(store);
        let services = AppServices::new(store.clone(), Duration::from_secs(300));
        let view = web::Data::new(Mutex::new(services.list_view()));
        Harness {
            store,
            services,
            view,
        }
    }

    async fn form_token(&self) -> String {
        match self.view.lock().await.dialog() {
            Dialog::Form(dialog) => dialog.token.clone(),
            other => panic!("expected an open form, got {other:?}"),
        }
    }
}

fn flash_framework() -> FlashMessagesFramework {
    let message_store = CookieMessageStore::builder(Key::generate()).build();
    FlashMessagesFramework::builder(message_store).build()
}

macro_rules! init_app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .wrap(flash_framework())
                .configure(configure)
                .app_data(web::Data::new(Tera::new("templates/**/*").unwrap()))
                .app_data($harness.view.clone())
                .app_data(web::Data::new($harness.services.client.clone()))
                .app_data(web::Data::new($harness.services.state.clone())),
        )
        .await
    };
}

macro_rules! get_html {
    ($app:expr, $uri:expr) => {{
        let resp =
            test::call_service(&$app, test::TestRequest::get().uri($uri).to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        (status, String::from_utf8(body.to_vec()).unwrap())
    }};
}

macro_rules! post {
    ($app:expr, $uri:expr) => {
        test::call_service(&$app, test::TestRequest::post().uri($uri).to_request()).await
    };
    ($app:expr, $uri:expr, $form:expr) => {
        test::call_service(
            &$app,
            test::TestRequest::post()
                .uri($uri)
                .set_form($form)
                .to_request(),
        )
        .await
    };
}

fn assert_redirects_home<B>(resp: &ServiceResponse<B>) {
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(LOCATION).unwrap(), "/");
}

fn contact_form<'a>(token: &'a str, phone: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("token", token),
        ("name", "Zed Zimmer"),
        ("email", "zed@example.com"),
        ("phone", phone),
        ("address", "99 Last Lane, Springfield"),
    ]
}

#[core::prelude::v1::test]
fn test_alert_level_to_str_mappings() {
    assert_eq!(alert_level_to_str(&Level::Error), "danger");
    assert_eq!(alert_level_to_str(&Level::Warning), "warning");
    assert_eq!(alert_level_to_str(&Level::Success), "success");
    assert_eq!(alert_level_to_str(&Level::Info), "info");
    assert_eq!(alert_level_to_str(&Level::Debug), "info");
}

#[actix_web::test]
async fn index_lists_first_page() {
    let harness = Harness::new(InMemoryContactApi::seeded(25));
    let app = init_app!(harness);

    let (status, body) = get_html!(app, "/");

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Contact 01"));
    assert!(body.contains("Contact 10"));
    assert!(!body.contains("Contact 11"));
    assert!(body.contains("Page 1 of 3"));
}

#[actix_web::test]
async fn empty_store_shows_placeholder() {
    let harness = Harness::new(InMemoryContactApi::new());
    let app = init_app!(harness);

    let (_, body) = get_html!(app, "/");

    assert!(body.contains("No contacts found"));
    assert!(body.contains("Page 1 of 1"));
}

#[actix_web::test]
async fn next_page_moves_the_pager() {
    let harness = Harness::new(InMemoryContactApi::seeded(25));
    let app = init_app!(harness);
    get_html!(app, "/");

    let resp = post!(app, "/page/next");
    assert_redirects_home(&resp);
    let (_, body) = get_html!(app, "/");

    assert!(body.contains("Page 2 of 3"));
    assert!(body.contains("Contact 11"));
    assert!(!body.contains("Contact 01"));
}

#[actix_web::test]
async fn search_filters_and_resets_page() {
    let harness = Harness::new(InMemoryContactApi::seeded(25));
    let app = init_app!(harness);
    get_html!(app, "/");
    post!(app, "/page/next");

    let resp = post!(app, "/search", &[("search", "Contact 2")]);
    assert_redirects_home(&resp);
    let (_, body) = get_html!(app, "/");

    assert!(body.contains("Contact 20"));
    assert!(!body.contains("Contact 01"));
    assert!(body.contains("Page 1 of 1"));
}

#[actix_web::test]
async fn favourites_filter_lists_only_favourites() {
    let harness = Harness::new(InMemoryContactApi::seeded(9));
    let app = init_app!(harness);

    post!(app, "/favourites", &[("favorites_only", "on")]);
    let (_, body) = get_html!(app, "/");

    assert!(body.contains("Contact 03"));
    assert!(body.contains("Contact 09"));
    assert!(!body.contains("Contact 01"));
}

#[actix_web::test]
async fn create_form_round_trip() {
    let harness = Harness::new(InMemoryContactApi::seeded(3));
    let app = init_app!(harness);

    let (status, body) = get_html!(app, "/contacts/new");
    assert_eq!(status, StatusCode::OK);
    let token = harness.form_token().await;
    assert!(body.contains(&token));

    let resp = post!(app, "/contacts", &contact_form(&token, "+1 555 0199"));
    assert_redirects_home(&resp);

    let contacts = harness.store.snapshot();
    assert_eq!(contacts.len(), 4);
    assert_eq!(contacts[3].name, "Zed Zimmer");
    let (_, body) = get_html!(app, "/");
    assert!(body.contains("Zed Zimmer"));
}

#[actix_web::test]
async fn invalid_phone_is_rejected_without_a_request() {
    let harness = Harness::new(InMemoryContactApi::seeded(3));
    let app = init_app!(harness);
    get_html!(app, "/contacts/new");
    let token = harness.form_token().await;

    let resp = post!(app, "/contacts", &contact_form(&token, "12"));

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Invalid phone number"));
    assert_eq!(harness.store.write_calls(), 0);
}

#[actix_web::test]
async fn resubmitting_a_form_does_not_create_twice() {
    let harness = Harness::new(InMemoryContactApi::seeded(3));
    let app = init_app!(harness);
    get_html!(app, "/contacts/new");
    let token = harness.form_token().await;
    let form = contact_form(&token, "+1 555 0199");

    post!(app, "/contacts", &form);
    let resp = post!(app, "/contacts", &form);

    assert_redirects_home(&resp);
    assert_eq!(harness.store.write_calls(), 1);
    assert_eq!(harness.store.snapshot().len(), 4);
}

#[actix_web::test]
async fn edit_form_updates_the_contact() {
    let harness = Harness::new(InMemoryContactApi::seeded(3));
    let app = init_app!(harness);

    let (status, body) = get_html!(app, "/contacts/2/edit");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("contact2@example.com"));
    let token = harness.form_token().await;

    let mut form = contact_form(&token, "+1 555 0002");
    form[1] = ("name", "Renamed Person");
    let resp = post!(app, "/contacts/2", &form);

    assert_redirects_home(&resp);
    let contacts = harness.store.snapshot();
    assert_eq!(contacts[1].name, "Renamed Person");
    assert_eq!(contacts[1].id.as_str(), "2");
}

#[actix_web::test]
async fn delete_needs_confirmation() {
    let harness = Harness::new(InMemoryContactApi::seeded(3));
    let app = init_app!(harness);
    get_html!(app, "/");

    let resp = post!(app, "/contacts/2/delete");
    assert_redirects_home(&resp);
    assert_eq!(harness.store.write_calls(), 0);

    let (_, body) = get_html!(app, "/contacts/2/delete");
    assert!(body.contains("Delete Contact 02?"));
    let resp = post!(app, "/contacts/2/delete");

    assert_redirects_home(&resp);
    assert_eq!(harness.store.snapshot().len(), 2);
    let (_, body) = get_html!(app, "/");
    assert!(!body.contains("Contact 02"));
}

#[actix_web::test]
async fn favourite_toggle_flips_the_flag() {
    let harness = Harness::new(InMemoryContactApi::seeded(3));
    let app = init_app!(harness);

    let resp = post!(app, "/contacts/1/favourite");

    assert_redirects_home(&resp);
    assert!(harness.store.snapshot()[0].favourite);
}

#[actix_web::test]
async fn detail_dialog_shows_the_contact() {
    let harness = Harness::new(InMemoryContactApi::seeded(3));
    let app = init_app!(harness);

    let (status, body) = get_html!(app, "/contacts/3");

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("3 Example Street, Springfield"));
    assert!(body.contains("Remove from favourites"));
}

#[actix_web::test]
async fn unknown_contact_redirects_home() {
    let harness = Harness::new(InMemoryContactApi::seeded(3));
    let app = init_app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/contacts/42").to_request(),
    )
    .await;

    assert_redirects_home(&resp);
}

#[actix_web::test]
async fn api_returns_requested_page_as_json() {
    let harness = Harness::new(InMemoryContactApi::seeded(25));
    let app = init_app!(harness);

    let json: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/contacts?page=3")
            .to_request(),
    )
    .await;

    assert_eq!(json["total"], 25);
    assert_eq!(json["page"], 3);
    assert_eq!(json["total_pages"], 3);
    assert_eq!(json["contacts"].as_array().unwrap().len(), 5);
}

#[actix_web::test]
async fn api_tolerates_unreachable_page_numbers() {
    let harness = Harness::new(InMemoryContactApi::seeded(25));
    let app = init_app!(harness);

    let json: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/contacts?page={}", usize::MAX))
            .to_request(),
    )
    .await;

    assert_eq!(json["total"], 25);
    assert!(json["contacts"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn contact_ids_are_percent_encoded_in_links() {
    let contact = NewContact::new(
        "Odd Id".to_string(),
        "odd@example.com".to_string(),
        "+1 555 0100".to_string(),
        "1 Odd Road, Springfield".to_string(),
        false,
        None,
    )
    .with_id(ContactId::new("x\"y?z").unwrap());
    let harness = Harness::new(InMemoryContactApi::with_contacts(vec![contact]));
    let app = init_app!(harness);

    let (_, body) = get_html!(app, "/");
    assert!(body.contains("/contacts/x%22y%3Fz/edit"));
    assert!(!body.contains("x\"y"));

    let (status, body) = get_html!(app, "/contacts/x%22y%3Fz/edit");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("x%22y%3Fz\">"));
    assert!(!body.contains("x\"y"));
}
