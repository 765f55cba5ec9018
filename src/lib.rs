use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "server")]
use actix_web::cookie::Key;
#[cfg(feature = "server")]
use actix_web::{App, HttpServer, middleware, web};
#[cfg(feature = "server")]
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
#[cfg(feature = "server")]
use tera::Tera;

use crate::api::ContactApi;
use crate::api::http::HttpContactApi;
use crate::models::config::ServerConfig;
use crate::query::client::QueryClient;
use crate::state::StateStore;
use crate::view::ContactListView;

pub mod api;
pub mod domain;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod query;
#[cfg(feature = "server")]
pub mod routes;
pub mod state;
pub mod view;

/// Shared client-side services wired from one configuration.
pub struct AppServices {
    pub client: Arc<QueryClient>,
    pub state: Arc<StateStore>,
}

impl AppServices {
    pub fn new(api: Arc<dyn ContactApi>, stale_time: Duration) -> Self {
        Self {
            client: Arc::new(QueryClient::new(api, stale_time)),
            state: Arc::new(StateStore::new()),
        }
    }

    /// Connects to the Remote Contact Store named in `config`.
    pub fn from_config(config: &ServerConfig) -> api::ApiResult<Self> {
        let api = HttpContactApi::from_config(config)?;
        Ok(Self::new(
            Arc::new(api),
            Duration::from_secs(config.stale_time_secs),
        ))
    }

    /// A fresh list view observing this client and toolbar state.
    pub fn list_view(&self) -> ContactListView {
        ContactListView::new(Arc::clone(&self.client), Arc::clone(&self.state))
    }
}

/// Registers every route of the contact manager on an Actix service config.
#[cfg(feature = "server")]
pub fn configure(cfg: &mut web::ServiceConfig) {
    use crate::routes::api::api_contacts;
    use crate::routes::contacts::{
        confirm_delete_contact, create_contact, delete_contact, edit_contact, new_contact,
        show_contact, toggle_favourite, update_contact,
    };
    use crate::routes::main::{
        close_dialog, favourites, next_page, prev_page, refresh, search, show_index,
    };

    cfg.service(web::scope("/api").service(api_contacts))
        .service(show_index)
        .service(search)
        .service(favourites)
        .service(next_page)
        .service(prev_page)
        .service(refresh)
        .service(close_dialog)
        // `/contacts/new` has to be matched before `/contacts/{contact_id}`.
        .service(new_contact)
        .service(create_contact)
        .service(show_contact)
        .service(update_contact)
        .service(edit_contact)
        .service(confirm_delete_contact)
        .service(delete_contact)
        .service(toggle_favourite);
}

/// Builds and runs the Actix-Web HTTP server using the provided configuration.
#[cfg(feature = "server")]
pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
    let services = AppServices::from_config(&server_config).map_err(|e| {
        std::io::Error::other(format!("Failed to configure contact store client: {e}"))
    })?;

    log::info!(
        "Using contact store at {} (page consistency fallback: {})",
        server_config.api_base_url,
        server_config.page_consistency_fallback
    );

    let view = web::Data::new(tokio::sync::Mutex::new(services.list_view()));
    let client = web::Data::new(Arc::clone(&services.client));
    let state = web::Data::new(Arc::clone(&services.state));

    // Key and store for flash messages.
    let secret_key = Key::from(server_config.secret.as_bytes());

    let message_store = CookieMessageStore::builder(secret_key).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = Tera::new(&server_config.templates_dir)
        .map_err(|e| std::io::Error::other(format!("Template parsing error(s): {e}")))?;

    let bind_address = (server_config.address.clone(), server_config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .configure(configure)
            .app_data(web::Data::new(tera.clone()))
            .app_data(view.clone())
            .app_data(client.clone())
            .app_data(state.clone())
    })
    .bind(bind_address)?
    .run()
    .await
}
