//! reqwest-backed client for the Remote Contact Store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};

use crate::api::consistency::{Reconciled, reconcile_page};
use crate::api::{ApiError, ApiResult, ContactReader, ContactWriter};
use crate::domain::contact::{Contact, NewContact, PageRequest, PageResult};
use crate::domain::types::ContactId;
use crate::models::config::ServerConfig;
use crate::models::contact::{ContactBody, ContactRecord};

/// Response header carrying the size of the filtered collection.
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Longest slice of an error body echoed into [`ApiError::Http`].
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpContactApi {
    http: Client,
    base_url: Url,
    page_consistency_fallback: bool,
    assign_client_ids: bool,
}

impl HttpContactApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid api base url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "api base url {base_url} cannot be a base"
            )));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            page_consistency_fallback: false,
            assign_client_ids: false,
        })
    }

    pub fn from_config(config: &ServerConfig) -> ApiResult<Self> {
        Ok(
            Self::new(&config.api_base_url, Duration::from_secs(config.request_timeout_secs))?
                .with_page_consistency_fallback(config.page_consistency_fallback)
                .with_client_assigned_ids(config.assign_client_ids),
        )
    }

    /// Enables cross-checking every page against a locally sliced listing.
    #[must_use]
    pub fn with_page_consistency_fallback(mut self, enabled: bool) -> Self {
        self.page_consistency_fallback = enabled;
        self
    }

    /// Sends a generated UUID with every create request.
    #[must_use]
    pub fn with_client_assigned_ids(mut self, enabled: bool) -> Self {
        self.assign_client_ids = enabled;
        self
    }

    fn url(&self, id: Option<&ContactId>) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ApiError::Config("api base url cannot be a base".to_string()))?;
            segments.pop_if_empty().push("contacts");
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    fn filter_params(search: &str, favorites_only: bool) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let search = search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
        if favorites_only {
            params.push(("favourite", "true".to_string()));
        }
        params
    }

    async fn fetch(&self, params: &[(&'static str, String)]) -> ApiResult<(Vec<Contact>, Option<usize>)> {
        let url = self.url(None)?;
        log::debug!("GET {url} {params:?}");

        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(network_error)?;
        let response = ensure_success(response).await?;

        let total = total_count(&response);
        let records: Vec<ContactRecord> = response.json().await.map_err(ApiError::from)?;
        let contacts = records
            .into_iter()
            .map(Contact::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((contacts, total))
    }

    async fn parse_contact(response: Response) -> ApiResult<Contact> {
        let record: ContactRecord = response.json().await.map_err(ApiError::from)?;
        Ok(Contact::try_from(record)?)
    }
}

fn network_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Network(format!("request timed out: {err}"))
    } else {
        ApiError::Network(err.to_string())
    }
}

/// Reads [`TOTAL_COUNT_HEADER`], ignoring missing or malformed values.
fn total_count(response: &Response) -> Option<usize> {
    response
        .headers()
        .get(TOTAL_COUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Turns non-2xx responses into [`ApiError::Http`].
async fn ensure_success(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        body.chars().take(ERROR_BODY_LIMIT).collect()
    };
    log::error!("Contact store answered {status}: {message}");
    Err(ApiError::http(status, message))
}

#[async_trait]
impl ContactReader for HttpContactApi {
    async fn list_contacts(&self, request: &PageRequest) -> ApiResult<PageResult> {
        let mut params = vec![
            ("page", request.page.to_string()),
            ("limit", request.page_size().to_string()),
        ];
        params.extend(Self::filter_params(&request.search, request.favorites_only));

        let (contacts, total) = self.fetch(&params).await?;
        let total = total.unwrap_or_else(|| {
            log::warn!("{TOTAL_COUNT_HEADER} missing, using page length as total");
            contacts.len()
        });
        let page = PageResult { contacts, total };

        if !self.page_consistency_fallback {
            return Ok(page);
        }

        let full = self
            .list_all_contacts(&request.search, request.favorites_only)
            .await?;
        let reconciled = reconcile_page(request, page, full);
        if let Reconciled::Substituted(_) = reconciled {
            log::warn!(
                "Store page {} disagreed with the sorted collection, using local slice",
                request.page
            );
        }
        Ok(reconciled.into_inner())
    }

    async fn list_all_contacts(
        &self,
        search: &str,
        favorites_only: bool,
    ) -> ApiResult<Vec<Contact>> {
        let params = Self::filter_params(search, favorites_only);
        let (contacts, _) = self.fetch(&params).await?;
        Ok(contacts)
    }
}

#[async_trait]
impl ContactWriter for HttpContactApi {
    async fn create_contact(&self, contact: &NewContact) -> ApiResult<Contact> {
        let url = self.url(None)?;
        let generated = self.assign_client_ids.then(ContactId::generate);
        let mut body = ContactBody::from(contact);
        body.id = generated.as_ref().map(ContactId::as_str);
        log::debug!("POST {url}");

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        let response = ensure_success(response).await?;
        Self::parse_contact(response).await
    }

    async fn update_contact(&self, contact: &Contact) -> ApiResult<Contact> {
        let url = self.url(Some(&contact.id))?;
        log::debug!("PUT {url}");

        let response = self
            .http
            .put(url)
            .json(&ContactBody::from(contact))
            .send()
            .await
            .map_err(network_error)?;
        let response = ensure_success(response)
            .await
            .map_err(ApiError::not_found_on_404)?;
        Self::parse_contact(response).await
    }

    async fn delete_contact(&self, id: &ContactId) -> ApiResult<()> {
        let url = self.url(Some(id))?;
        log::debug!("DELETE {url}");

        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(network_error)?;
        ensure_success(response)
            .await
            .map_err(ApiError::not_found_on_404)?;
        Ok(())
    }
}
