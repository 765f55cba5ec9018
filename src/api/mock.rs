//! Mock store implementation for isolating the query and view layers in tests.

use async_trait::async_trait;
use mockall::mock;

use crate::api::{ApiResult, ContactReader, ContactWriter};
use crate::domain::contact::{Contact, NewContact, PageRequest, PageResult};
use crate::domain::types::ContactId;

mock! {
    pub ContactApi {}

    #[async_trait]
    impl ContactReader for ContactApi {
        async fn list_contacts(&self, request: &PageRequest) -> ApiResult<PageResult>;
        async fn list_all_contacts(
            &self,
            search: &str,
            favorites_only: bool,
        ) -> ApiResult<Vec<Contact>>;
    }

    #[async_trait]
    impl ContactWriter for ContactApi {
        async fn create_contact(&self, contact: &NewContact) -> ApiResult<Contact>;
        async fn update_contact(&self, contact: &Contact) -> ApiResult<Contact>;
        async fn delete_contact(&self, id: &ContactId) -> ApiResult<()>;
    }
}
