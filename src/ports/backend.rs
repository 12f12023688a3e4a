//! Transport boundary. The engine owns URLs, query parameters, and page
//! sequencing; the host owns the actual HTTP stack behind this trait.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::BackendError;
use crate::schema::Schema;

/// One page request against the value-lookup endpoint. Maps to
/// `GET <suggestions_api_url>?field=<model>.<field>&search=<prefix>&page=<n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRequest {
    pub url: String,
    pub model: String,
    pub field: String,
    pub search: String,
    pub page: u32,
}

impl ValueRequest {
    pub fn query_field(&self) -> String {
        format!("{}.{}", self.model, self.field)
    }
}

/// Wire shape of a delivered value page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValuePage {
    pub items: Vec<String>,
    pub page: u32,
    pub has_next: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SuggestionBackend: Send + Sync {
    /// Fetches the schema payload `{current_model, models,
    /// suggestions_api_url}` from the given URL.
    async fn fetch_schema(&self, url: &str) -> Result<Schema, BackendError>;

    /// Fetches one page of field values.
    async fn fetch_values(&self, request: &ValueRequest) -> Result<ValuePage, BackendError>;
}
