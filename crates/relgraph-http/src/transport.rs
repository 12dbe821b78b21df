//! The [`HttpTransport`] trait consumed by the hydration engine.

use async_trait::async_trait;
use serde_json::Value;

use crate::cancel::Cancellable;
use crate::error::{HttpError, HttpResult};
use crate::types::HttpResponse;

/// Transport interface for a hypermedia API.
///
/// Every operation fails with [`HttpError::Status`] on a non-success status
/// and is never retried at this layer. The optional [`Cancellable`] aborts
/// the request when triggered.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET the raw body.
    async fn get_text(
        &self,
        url: &str,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>>;

    /// GET a JSON body.
    ///
    /// Default implementation decodes [`HttpTransport::get_text`].
    async fn get(
        &self,
        url: &str,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<Value>> {
        let response = self.get_text(url, cancellable).await?;
        let data = serde_json::from_str(&response.data).map_err(|e| HttpError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(HttpResponse::new(data, response.headers))
    }

    async fn put(
        &self,
        url: &str,
        body: String,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>>;

    /// PATCH with a JSON body.
    async fn patch(
        &self,
        url: &str,
        body: Value,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>>;

    /// POST an `application/x-www-form-urlencoded` body.
    async fn post_form(
        &self,
        url: &str,
        body: String,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>>;
}
