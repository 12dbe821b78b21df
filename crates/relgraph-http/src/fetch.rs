//! `reqwest`-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cancel::Cancellable;
use crate::error::{HttpError, HttpResult};
use crate::transport::HttpTransport;
use crate::types::{Headers, HttpMethod, HttpResponse};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            user_agent: concat!("relgraph/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// HTTP transport over a shared `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct FetchTransport {
    client: reqwest::Client,
}

impl FetchTransport {
    pub fn new() -> HttpResult<Self> {
        Self::with_config(&FetchConfig::default())
    }

    /// Fails when the configuration cannot produce a client, such as a user
    /// agent that is not a valid header value.
    pub fn with_config(config: &FetchConfig) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn request(&self, method: HttpMethod, url: &str) -> RequestBuilder {
        let m = match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Post => Method::POST,
        };
        self.client.request(m, url)
    }

    /// Send, racing the request against the cancellation token, and read the
    /// body as text. Non-success statuses become [`HttpError::Status`].
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        request: RequestBuilder,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>> {
        debug!(%method, url, "http request");
        let exchange = Self::exchange(method, url, request);
        match cancellable {
            Some(token) => tokio::select! {
                result = exchange => result,
                _ = token.cancelled() => Err(HttpError::Cancelled {
                    method,
                    url: url.to_string(),
                }),
            },
            None => exchange.await,
        }
    }

    async fn exchange(
        method: HttpMethod,
        url: &str,
        request: RequestBuilder,
    ) -> HttpResult<HttpResponse<String>> {
        let response = request.send().await.map_err(|e| HttpError::Connection {
            method,
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let response = Self::check_status(method, url, response)?;
        let headers = Self::headers_of(&response);
        let data = response.text().await.map_err(|e| HttpError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(HttpResponse::new(data, headers))
    }

    fn check_status(method: HttpMethod, url: &str, response: Response) -> HttpResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(HttpError::Status {
            method,
            url: url.to_string(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }

    fn headers_of(response: &Response) -> Headers {
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str(), v);
            }
        }
        headers
    }
}

#[async_trait]
impl HttpTransport for FetchTransport {
    async fn get_text(
        &self,
        url: &str,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>> {
        let request = self.request(HttpMethod::Get, url);
        self.send(HttpMethod::Get, url, request, cancellable).await
    }

    async fn put(
        &self,
        url: &str,
        body: String,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>> {
        let request = self.request(HttpMethod::Put, url).body(body);
        self.send(HttpMethod::Put, url, request, cancellable).await
    }

    async fn patch(
        &self,
        url: &str,
        body: Value,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>> {
        let request = self
            .request(HttpMethod::Patch, url)
            .header(CONTENT_TYPE, PATCH_CONTENT_TYPE)
            .body(body.to_string());
        self.send(HttpMethod::Patch, url, request, cancellable).await
    }

    async fn post_form(
        &self,
        url: &str,
        body: String,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>> {
        let request = self
            .request(HttpMethod::Post, url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);
        self.send(HttpMethod::Post, url, request, cancellable).await
    }
}
