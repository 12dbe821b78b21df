//! In-memory transport for testing and offline use.
//!
//! [`InMemoryTransport`] answers requests from canned responses keyed by
//! method and URL and records every call it receives. Registering a response
//! for a key that already has one replaces it, so a test can change what the
//! "server" returns between two hydrations.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::cancel::Cancellable;
use crate::error::{HttpError, HttpResult};
use crate::transport::HttpTransport;
use crate::types::{Headers, HttpMethod, HttpResponse};

#[derive(Clone, Debug)]
struct Canned {
    status: u16,
    body: String,
    headers: Headers,
}

/// One request seen by the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryTransport {
    responses: RwLock<HashMap<(HttpMethod, String), Canned>>,
    calls: RwLock<Vec<RecordedCall>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `GET url` with a JSON body.
    pub fn respond_json(&self, url: &str, body: &Value) {
        self.respond(HttpMethod::Get, url, 200, body.to_string(), Headers::new());
    }

    /// Answer `POST url` with an empty body and the given redirect target.
    pub fn respond_location(&self, url: &str, location: &str) {
        let headers = Headers::new().with("Location", location);
        self.respond(HttpMethod::Post, url, 201, String::new(), headers);
    }

    /// Answer `method url` with a bare status and no body.
    pub fn respond_status(&self, method: HttpMethod, url: &str, status: u16) {
        self.respond(method, url, status, String::new(), Headers::new());
    }

    pub fn respond(
        &self,
        method: HttpMethod,
        url: &str,
        status: u16,
        body: String,
        headers: Headers,
    ) {
        self.responses
            .write()
            .expect("lock poisoned")
            .insert((method, url.to_string()), Canned { status, body, headers });
    }

    /// Every call received, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().expect("lock poisoned").clone()
    }

    pub fn call_count(&self, method: HttpMethod, url: &str) -> usize {
        self.calls
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|c| c.method == method && c.url == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.read().expect("lock poisoned").len()
    }

    /// Forget the call log; canned responses stay.
    pub fn clear_calls(&self) {
        self.calls.write().expect("lock poisoned").clear();
    }

    async fn answer(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<String>,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>> {
        self.calls.write().expect("lock poisoned").push(RecordedCall {
            method,
            url: url.to_string(),
            body,
        });
        // Let other tasks on the same thread run, as a real round trip would.
        tokio::task::yield_now().await;

        if cancellable.is_some_and(Cancellable::is_cancelled) {
            return Err(HttpError::Cancelled {
                method,
                url: url.to_string(),
            });
        }

        let canned = self
            .responses
            .read()
            .expect("lock poisoned")
            .get(&(method, url.to_string()))
            .cloned();
        let canned = canned.unwrap_or(Canned {
            status: 404,
            body: String::new(),
            headers: Headers::new(),
        });
        if !(200..300).contains(&canned.status) {
            return Err(HttpError::Status {
                method,
                url: url.to_string(),
                status: canned.status,
                status_text: status_text(canned.status).into(),
            });
        }
        Ok(HttpResponse::new(canned.body, canned.headers))
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "",
    }
}

#[async_trait]
impl HttpTransport for InMemoryTransport {
    async fn get_text(
        &self,
        url: &str,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>> {
        self.answer(HttpMethod::Get, url, None, cancellable).await
    }

    async fn put(
        &self,
        url: &str,
        body: String,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>> {
        self.answer(HttpMethod::Put, url, Some(body), cancellable).await
    }

    async fn patch(
        &self,
        url: &str,
        body: Value,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>> {
        self.answer(HttpMethod::Patch, url, Some(body.to_string()), cancellable)
            .await
    }

    async fn post_form(
        &self,
        url: &str,
        body: String,
        cancellable: Option<&Cancellable>,
    ) -> HttpResult<HttpResponse<String>> {
        self.answer(HttpMethod::Post, url, Some(body), cancellable).await
    }
}
