//! Shared helpers for engine tests.

use std::sync::Arc;

use relgraph_http::InMemoryTransport;
use serde_json::{json, Value};

use crate::engine::Rest;
use crate::kind::KindRegistry;

pub(crate) fn setup() -> (Arc<InMemoryTransport>, Arc<Rest>) {
    setup_with(KindRegistry::new())
}

pub(crate) fn setup_with(kinds: KindRegistry) -> (Arc<InMemoryTransport>, Arc<Rest>) {
    let http = Arc::new(InMemoryTransport::new());
    let rest = Rest::new(http.clone(), kinds, "http://api/");
    (http, rest)
}

/// A representation with a single self link plus `fields`.
pub(crate) fn body(url: &str, fields: Value) -> Value {
    linked(&[("self", url)], fields)
}

/// A representation with the given `(rel, href)` links plus `fields`.
pub(crate) fn linked(links: &[(&str, &str)], fields: Value) -> Value {
    let links: Vec<Value> = links
        .iter()
        .map(|(rel, href)| json!({"rel": rel, "href": href}))
        .collect();
    let mut value = fields;
    if !value.is_object() {
        value = json!({});
    }
    value["links"] = Value::Array(links);
    value
}

/// A feed of stub items.
pub(crate) fn stub_feed(links: &[(&str, &str)], items: &[(&str, &str)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(id, title)| json!({"id": id, "title": title}))
        .collect();
    linked(links, json!({"items": items}))
}
