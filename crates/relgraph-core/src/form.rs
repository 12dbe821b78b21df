//! The form family.
//!
//! A form is a node of one of the form kinds. Its `items` list names the
//! fields a submission carries; submitting POSTs URL-encoded data to the
//! form's own URL and reads the redirect target from the response.
//!
//! - [`Form`] — generic submission
//! - [`CreateForm`] — submit a new node, then adopt and load its new URL
//! - [`EditForm`] — submit a node's edited fields
//! - [`SearchForm`] — submit a pattern, load the result feed

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use relgraph_http::Cancellable;
use relgraph_types::make_links_from;
use serde_json::Value;
use tracing::debug;

use crate::capability::{Hydratable, Identified, Submittable};
use crate::error::GraphResult;
use crate::feed::Feed;
use crate::options::HydrateOptions;
use crate::resource::{Resource, ResourceRef};

/// Returned when a submission's response carries no redirect target.
pub const NO_TARGET: &str = "no target";

/// Characters left unescaped in form values, besides ASCII alphanumerics.
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Ordered field data for a submission.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormData {
    entries: Vec<(String, Value)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a field, keeping its original position when it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self) -> String {
        encode_form(self)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (k, v) in iter {
            data.insert(k, v);
        }
        data
    }
}

fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, FORM_VALUE).to_string().replace("%20", "+")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `application/x-www-form-urlencoded` body, fields in insertion order.
///
/// Spaces become `+`; `null` encodes as an empty value.
pub fn encode_form(data: &FormData) -> String {
    data.iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(&value_text(v))))
        .collect::<Vec<_>>()
        .join("&")
}

/// Result of a form submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The redirect target named by the response.
    Target(String),
    NoTarget,
}

impl SubmitOutcome {
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Target(url) => Some(url),
            Self::NoTarget => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Target(url) => url,
            Self::NoTarget => NO_TARGET,
        }
    }
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Default)]
pub struct SubmitOptions<'a> {
    /// Node to re-identify with the redirect target and reload.
    pub load_target: Option<&'a dyn Hydratable>,
    pub cancellable: Option<&'a Cancellable>,
}

#[derive(Clone, Debug)]
pub struct Form {
    resource: ResourceRef,
}

impl Form {
    pub fn new(resource: ResourceRef) -> Self {
        Self { resource }
    }

    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Ids of the form's items: the fields a submission projects.
    pub fn form_item_ids(&self) -> Vec<String> {
        match self.resource.field("items") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str))
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub async fn submit(
        &self,
        data: &FormData,
        options: SubmitOptions<'_>,
    ) -> GraphResult<SubmitOutcome> {
        let rest = self.resource.rest()?;
        let url = self.resource.url()?;
        debug!(form = %url, fields = data.len(), "submitting form");
        let response = rest
            .http()
            .post_form(&url, data.encode(), options.cancellable)
            .await?;
        let Some(target) = response.headers.location().map(String::from) else {
            debug!(form = %url, "submission returned no target");
            return Ok(SubmitOutcome::NoTarget);
        };
        if let Some(load_target) = options.load_target {
            load_target.replace_links(make_links_from(&target));
            if let Some(node) = load_target.as_resource() {
                rest.adopt(&target, node);
            }
            let reload = HydrateOptions {
                reload_resource: true,
                cancellable: options.cancellable.cloned(),
            };
            rest.hydrate(load_target, &reload).await?;
        }
        Ok(SubmitOutcome::Target(target))
    }
}

#[async_trait]
impl Submittable for Form {
    async fn submit(
        &self,
        data: &FormData,
        options: SubmitOptions<'_>,
    ) -> GraphResult<SubmitOutcome> {
        Form::submit(self, data, options).await
    }
}

#[derive(Clone, Debug)]
pub struct CreateForm(Form);

impl CreateForm {
    pub fn new(resource: ResourceRef) -> Self {
        Self(Form::new(resource))
    }

    pub fn form(&self) -> &Form {
        &self.0
    }

    /// Submit `node`'s projected fields, then give it the new URL and load it.
    pub async fn submit_create(
        &self,
        node: &Resource,
        cancellable: Option<&Cancellable>,
    ) -> GraphResult<SubmitOutcome> {
        let data = node.project_fields(self.0.form_item_ids().as_slice());
        let options = SubmitOptions {
            load_target: Some(node),
            cancellable,
        };
        self.0.submit(&data, options).await
    }
}

#[derive(Clone, Debug)]
pub struct EditForm(Form);

impl EditForm {
    pub fn new(resource: ResourceRef) -> Self {
        Self(Form::new(resource))
    }

    pub fn form(&self) -> &Form {
        &self.0
    }

    pub async fn submit_edit(
        &self,
        node: &Resource,
        cancellable: Option<&Cancellable>,
    ) -> GraphResult<SubmitOutcome> {
        let data = node.project_fields(self.0.form_item_ids().as_slice());
        let options = SubmitOptions {
            load_target: None,
            cancellable,
        };
        self.0.submit(&data, options).await
    }
}

#[derive(Clone, Debug)]
pub struct SearchForm(Form);

impl SearchForm {
    pub fn new(resource: ResourceRef) -> Self {
        Self(Form::new(resource))
    }

    pub fn form(&self) -> &Form {
        &self.0
    }

    /// Submit `{search: pattern}` and load the result feed, which is never
    /// cached.
    pub async fn submit_search(
        &self,
        pattern: &str,
        cancellable: Option<&Cancellable>,
    ) -> GraphResult<Arc<Feed>> {
        let results = Arc::new(Feed::new(Vec::new()));
        let data = FormData::new().with("search", pattern);
        let options = SubmitOptions {
            load_target: Some(&*results),
            cancellable,
        };
        self.0.submit(&data, options).await?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Rest;
    use crate::kind::{kinds, KindRegistry};
    use proptest::prelude::*;
    use relgraph_http::{HttpMethod, InMemoryTransport};
    use serde_json::json;

    fn setup() -> (Arc<InMemoryTransport>, Arc<Rest>) {
        let http = Arc::new(InMemoryTransport::new());
        let rest = Rest::new(http.clone(), KindRegistry::new(), "http://api/");
        (http, rest)
    }

    fn form_at(rest: &Arc<Rest>, kind: &str, url: &str, items: Value) -> ResourceRef {
        let form = rest.resource(kind, make_links_from(url)).unwrap();
        form.merge(&json!({"items": items})).unwrap();
        form
    }

    #[test]
    fn encodes_spaces_as_plus() {
        let data = FormData::new().with("a", "one and two");
        assert_eq!(data.encode(), "a=one+and+two");
    }

    #[test]
    fn encodes_reserved_characters() {
        let data = FormData::new().with("a", "=@\"");
        assert_eq!(data.encode(), "a=%3D%40%22");
    }

    #[test]
    fn encodes_in_insertion_order() {
        let data: FormData = [("b", json!(2)), ("a", json!(1)), ("c", Value::Null)]
            .into_iter()
            .collect();
        assert_eq!(encode_form(&data), "b=2&a=1&c=");
    }

    #[test]
    fn insert_keeps_position() {
        let mut data = FormData::new().with("a", 1).with("b", 2);
        data.insert("a", 3);
        assert_eq!(data.encode(), "a=3&b=2");
    }

    proptest! {
        #[test]
        fn encoded_values_use_only_safe_characters(value in "\\PC*") {
            let encoded = FormData::new().with("k", value.as_str()).encode();
            let body = &encoded[2..];
            let safe = |c: char| c.is_ascii_alphanumeric() || "-_.!~*'()%+".contains(c);
            prop_assert!(body.chars().all(safe));
        }

        #[test]
        fn alphanumerics_pass_through(value in "[a-zA-Z0-9]{0,24}") {
            let encoded = FormData::new().with("k", value.as_str()).encode();
            prop_assert_eq!(encoded, format!("k={value}"));
        }
    }

    #[test]
    fn form_item_ids_from_items() {
        let (_, rest) = setup();
        let form = Form::new(form_at(
            &rest,
            kinds::FORM,
            "form",
            json!([{"id": "name", "type": "text"}, {"id": "email"}, {"label": "no id"}]),
        ));
        assert_eq!(form.form_item_ids(), vec!["name", "email"]);
    }

    #[tokio::test]
    async fn submit_resolves_redirect_target() {
        let (http, rest) = setup();
        http.respond_location("form", "newUrl");
        let form = Form::new(form_at(&rest, kinds::FORM, "form", json!([])));

        let data = FormData::new().with("a", 1).with("b", 2);
        let outcome = form.submit(&data, SubmitOptions::default()).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Target("newUrl".into()));
        assert_eq!(outcome.as_str(), "newUrl");
        assert_eq!(http.calls()[0].body.as_deref(), Some("a=1&b=2"));
    }

    #[tokio::test]
    async fn submit_without_location_is_no_target() {
        let (http, rest) = setup();
        http.respond_status(HttpMethod::Post, "form", 200);
        let form = Form::new(form_at(&rest, kinds::FORM, "form", json!([])));

        let outcome = form
            .submit(&FormData::new().with("a", 1), SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::NoTarget);
        assert_eq!(outcome.to_string(), "no target");
    }

    #[tokio::test]
    async fn submit_failure_propagates_status() {
        let (http, rest) = setup();
        http.respond_status(HttpMethod::Post, "form", 409);
        let form = Form::new(form_at(&rest, kinds::FORM, "form", json!([])));
        let err = form
            .submit(&FormData::new(), SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("409"));
    }

    #[tokio::test]
    async fn create_form_identifies_and_loads_node() {
        let (http, rest) = setup();
        http.respond_location("create", "svc/9");
        http.respond_json(
            "svc/9",
            &json!({
                "links": [
                    {"rel": "self", "href": "svc/9"},
                    {"rel": "edit-form", "href": "svc/9/edit"}
                ],
                "name": "Cleaning"
            }),
        );
        let fields = json!([{"id": "name"}]);
        let form = CreateForm::new(form_at(&rest, kinds::CREATE_FORM, "create", fields));
        let node = rest.new_resource("resource").unwrap();
        node.set_field("name", "Cleaning");

        let outcome = form.submit_create(&node, None).await.unwrap();

        assert_eq!(outcome.target(), Some("svc/9"));
        assert_eq!(node.url().unwrap(), "svc/9");
        assert!(node.is_hydrated());
        assert_eq!(node.links().len(), 2);
        assert!(Arc::ptr_eq(&rest.cached("svc/9").unwrap(), &node));
        assert_eq!(http.calls()[0].body.as_deref(), Some("name=Cleaning"));
    }

    #[tokio::test]
    async fn edit_form_does_not_reload() {
        let (http, rest) = setup();
        http.respond_location("edit", "svc/1");
        let form = EditForm::new(form_at(&rest, kinds::EDIT_FORM, "edit", json!([{"id": "name"}])));
        let node = rest.resource("resource", make_links_from("svc/1")).unwrap();
        node.set_field("name", "x y");

        let outcome = form.submit_edit(&node, None).await.unwrap();

        assert_eq!(outcome.target(), Some("svc/1"));
        assert_eq!(http.total_calls(), 1);
        assert_eq!(http.calls()[0].body.as_deref(), Some("name=x+y"));
    }

    #[tokio::test]
    async fn search_form_loads_uncached_feed() {
        let (http, rest) = setup();
        http.respond_location("search", "results/1");
        http.respond_json(
            "results/1",
            &json!({
                "links": [{"rel": "self", "href": "results/1"}],
                "items": [{"id": "svc/1", "title": "One"}]
            }),
        );
        let form = SearchForm::new(form_at(&rest, kinds::SEARCH_FORM, "search", json!([])));

        let feed = form.submit_search("clean", None).await.unwrap();

        assert_eq!(feed.url().unwrap(), "results/1");
        assert_eq!(feed.len(), 1);
        assert!(rest.cached("results/1").is_none());
        assert_eq!(http.calls()[0].body.as_deref(), Some("search=clean"));
    }
}
