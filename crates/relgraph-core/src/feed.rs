//! Feeds: transient listings of member resources.
//!
//! A feed body carries its own `links` and an `items` array. Items are
//! either lightweight stubs (`{id, title?}`) or fully linked embedded
//! representations. Feeds are never cached as graph nodes.

use std::sync::{Arc, RwLock};

use relgraph_types::{find_link, links_from_value, make_links_from, Link, RelPattern};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::{HydrationState, Hydratable, Identified};
use crate::error::{GraphError, GraphResult};
use crate::kind::{kinds, ResourceKind};
use crate::resource::{Resource, ResourceRef};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// URL of the listed resource.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl FeedItem {
    pub fn new(id: impl Into<String>, title: Option<String>) -> Self {
        Self {
            id: id.into(),
            title,
        }
    }

    /// A standalone node for the item, holding the title under `title_field`.
    pub fn to_resource(&self, title_field: &str) -> ResourceRef {
        let node = Resource::new(
            Arc::new(ResourceKind::new(kinds::RESOURCE)),
            make_links_from(&self.id),
        );
        node.set_field(title_field, self.title.clone().map_or(Value::Null, Value::String));
        node
    }
}

/// Items of a feed body.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedItems {
    Stubs(Vec<FeedItem>),
    /// Full representations, each with its own `links`.
    Embedded(Vec<Value>),
}

/// A parsed feed response.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedBody {
    pub links: Option<Vec<Link>>,
    pub items: FeedItems,
}

impl FeedBody {
    /// Parse a feed body. The first item decides between stubs and
    /// embedded representations; a missing `items` member reads as empty.
    pub fn parse(value: &Value) -> GraphResult<Self> {
        let links = links_from_value(value)?;
        let items = match value.get("items") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(GraphError::Malformed(format!(
                    "feed items are not an array: {other}"
                )))
            }
        };
        let embedded = items.first().is_some_and(|first| first.get("links").is_some());
        let items = if embedded {
            FeedItems::Embedded(items)
        } else {
            let stubs = items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<FeedItem>, _>>()
                .map_err(|e| GraphError::Malformed(format!("feed item: {e}")))?;
            FeedItems::Stubs(stubs)
        };
        Ok(Self { links, items })
    }
}

#[derive(Debug, Default)]
struct FeedState {
    links: Vec<Link>,
    items: Vec<FeedItem>,
    hydration: HydrationState,
}

/// A feed held outside the graph, such as a search result.
#[derive(Debug, Default)]
pub struct Feed {
    state: RwLock<FeedState>,
}

impl Feed {
    pub fn new(links: Vec<Link>) -> Self {
        Self {
            state: RwLock::new(FeedState {
                links,
                ..Default::default()
            }),
        }
    }

    pub fn from_url(url: &str) -> Self {
        Self::new(make_links_from(url))
    }

    pub fn add_item(&self, id: impl Into<String>, title: Option<&str>) -> &Self {
        self.state
            .write()
            .expect("lock poisoned")
            .items
            .push(FeedItem::new(id, title.map(String::from)));
        self
    }

    pub fn items(&self) -> Vec<FeedItem> {
        self.state.read().expect("lock poisoned").items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn embedded_to_item(value: &Value) -> GraphResult<FeedItem> {
    let links = links_from_value(value)?.unwrap_or_default();
    let pattern = RelPattern::identity();
    let id = find_link(&links, &pattern)
        .map(|l| l.href.clone())
        .ok_or_else(|| GraphError::missing_link(&pattern, &links))?;
    let title = value.get("title").and_then(Value::as_str).map(String::from);
    Ok(FeedItem { id, title })
}

impl Identified for Feed {
    fn links(&self) -> Vec<Link> {
        self.state.read().expect("lock poisoned").links.clone()
    }

    fn describe(&self) -> String {
        match self.identity(true) {
            Ok(Some(url)) => url,
            _ => "feed".to_string(),
        }
    }
}

impl Hydratable for Feed {
    fn hydration_state(&self) -> HydrationState {
        self.state.read().expect("lock poisoned").hydration
    }

    fn set_hydrated(&self) {
        self.state.write().expect("lock poisoned").hydration = HydrationState::Hydrated;
    }

    fn replace_links(&self, links: Vec<Link>) {
        self.state.write().expect("lock poisoned").links = links;
    }

    fn merge(&self, remote: &Value) -> GraphResult<()> {
        let body = FeedBody::parse(remote)?;
        let items = match body.items {
            FeedItems::Stubs(items) => items,
            FeedItems::Embedded(values) => values
                .iter()
                .map(embedded_to_item)
                .collect::<GraphResult<Vec<_>>>()?,
        };
        let mut state = self.state.write().expect("lock poisoned");
        if let Some(links) = body.links {
            state.links = links;
        }
        state.items = items;
        state.hydration = HydrationState::Hydrated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_stub_items() {
        let body = FeedBody::parse(&json!({
            "links": [{"rel": "self", "href": "feed"}],
            "items": [{"id": "url1", "title": "t1"}, {"id": "url2"}]
        }))
        .unwrap();
        assert_eq!(body.links.unwrap().len(), 1);
        assert_eq!(
            body.items,
            FeedItems::Stubs(vec![
                FeedItem::new("url1", Some("t1".into())),
                FeedItem::new("url2", None),
            ])
        );
    }

    #[test]
    fn parses_embedded_items() {
        let body = FeedBody::parse(&json!({
            "items": [{"links": [{"rel": "self", "href": "url1"}], "name": "x"}]
        }))
        .unwrap();
        assert!(matches!(body.items, FeedItems::Embedded(ref v) if v.len() == 1));
        assert!(body.links.is_none());
    }

    #[test]
    fn missing_items_is_empty() {
        let body = FeedBody::parse(&json!({"links": []})).unwrap();
        assert_eq!(body.items, FeedItems::Stubs(vec![]));
    }

    #[test]
    fn items_must_be_an_array() {
        let err = FeedBody::parse(&json!({"items": 3})).unwrap_err();
        assert!(matches!(err, GraphError::Malformed(_)));
    }

    #[test]
    fn feed_helpers() {
        let feed = Feed::from_url("feed");
        feed.add_item("url1", Some("t1")).add_item("url2", None);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.url().unwrap(), "feed");
        assert_eq!(feed.items()[1], FeedItem::new("url2", None));
    }

    #[test]
    fn feed_merge_accepts_embedded_items() {
        let feed = Feed::new(vec![]);
        feed.merge(&json!({
            "links": [{"rel": "self", "href": "results"}],
            "items": [{"links": [{"rel": "self", "href": "url1"}], "title": "one"}]
        }))
        .unwrap();
        assert!(feed.is_hydrated());
        assert_eq!(feed.url().unwrap(), "results");
        assert_eq!(feed.items(), vec![FeedItem::new("url1", Some("one".into()))]);
    }

    #[test]
    fn item_to_resource_carries_title() {
        let item = FeedItem::new("url1", Some("Acme".into()));
        let node = item.to_resource("name");
        assert_eq!(node.url().unwrap(), "url1");
        assert_eq!(node.field("name"), Some(json!("Acme")));
        assert!(node.feed_title().is_none());
    }
}
