//! Typed links and link-set lookup.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LinkError, Result};
use crate::pattern::{rels, RelPattern};

/// A typed edge from one resource to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: None,
            title: None,
        }
    }

    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// The link set of a freshly referenced resource: a single `self` link.
pub fn make_links_from(url: &str) -> Vec<Link> {
    vec![Link::new(rels::SELF, url)]
}

/// First link whose relation matches `pattern`.
///
/// Relation names are not unique within a link set; the first match wins.
pub fn find_link<'a>(links: &'a [Link], pattern: &RelPattern) -> Option<&'a Link> {
    links.iter().find(|link| pattern.matches(&link.rel))
}

/// Read the `links` member of a JSON representation.
///
/// Returns `Ok(None)` when the member is absent or `null`.
pub fn links_from_value(value: &Value) -> Result<Option<Vec<Link>>> {
    match value.get("links") {
        None | Some(Value::Null) => Ok(None),
        Some(links) => serde_json::from_value(links.clone())
            .map(Some)
            .map_err(|e| LinkError::InvalidLinks(format!("{e}: {links}"))),
    }
}

/// Compact JSON rendering of a link set, used in error messages.
pub fn links_to_json(links: &[Link]) -> String {
    serde_json::to_string(links).unwrap_or_else(|_| format!("{links:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn make_links_from_is_single_self() {
        let links = make_links_from("url1");
        assert_eq!(links, vec![Link::new("self", "url1")]);
    }

    #[test]
    fn find_link_takes_first_match() {
        let links = vec![
            Link::new("up", "a"),
            Link::new("child", "b"),
            Link::new("child", "c"),
        ];
        let found = find_link(&links, &RelPattern::new("child")).unwrap();
        assert_eq!(found.href, "b");
        assert!(find_link(&links, &RelPattern::new("next")).is_none());
    }

    #[test]
    fn identity_matches_canonical() {
        let links = vec![Link::new("canonical", "c"), Link::new("self", "s")];
        assert_eq!(find_link(&links, &RelPattern::identity()).unwrap().href, "c");
    }

    #[test]
    fn links_from_value_reads_optional_members() {
        let v = json!({
            "links": [
                {"rel": "self", "href": "u"},
                {"rel": "alternate", "href": "v", "type": "text/html", "title": "V"}
            ]
        });
        let links = links_from_value(&v).unwrap().unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].media_type.as_deref(), Some("text/html"));
        assert_eq!(links[1].title.as_deref(), Some("V"));
    }

    #[test]
    fn links_from_value_absent() {
        assert_eq!(links_from_value(&json!({"name": "x"})).unwrap(), None);
        assert_eq!(links_from_value(&json!({"links": null})).unwrap(), None);
    }

    #[test]
    fn links_from_value_rejects_garbage() {
        let err = links_from_value(&json!({"links": [42]})).unwrap_err();
        assert!(matches!(err, LinkError::InvalidLinks(_)));
    }

    #[test]
    fn links_to_json_is_compact() {
        let json = links_to_json(&make_links_from("urlParent"));
        assert_eq!(json, r#"[{"rel":"self","href":"urlParent"}]"#);
    }

    #[test]
    fn serde_renames_type() {
        let link = Link::new("self", "u").with_type("application/json");
        let v = serde_json::to_value(&link).unwrap();
        assert_eq!(v, json!({"rel": "self", "href": "u", "type": "application/json"}));
    }
}
