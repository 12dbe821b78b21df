//! Domain nodes.
//!
//! A [`Resource`] is the unit of the graph: its links, its hydration state,
//! the fields merged from the server according to its [`ResourceKind`], and
//! the relations attached to it by the engine. Resources are always held in
//! an [`Arc`] and mutated in place, so every holder of a cached node sees
//! the effect of one hydration.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use relgraph_types::{links_from_value, Link};
use serde_json::{Map, Value};
use tracing::warn;

use crate::capability::{Attachable, HydrationState, Hydratable, Identified, Relation};
use crate::engine::Rest;
use crate::error::{GraphError, GraphResult};
use crate::form::FormData;
use crate::kind::{MergeStrategy, ResourceKind};

pub type ResourceRef = Arc<Resource>;

#[derive(Default)]
struct ResourceState {
    links: Vec<Link>,
    hydration: HydrationState,
    fields: Map<String, Value>,
    relations: BTreeMap<String, Relation>,
    feed_title: Option<String>,
    dirty: bool,
    hook_fired: bool,
    transitive_done: bool,
}

pub struct Resource {
    kind: Arc<ResourceKind>,
    rest: Weak<Rest>,
    me: Weak<Resource>,
    state: RwLock<ResourceState>,
}

impl Resource {
    /// A standalone node, not owned by any engine.
    pub fn new(kind: Arc<ResourceKind>, links: Vec<Link>) -> ResourceRef {
        Self::bound(kind, links, Weak::new())
    }

    pub(crate) fn bound(
        kind: Arc<ResourceKind>,
        links: Vec<Link>,
        rest: Weak<Rest>,
    ) -> ResourceRef {
        Arc::new_cyclic(|me| Self {
            kind,
            rest,
            me: me.clone(),
            state: RwLock::new(ResourceState {
                links,
                ..Default::default()
            }),
        })
    }

    pub fn kind(&self) -> &Arc<ResourceKind> {
        &self.kind
    }

    /// The engine owning this node.
    pub fn rest(&self) -> GraphResult<Arc<Rest>> {
        self.rest
            .upgrade()
            .ok_or_else(|| GraphError::Unbound(self.describe()))
    }

    pub fn add_link(&self, rel: impl Into<String>, href: impl Into<String>) -> &Self {
        self.state
            .write()
            .expect("lock poisoned")
            .links
            .push(Link::new(rel, href));
        self
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.state.read().expect("lock poisoned").fields.get(name).cloned()
    }

    /// Set a field locally. Does not mark the node dirty.
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.state
            .write()
            .expect("lock poisoned")
            .fields
            .insert(name.into(), value.into());
    }

    pub fn remove_field(&self, name: &str) -> Option<Value> {
        self.state.write().expect("lock poisoned").fields.remove(name)
    }

    pub fn fields(&self) -> Map<String, Value> {
        self.state.read().expect("lock poisoned").fields.clone()
    }

    /// Title the node was listed under in the feed that introduced it.
    pub fn feed_title(&self) -> Option<String> {
        self.state.read().expect("lock poisoned").feed_title.clone()
    }

    pub fn set_feed_title(&self, title: Option<String>) {
        self.state.write().expect("lock poisoned").feed_title = title;
    }

    pub fn is_dirty(&self) -> bool {
        self.state.read().expect("lock poisoned").dirty
    }

    pub fn mark_dirty(&self) {
        self.state.write().expect("lock poisoned").dirty = true;
    }

    pub(crate) fn clear_dirty(&self) {
        self.state.write().expect("lock poisoned").dirty = false;
    }

    pub fn has_completed_transitive_hydration(&self) -> bool {
        self.state.read().expect("lock poisoned").transitive_done
    }

    /// Mark transitive hydration as done; returns whether it already was.
    pub(crate) fn mark_transitive_done(&self) -> bool {
        let mut state = self.state.write().expect("lock poisoned");
        std::mem::replace(&mut state.transitive_done, true)
    }

    /// Related node attached under `name`.
    pub fn related(&self, name: &str) -> Option<ResourceRef> {
        self.attached_resource(name)
    }

    /// Names of every attached relation, sorted.
    pub fn relation_names(&self) -> Vec<String> {
        self.state
            .read()
            .expect("lock poisoned")
            .relations
            .keys()
            .cloned()
            .collect()
    }

    /// Plain field map of the named fields, in the order given.
    ///
    /// Absent fields are submitted as `null` and logged.
    pub fn project_fields<S: AsRef<str>>(&self, names: &[S]) -> FormData {
        let state = self.state.read().expect("lock poisoned");
        let mut data = FormData::new();
        let mut missing = Vec::new();
        for name in names {
            let name = name.as_ref();
            let value = state.fields.get(name).cloned().unwrap_or(Value::Null);
            if value.is_null() {
                missing.push(name.to_string());
            }
            data.insert(name, value);
        }
        drop(state);
        if !missing.is_empty() {
            warn!(node = %self.describe(), ?missing, "projected fields are missing");
        }
        data
    }

    /// Drop every attached relation, releasing attached collections too.
    pub(crate) fn release_relations(&self) {
        let relations = {
            let mut state = self.state.write().expect("lock poisoned");
            std::mem::take(&mut state.relations)
        };
        for relation in relations.into_values() {
            if let Relation::Many(collection) = relation {
                collection.release();
            }
        }
    }

    fn fire_hydrated_hook(&self) {
        let Some(hook) = self.kind.hook() else {
            return;
        };
        let already = {
            let mut state = self.state.write().expect("lock poisoned");
            std::mem::replace(&mut state.hook_fired, true)
        };
        if !already {
            hook(self);
        }
    }
}

fn merge_field(
    fields: &mut Map<String, Value>,
    remote: &Map<String, Value>,
    name: &str,
    strategy: MergeStrategy,
) {
    match (strategy, remote.get(name)) {
        (MergeStrategy::Ignore, _) => {}
        (_, Some(value)) => {
            fields.insert(name.to_string(), value.clone());
        }
        (MergeStrategy::Replace, None) => {
            fields.remove(name);
        }
        (MergeStrategy::Overwrite, None) => {}
    }
}

impl Identified for Resource {
    fn links(&self) -> Vec<Link> {
        self.state.read().expect("lock poisoned").links.clone()
    }

    fn describe(&self) -> String {
        match self.identity(true) {
            Ok(Some(url)) => url,
            _ => format!("{} object", self.kind.name()),
        }
    }

    fn as_resource(&self) -> Option<ResourceRef> {
        self.me.upgrade()
    }
}

impl Hydratable for Resource {
    fn hydration_state(&self) -> HydrationState {
        self.state.read().expect("lock poisoned").hydration
    }

    fn set_hydrated(&self) {
        self.state.write().expect("lock poisoned").hydration = HydrationState::Hydrated;
    }

    fn replace_links(&self, links: Vec<Link>) {
        self.state.write().expect("lock poisoned").links = links;
    }

    /// Fields are merged per the kind's schema; `links` is replaced wholesale
    /// when present. Fires the kind's hook on the first hydration.
    fn merge(&self, remote: &Value) -> GraphResult<()> {
        let Value::Object(remote_fields) = remote else {
            return Err(GraphError::Malformed(format!(
                "representation of {} is not an object: {remote}",
                self.describe()
            )));
        };
        let links = links_from_value(remote)?;
        {
            let mut state = self.state.write().expect("lock poisoned");
            if let Some(links) = links {
                state.links = links;
            }
            for (name, strategy) in self.kind.declared_fields() {
                merge_field(&mut state.fields, remote_fields, name, strategy);
            }
            let declared = |name: &str| self.kind.declared_fields().any(|(n, _)| n == name);
            let mut undeclared: Vec<String> = remote_fields
                .keys()
                .filter(|k| k.as_str() != "links" && !declared(k.as_str()))
                .cloned()
                .collect();
            let unknown = self.kind.unknown_strategy();
            if unknown == MergeStrategy::Replace {
                undeclared.extend(
                    state
                        .fields
                        .keys()
                        .filter(|k| {
                            !declared(k.as_str()) && !remote_fields.contains_key(k.as_str())
                        })
                        .cloned(),
                );
            }
            for name in undeclared {
                merge_field(&mut state.fields, remote_fields, &name, unknown);
            }
            state.hydration = HydrationState::Hydrated;
        }
        self.fire_hydrated_hook();
        Ok(())
    }
}

impl Attachable for Resource {
    fn attached(&self, name: &str) -> Option<Relation> {
        self.state.read().expect("lock poisoned").relations.get(name).cloned()
    }

    fn attach(&self, name: &str, relation: Relation) {
        self.state
            .write()
            .expect("lock poisoned")
            .relations
            .insert(name.to_string(), relation);
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().expect("lock poisoned");
        f.debug_struct("Resource")
            .field("kind", &self.kind.name())
            .field("links", &state.links)
            .field("hydration", &state.hydration)
            .field("fields", &state.fields)
            .field("relations", &state.relations.keys().collect::<Vec<_>>())
            .field("dirty", &state.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relgraph_types::{make_links_from, RelPattern};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn plain(url: &str) -> ResourceRef {
        Resource::new(Arc::new(ResourceKind::new("resource")), make_links_from(url))
    }

    #[test]
    fn identity_from_self_or_canonical() {
        let r = plain("url1");
        assert_eq!(r.url().unwrap(), "url1");

        let canonical = Resource::new(
            Arc::new(ResourceKind::new("resource")),
            vec![Link::new("canonical", "url2")],
        );
        assert_eq!(canonical.identity(false).unwrap(), Some("url2".into()));
    }

    #[test]
    fn missing_identity_optional_and_required() {
        let r = Resource::new(Arc::new(ResourceKind::new("supplier")), vec![]);
        assert_eq!(r.identity(true).unwrap(), None);
        assert!(matches!(r.identity(false), Err(GraphError::MissingLink { .. })));
        assert_eq!(r.describe(), "supplier object");
    }

    #[test]
    fn link_lookup_takes_first_match() {
        let r = plain("url1");
        r.add_link("child", "c1").add_link("child", "c2");
        assert_eq!(r.link(&RelPattern::new("child"), false).unwrap(), Some("c1".into()));
        assert_eq!(r.link(&RelPattern::new("other"), true).unwrap(), None);
        let err = r.link(&RelPattern::new("other"), false).unwrap_err();
        assert!(err.to_string().contains("'other'"));
    }

    #[test]
    fn router_path_strips_host() {
        let r = plain("http://localhost:3000/supplier/1");
        assert_eq!(r.router_path().unwrap(), "/supplier/1");
    }

    #[test]
    fn merge_overwrites_and_keeps_absent_fields() {
        let r = plain("url1");
        r.set_field("local", "kept");
        r.merge(&json!({"links": [{"rel": "self", "href": "url1"}], "name": "a"}))
            .unwrap();
        assert!(r.is_hydrated());
        assert_eq!(r.field("name"), Some(json!("a")));
        assert_eq!(r.field("local"), Some(json!("kept")));
        assert_eq!(r.field("links"), None);
    }

    #[test]
    fn merge_is_idempotent() {
        let r = plain("url1");
        let body = json!({"links": [{"rel": "self", "href": "url1"}], "name": "a", "n": 3});
        r.merge(&body).unwrap();
        let once = (r.links(), r.fields(), r.hydration_state());
        r.merge(&body).unwrap();
        assert_eq!((r.links(), r.fields(), r.hydration_state()), once);
    }

    #[test]
    fn merge_applies_schema() {
        let kind = ResourceKind::new("supplier")
            .field("name", MergeStrategy::Replace)
            .field("draft", MergeStrategy::Ignore)
            .unknown_fields(MergeStrategy::Ignore);
        let r = Resource::new(Arc::new(kind), make_links_from("u"));
        r.set_field("name", "old");
        r.set_field("draft", "mine");
        r.merge(&json!({"draft": "theirs", "extra": 1})).unwrap();
        assert_eq!(r.field("name"), None);
        assert_eq!(r.field("draft"), Some(json!("mine")));
        assert_eq!(r.field("extra"), None);
    }

    #[test]
    fn replace_unknown_fields_drops_stale_ones() {
        let kind = ResourceKind::new("k").unknown_fields(MergeStrategy::Replace);
        let r = Resource::new(Arc::new(kind), make_links_from("u"));
        r.merge(&json!({"a": 1, "b": 2})).unwrap();
        r.merge(&json!({"a": 3})).unwrap();
        assert_eq!(r.field("a"), Some(json!(3)));
        assert_eq!(r.field("b"), None);
    }

    #[test]
    fn merge_rejects_non_objects() {
        let r = plain("u");
        assert!(matches!(r.merge(&json!([1])), Err(GraphError::Malformed(_))));
        assert!(!r.is_hydrated());
    }

    #[test]
    fn hook_fires_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let kind = ResourceKind::new("k").on_hydrated(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let r = Resource::new(Arc::new(kind), make_links_from("u"));
        r.merge(&json!({})).unwrap();
        r.merge(&json!({})).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn project_fields_keeps_order_and_nulls_missing() {
        let r = plain("u");
        r.set_field("b", 2);
        r.set_field("a", 1);
        let data = r.project_fields(&["a", "missing", "b"]);
        let keys: Vec<&str> = data.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "missing", "b"]);
        assert_eq!(data.get("missing"), Some(&Value::Null));
    }

    #[test]
    fn dirty_and_transitive_flags() {
        let r = plain("u");
        assert!(!r.is_dirty());
        r.mark_dirty();
        assert!(r.is_dirty());
        r.clear_dirty();
        assert!(!r.is_dirty());

        assert!(!r.mark_transitive_done());
        assert!(r.mark_transitive_done());
        assert!(r.has_completed_transitive_hydration());
    }

    #[test]
    fn as_resource_returns_same_instance() {
        let r = plain("u");
        assert!(Arc::ptr_eq(&r.as_resource().unwrap(), &r));
    }

    #[test]
    fn unbound_resource_has_no_engine() {
        let r = plain("u");
        assert!(matches!(r.rest(), Err(GraphError::Unbound(ref n)) if n == "u"));
    }
}
