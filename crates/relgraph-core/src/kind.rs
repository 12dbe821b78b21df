//! Resource kinds and the kind registry.
//!
//! A [`ResourceKind`] plays the part of a concrete domain type: it names the
//! fields the kind merges from the server and how each one is merged, the
//! relationships walked by transitive hydration, the relationships hydrated
//! after an up-walk, and an optional post-hydration hook. Relationship
//! descriptors refer to kinds by name; the [`KindRegistry`] resolves those
//! names when a descriptor is processed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{GraphError, GraphResult};
use crate::relationship::Relationship;
use crate::resource::Resource;

/// Names of the built-in kinds.
pub mod kinds {
    /// Schema-less resource: every incoming field is merged.
    pub const RESOURCE: &str = "resource";
    pub const FORM: &str = "form";
    pub const CREATE_FORM: &str = "create-form";
    pub const EDIT_FORM: &str = "edit-form";
    pub const SEARCH_FORM: &str = "search-form";
}

/// How one field of an incoming representation is merged into a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Copy when present; keep the local value when absent.
    #[default]
    Overwrite,
    /// Copy when present; remove the local value when absent.
    Replace,
    /// Never taken from the server.
    Ignore,
}

/// Post-hydration hook, called once per node.
pub type HydratedHook = Arc<dyn Fn(&Resource) + Send + Sync>;

pub struct ResourceKind {
    name: String,
    fields: Vec<(String, MergeStrategy)>,
    unknown_fields: MergeStrategy,
    transitive: Option<Vec<Relationship>>,
    up: Vec<Relationship>,
    on_hydrated: Option<HydratedHook>,
}

impl ResourceKind {
    /// A kind with no declared fields; undeclared fields are overwritten.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            unknown_fields: MergeStrategy::Overwrite,
            transitive: None,
            up: Vec::new(),
            on_hydrated: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, strategy: MergeStrategy) -> Self {
        let name = name.into();
        self.fields.retain(|(n, _)| *n != name);
        self.fields.push((name, strategy));
        self
    }

    /// Strategy applied to fields not declared with [`ResourceKind::field`].
    pub fn unknown_fields(mut self, strategy: MergeStrategy) -> Self {
        self.unknown_fields = strategy;
        self
    }

    /// Give the kind a transitive-hydration capability over these relationships.
    pub fn transitive(mut self, relationships: Vec<Relationship>) -> Self {
        self.transitive = Some(relationships);
        self
    }

    /// Relationships hydrated on a node of this kind after it is reached
    /// through an up-walk.
    pub fn hydrate_up(mut self, relationships: Vec<Relationship>) -> Self {
        self.up = relationships;
        self
    }

    pub fn on_hydrated(mut self, hook: impl Fn(&Resource) + Send + Sync + 'static) -> Self {
        self.on_hydrated = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy_for(&self, field: &str) -> MergeStrategy {
        self.fields
            .iter()
            .find(|(n, _)| n == field)
            .map(|(_, s)| *s)
            .unwrap_or(self.unknown_fields)
    }

    pub fn unknown_strategy(&self) -> MergeStrategy {
        self.unknown_fields
    }

    pub fn declared_fields(&self) -> impl Iterator<Item = (&str, MergeStrategy)> {
        self.fields.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn is_transitive(&self) -> bool {
        self.transitive.is_some()
    }

    pub fn transitive_relationships(&self) -> &[Relationship] {
        self.transitive.as_deref().unwrap_or(&[])
    }

    pub fn up_relationships(&self) -> &[Relationship] {
        &self.up
    }

    pub(crate) fn hook(&self) -> Option<&HydratedHook> {
        self.on_hydrated.as_ref()
    }
}

impl fmt::Debug for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceKind")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("unknown_fields", &self.unknown_fields)
            .field("transitive", &self.transitive)
            .field("up", &self.up)
            .field("has_hook", &self.on_hydrated.is_some())
            .finish()
    }
}

fn form_kind(name: &str) -> ResourceKind {
    ResourceKind::new(name).field("items", MergeStrategy::Replace)
}

/// Registry mapping kind names to kinds.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    kinds: HashMap<String, Arc<ResourceKind>>,
}

impl KindRegistry {
    /// A registry holding the built-in resource and form kinds.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(ResourceKind::new(kinds::RESOURCE));
        for name in [
            kinds::FORM,
            kinds::CREATE_FORM,
            kinds::EDIT_FORM,
            kinds::SEARCH_FORM,
        ] {
            registry.register(form_kind(name));
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Register a kind, replacing any kind of the same name.
    pub fn register(&mut self, kind: ResourceKind) -> Arc<ResourceKind> {
        let kind = Arc::new(kind);
        self.kinds.insert(kind.name().to_string(), Arc::clone(&kind));
        kind
    }

    pub fn with(mut self, kind: ResourceKind) -> Self {
        self.register(kind);
        self
    }

    pub fn get(&self, name: &str) -> GraphResult<Arc<ResourceKind>> {
        self.kinds
            .get(name)
            .cloned()
            .ok_or_else(|| GraphError::UnknownKind(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Registered kind names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.kinds.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_registered() {
        let r = KindRegistry::new();
        assert_eq!(
            r.names(),
            vec!["create-form", "edit-form", "form", "resource", "search-form"]
        );
        assert_eq!(r.get(kinds::EDIT_FORM).unwrap().strategy_for("items"), MergeStrategy::Replace);
    }

    #[test]
    fn unknown_kind_errors() {
        let err = KindRegistry::new().get("supplier").unwrap_err();
        assert!(matches!(err, GraphError::UnknownKind(ref n) if n == "supplier"));
    }

    #[test]
    fn strategies_fall_back_to_unknown() {
        let kind = ResourceKind::new("supplier")
            .field("name", MergeStrategy::Replace)
            .field("draft", MergeStrategy::Ignore)
            .unknown_fields(MergeStrategy::Ignore);
        assert_eq!(kind.strategy_for("name"), MergeStrategy::Replace);
        assert_eq!(kind.strategy_for("draft"), MergeStrategy::Ignore);
        assert_eq!(kind.strategy_for("other"), MergeStrategy::Ignore);
    }

    #[test]
    fn redeclaring_a_field_replaces_it() {
        let kind = ResourceKind::new("k")
            .field("a", MergeStrategy::Ignore)
            .field("a", MergeStrategy::Replace);
        let fields: Vec<_> = kind.declared_fields().collect();
        assert_eq!(fields, vec![("a", MergeStrategy::Replace)]);
    }

    #[test]
    fn transitive_capability() {
        let plain = ResourceKind::new("plain");
        assert!(!plain.is_transitive());
        assert!(plain.transitive_relationships().is_empty());

        let deep = ResourceKind::new("deep")
            .transitive(vec![Relationship::to_one("other", "deep")]);
        assert!(deep.is_transitive());
        assert_eq!(deep.transitive_relationships().len(), 1);
    }

    #[test]
    fn register_replaces_same_name() {
        let mut r = KindRegistry::empty();
        r.register(ResourceKind::new("a"));
        r.register(ResourceKind::new("a").unknown_fields(MergeStrategy::Ignore));
        assert_eq!(r.len(), 1);
        assert_eq!(r.get("a").unwrap().strategy_for("x"), MergeStrategy::Ignore);
    }
}
