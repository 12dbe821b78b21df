//! Descriptor-driven hydration and transitive walks.

use std::sync::Arc;

use futures_util::future::{try_join_all, BoxFuture, FutureExt};
use relgraph_http::Cancellable;

use super::Rest;
use crate::capability::Attachable;
use crate::collection::Collection;
use crate::error::{GraphError, GraphResult};
use crate::options::{ChildOptions, CollectionOptions, HydrateOptions, RelationshipOptions};
use crate::relationship::{Cardinality, Relationship, RelationshipSpec};
use crate::resource::ResourceRef;

impl Rest {
    /// Hydrate `node`, then every relationship concurrently.
    ///
    /// The first failure fails the whole call. With `transitive`, each
    /// resolved relation is walked further through its kind's transitive
    /// relationships.
    pub fn hydrate_relationships<'a, P>(
        &'a self,
        node: &'a P,
        relationships: &'a [Relationship],
        options: &'a RelationshipOptions,
    ) -> BoxFuture<'a, GraphResult<()>>
    where
        P: Attachable + ?Sized,
    {
        async move {
            let hydrate = HydrateOptions {
                reload_resource: false,
                cancellable: options.cancellable.clone(),
            };
            self.hydrate(node, &hydrate).await?;
            try_join_all(
                relationships
                    .iter()
                    .map(|relationship| self.hydrate_relationship(node, relationship, options)),
            )
            .await?;
            Ok(())
        }
        .boxed()
    }

    /// [`Rest::hydrate_relationships`] over wire-shaped descriptors.
    ///
    /// Every descriptor is validated before anything is fetched.
    pub async fn hydrate_relationship_specs<P>(
        &self,
        node: &P,
        specs: &[RelationshipSpec],
        options: &RelationshipOptions,
    ) -> GraphResult<()>
    where
        P: Attachable + ?Sized,
    {
        let relationships = specs
            .iter()
            .map(|spec| {
                spec.resolve().ok_or_else(|| GraphError::InvalidRelationship {
                    descriptor: spec.to_string(),
                    node: node.describe(),
                })
            })
            .collect::<GraphResult<Vec<_>>>()?;
        self.hydrate_relationships(node, &relationships, options).await
    }

    async fn hydrate_relationship<P>(
        &self,
        node: &P,
        relationship: &Relationship,
        options: &RelationshipOptions,
    ) -> GraphResult<()>
    where
        P: Attachable + ?Sized,
    {
        let invalid = || GraphError::InvalidRelationship {
            descriptor: relationship.to_string(),
            node: node.describe(),
        };
        if relationship.name.is_empty() || !self.kinds.contains(&relationship.kind) {
            return Err(invalid());
        }
        let pattern = relationship.pattern();

        match relationship.cardinality {
            Cardinality::ToMany => {
                let parent = node.as_resource().ok_or_else(invalid)?;
                let collection_options = CollectionOptions {
                    optional: relationship.optional,
                    also_hydrate_children: options.also_hydrate_children,
                    reload_feed: options.reload_feed,
                    cancellable: options.cancellable.clone(),
                };
                let collection = self
                    .hydrate_collection(
                        &parent,
                        &relationship.name,
                        &pattern,
                        &relationship.kind,
                        &collection_options,
                    )
                    .await?;
                if options.transitive {
                    self.hydrate_transitively_elements_of(&collection, options.cancellable.clone())
                        .await?;
                }
            }
            Cardinality::ToOne => {
                let child_options = ChildOptions {
                    optional: relationship.optional,
                    reload_resource: options.reload_resource,
                    cancellable: options.cancellable.clone(),
                };
                let child = self
                    .hydrate_child(
                        node,
                        &relationship.name,
                        &pattern,
                        &relationship.kind,
                        &child_options,
                    )
                    .await?;
                if let (true, Some(child)) = (options.transitive, child) {
                    self.hydrate_transitively(child, options.cancellable.clone())
                        .await?;
                }
            }
            Cardinality::UpToOne => {
                let child = node.as_resource().ok_or_else(invalid)?;
                let owner = self
                    .hydrate_up_through_feed(&child, relationship, options.cancellable.as_ref())
                    .await?;
                let kind = Arc::clone(owner.kind());
                let up_options = RelationshipOptions {
                    cancellable: options.cancellable.clone(),
                    ..Default::default()
                };
                self.hydrate_relationships(&*owner, kind.up_relationships(), &up_options)
                    .await?;
            }
        }
        Ok(())
    }

    /// Transitively hydrate every member of `collection` not already done.
    ///
    /// Members are marked done before recursing, so cycles terminate.
    pub fn hydrate_transitively_elements_of<'a>(
        &'a self,
        collection: &'a Collection,
        cancellable: Option<Cancellable>,
    ) -> BoxFuture<'a, GraphResult<()>> {
        async move {
            let items = collection.items();
            try_join_all(
                items
                    .into_iter()
                    .map(|item| self.hydrate_transitively(item, cancellable.clone())),
            )
            .await?;
            Ok(())
        }
        .boxed()
    }

    /// Hydrate the transitive relationships of `node`'s kind, once.
    pub fn hydrate_transitively(
        &self,
        node: ResourceRef,
        cancellable: Option<Cancellable>,
    ) -> BoxFuture<'_, GraphResult<()>> {
        async move {
            let kind = Arc::clone(node.kind());
            if !kind.is_transitive() || node.mark_transitive_done() {
                return Ok(());
            }
            let options = RelationshipOptions {
                transitive: true,
                cancellable,
                ..Default::default()
            };
            self.hydrate_relationships(&*node, kind.transitive_relationships(), &options)
                .await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Hydratable;
    use crate::fixtures::{body, linked, setup, setup_with, stub_feed};
    use crate::kind::{KindRegistry, ResourceKind};
    use crate::resource::Resource;
    use relgraph_http::HttpMethod;
    use relgraph_types::make_links_from;
    use serde_json::json;

    #[tokio::test]
    async fn hydrates_node_then_each_relationship() {
        let (http, rest) = setup();
        http.respond_json(
            "supplier/1",
            &linked(
                &[("self", "supplier/1"), ("services", "services"), ("contact", "contact/1")],
                json!({}),
            ),
        );
        http.respond_json("services", &stub_feed(&[("self", "services")], &[("svc/1", "One")]));
        http.respond_json("contact/1", &body("contact/1", json!({"email": "a@b"})));
        let supplier = rest.resource("resource", make_links_from("supplier/1")).unwrap();

        let relationships = vec![
            Relationship::to_many("services", "resource"),
            Relationship::to_one("contact", "resource"),
            Relationship::to_one("logo", "resource").as_optional(),
        ];
        rest.hydrate_relationships(&*supplier, &relationships, &RelationshipOptions::default())
            .await
            .unwrap();

        assert!(supplier.is_hydrated());
        assert_eq!(supplier.attached_collection("services").unwrap().len(), 1);
        assert_eq!(supplier.related("contact").unwrap().field("email"), Some(json!("a@b")));
        assert!(supplier.related("logo").is_none());
    }

    #[tokio::test]
    async fn first_failure_fails_the_join() {
        let (http, rest) = setup();
        http.respond_json("p", &linked(&[("self", "p"), ("a", "a")], json!({})));
        let parent = rest.resource("resource", make_links_from("p")).unwrap();
        let relationships = vec![Relationship::to_one("a", "resource")];

        let err = rest
            .hydrate_relationships(&*parent, &relationships, &RelationshipOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), GraphError::Transport(relgraph_http::HttpError::Status {
            method: HttpMethod::Get,
            url: "a".into(),
            status: 404,
            status_text: "Not Found".into(),
        }).to_string());
    }

    #[tokio::test]
    async fn unknown_kind_is_an_invalid_relationship() {
        let (http, rest) = setup();
        http.respond_json("p", &body("p", json!({})));
        let parent = rest.resource("resource", make_links_from("p")).unwrap();
        let relationships = vec![Relationship::to_one("a", "nope")];

        let err = rest
            .hydrate_relationships(&*parent, &relationships, &RelationshipOptions::default())
            .await
            .unwrap_err();

        match err {
            GraphError::InvalidRelationship { descriptor, node } => {
                assert!(descriptor.contains("name: a"));
                assert_eq!(node, "p");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn spec_without_cardinality_is_rejected_before_fetching() {
        let (http, rest) = setup();
        let parent = rest.resource("resource", make_links_from("p")).unwrap();
        let specs = vec![RelationshipSpec {
            name: "a".into(),
            make: "resource".into(),
            ..Default::default()
        }];

        let err = rest
            .hydrate_relationship_specs(&*parent, &specs, &RelationshipOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GraphError::InvalidRelationship { ref node, .. } if node == "p"));
        assert_eq!(http.total_calls(), 0);
    }

    #[tokio::test]
    async fn specs_resolve_and_hydrate() {
        let (http, rest) = setup();
        http.respond_json("p", &linked(&[("self", "p"), ("owner", "o")], json!({})));
        http.respond_json("o", &body("o", json!({})));
        let parent = rest.resource("resource", make_links_from("p")).unwrap();
        let raw = json!([{"name": "owner", "toOne": true, "make": "resource"}]);
        let specs: Vec<RelationshipSpec> = serde_json::from_value(raw).unwrap();

        rest.hydrate_relationship_specs(&*parent, &specs, &RelationshipOptions::default())
            .await
            .unwrap();

        assert!(parent.related("owner").unwrap().is_hydrated());
    }

    #[tokio::test]
    async fn to_many_on_a_collection_is_invalid() {
        let (_, rest) = setup();
        let kind = rest.kinds().get("resource").unwrap();
        let collection = Collection::new(kind, make_links_from("c"));
        collection.set_hydrated();
        let relationships = vec![Relationship::to_many("x", "resource")];

        let err = rest
            .hydrate_relationships(&*collection, &relationships, &RelationshipOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GraphError::InvalidRelationship { .. }));
    }

    fn cyclic_kinds() -> KindRegistry {
        KindRegistry::new().with(
            ResourceKind::new("node").transitive(vec![Relationship::to_one("other", "node")]),
        )
    }

    #[tokio::test]
    async fn transitive_walk_over_a_cycle_visits_each_node_once() {
        let (http, rest) = setup_with(cyclic_kinds());
        http.respond_json("nodes", &stub_feed(&[("self", "nodes")], &[("a", "A"), ("b", "B")]));
        http.respond_json("a", &linked(&[("self", "a"), ("other", "b")], json!({})));
        http.respond_json("b", &linked(&[("self", "b"), ("other", "a")], json!({})));
        http.respond_json("root", &linked(&[("self", "root"), ("nodes", "nodes")], json!({})));
        let root = rest.resource("resource", make_links_from("root")).unwrap();

        let relationships = vec![Relationship::to_many("nodes", "node")];
        rest.hydrate_relationships(&*root, &relationships, &RelationshipOptions::transitive())
            .await
            .unwrap();

        assert_eq!(http.call_count(HttpMethod::Get, "a"), 1);
        assert_eq!(http.call_count(HttpMethod::Get, "b"), 1);
        let nodes = root.attached_collection("nodes").unwrap();
        for node in nodes.items() {
            assert!(node.has_completed_transitive_hydration());
            assert!(node.is_hydrated());
        }
        let a = rest.cached("a").unwrap();
        let b = rest.cached("b").unwrap();
        assert!(Arc::ptr_eq(&a.related("other").unwrap(), &b));
        assert!(Arc::ptr_eq(&b.related("other").unwrap(), &a));
    }

    #[tokio::test]
    async fn transitive_walk_skips_nodes_without_the_capability() {
        let (http, rest) = setup();
        let kind = rest.kinds().get("resource").unwrap();
        let collection = Collection::new(Arc::clone(&kind), vec![]);
        collection.add_item(Resource::new(kind, make_links_from("x")));

        rest.hydrate_transitively_elements_of(&collection, None)
            .await
            .unwrap();

        assert!(!collection.items()[0].has_completed_transitive_hydration());
        assert_eq!(http.total_calls(), 0);
    }

    #[tokio::test]
    async fn transitive_to_one_follows_chain() {
        let kinds = KindRegistry::new().with(
            ResourceKind::new("link")
                .transitive(vec![Relationship::to_one("next", "link").as_optional()]),
        );
        let (http, rest) = setup_with(kinds);
        http.respond_json("l1", &linked(&[("self", "l1"), ("next", "l2")], json!({})));
        http.respond_json("l2", &linked(&[("self", "l2"), ("next", "l3")], json!({})));
        http.respond_json("l3", &body("l3", json!({})));
        let start = rest.hydrate_from_url("l1", "link").await.unwrap();

        rest.hydrate_transitively(Arc::clone(&start), None).await.unwrap();

        let l3 = start.related("next").unwrap().related("next").unwrap();
        assert!(l3.is_hydrated());
        assert!(l3.has_completed_transitive_hydration());
    }

    #[tokio::test]
    async fn up_to_one_runs_owner_up_relationships() {
        let kinds = KindRegistry::new().with(
            ResourceKind::new("supplier")
                .hydrate_up(vec![Relationship::to_one("contact", "resource")]),
        );
        let (http, rest) = setup_with(kinds);
        http.respond_json("svc/1", &linked(&[("self", "svc/1"), ("up", "services")], json!({})));
        http.respond_json(
            "services",
            &stub_feed(&[("self", "services"), ("up", "supplier/1")], &[("svc/1", "")]),
        );
        http.respond_json(
            "supplier/1",
            &linked(&[("self", "supplier/1"), ("contact", "contact/1")], json!({})),
        );
        http.respond_json("contact/1", &body("contact/1", json!({})));
        let service = rest.resource("resource", make_links_from("svc/1")).unwrap();

        let relationships =
            vec![Relationship::up_to_one("supplier", "supplier").with_relation("up")];
        rest.hydrate_relationships(&*service, &relationships, &RelationshipOptions::default())
            .await
            .unwrap();

        let supplier = service.related("supplier").unwrap();
        assert_eq!(supplier.kind().name(), "supplier");
        assert!(supplier.related("contact").unwrap().is_hydrated());
    }
}
