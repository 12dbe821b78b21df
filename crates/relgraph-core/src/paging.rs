//! Walking a paged collection.

use std::sync::Arc;

use relgraph_http::Cancellable;

use crate::collection::{CollectionRef, Page};
use crate::engine::Rest;
use crate::error::GraphResult;

/// Holds the current page of a collection and moves along its
/// `next`/`previous` links.
#[derive(Debug, Clone)]
pub struct PagingCollection {
    rest: Arc<Rest>,
    current: CollectionRef,
}

impl PagingCollection {
    pub fn new(rest: Arc<Rest>, collection: CollectionRef) -> Self {
        Self {
            rest,
            current: collection,
        }
    }

    pub fn current(&self) -> &CollectionRef {
        &self.current
    }

    /// Move to the next page; `false` when there is none.
    pub async fn next_page(&mut self, cancellable: Option<&Cancellable>) -> GraphResult<bool> {
        self.turn(Page::Next, cancellable).await
    }

    /// Move to the previous page; `false` when there is none.
    pub async fn previous_page(&mut self, cancellable: Option<&Cancellable>) -> GraphResult<bool> {
        self.turn(Page::Previous, cancellable).await
    }

    async fn turn(&mut self, page: Page, cancellable: Option<&Cancellable>) -> GraphResult<bool> {
        match self.rest.hydrate_page(&self.current, page, cancellable).await? {
            Some(target) => {
                self.current = target;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
