//! In-memory listing client for tests
//!
//! Serves canned pages keyed by listing method. Lookups are stateless, so the
//! same fake answers repeated discovery runs identically.

use super::listing::{ListingClient, Page};
use super::registry::KindDef;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned [`ListingClient`]; `None` entries answer with an error
#[derive(Default)]
pub struct FakeListing {
    pages: HashMap<String, Vec<Option<Page>>>,
    children: HashMap<(String, String), Option<Vec<Value>>>,
    calls: AtomicUsize,
}

fn named(names: &[&str]) -> Vec<Value> {
    names.iter().map(|n| json!({ "name": n })).collect()
}

impl FakeListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page of items named `names`, continued by `next` if set
    pub fn with_page(self, method: &str, names: &[&str], next: Option<&str>) -> Self {
        self.with_raw_page(method, named(names), next)
    }

    pub fn with_raw_page(mut self, method: &str, items: Vec<Value>, next: Option<&str>) -> Self {
        self.pages.entry(method.to_string()).or_default().push(Some(Page {
            items,
            next_token: next.map(str::to_string),
        }));
        self
    }

    /// Append a page that fails to load
    pub fn with_failing_page(mut self, method: &str) -> Self {
        self.pages.entry(method.to_string()).or_default().push(None);
        self
    }

    pub fn with_children(mut self, method: &str, parent: &str, names: &[&str]) -> Self {
        self.children
            .insert((method.to_string(), parent.to_string()), Some(named(names)));
        self
    }

    pub fn with_failing_children(mut self, method: &str, parent: &str) -> Self {
        self.children
            .insert((method.to_string(), parent.to_string()), None);
        self
    }

    /// Number of listing calls served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingClient for FakeListing {
    async fn list(&self, kind: &KindDef, _scope: &str, page_token: Option<&str>) -> Result<Page> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let Some(pages) = self.pages.get(&kind.method) else {
            return Ok(Page::default());
        };

        // The page after the one whose continuation token was handed back
        let index = match page_token {
            None => 0,
            Some(token) => {
                pages
                    .iter()
                    .position(|p| {
                        p.as_ref()
                            .and_then(|p| p.next_token.as_deref())
                            .is_some_and(|t| t == token)
                    })
                    .ok_or_else(|| anyhow::anyhow!("unknown page token {}", token))?
                    + 1
            },
        };

        match pages.get(index) {
            Some(Some(page)) => Ok(page.clone()),
            Some(None) => Err(anyhow::anyhow!("API request failed: 503 Service Unavailable")),
            None => Ok(Page::default()),
        }
    }

    async fn list_children(
        &self,
        kind: &KindDef,
        _scope: &str,
        parent_id: &str,
    ) -> Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self
            .children
            .get(&(kind.method.clone(), parent_id.to_string()))
        {
            Some(Some(items)) => Ok(items.clone()),
            Some(None) => Err(anyhow::anyhow!("API request failed: 403 Forbidden")),
            None => Ok(vec![]),
        }
    }
}
