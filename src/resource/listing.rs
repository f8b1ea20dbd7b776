//! Listing abstraction
//!
//! The collectors only see [`ListingClient`]; transport and authentication live
//! behind it. Pagination is driven either eagerly ([`fetch_all`], any failure is
//! returned) or item by item through [`Paginator`].

use super::registry::KindDef;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;

/// One page of a listing call
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_token: Option<String>,
}

impl Page {
    /// Build a page from a raw API response
    pub fn from_response(response: &Value, response_path: &str) -> Self {
        let next_token = response
            .get("nextPageToken")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        Self {
            items: extract_items(response, response_path),
            next_token,
        }
    }
}

/// Paginated listing of resources
#[async_trait]
pub trait ListingClient: Send + Sync {
    /// List one page of `kind` under `scope`
    async fn list(&self, kind: &KindDef, scope: &str, page_token: Option<&str>) -> Result<Page>;

    /// List every child of `kind` owned by `parent_id` under `scope`
    async fn list_children(&self, kind: &KindDef, scope: &str, parent_id: &str)
        -> Result<Vec<Value>>;
}

/// Extract the item array from a response using a dot-separated path
pub fn extract_items(response: &Value, path: &str) -> Vec<Value> {
    if path.is_empty() {
        return response.as_array().cloned().unwrap_or_default();
    }

    let mut current = response;
    for part in path.split('.') {
        current = match current.get(part) {
            Some(v) => v,
            None => return vec![],
        };
    }

    current.as_array().cloned().unwrap_or_default()
}

/// Fetch every page of `kind`, failing on the first error
pub async fn fetch_all(
    client: &dyn ListingClient,
    kind: &KindDef,
    scope: &str,
) -> Result<Vec<Value>> {
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = client.list(kind, scope, page_token.as_deref()).await?;
        all_items.extend(page.items);

        if page.next_token.is_none() {
            break;
        }
        page_token = page.next_token;
    }

    Ok(all_items)
}

/// Outcome of one [`Paginator::next`] call
#[derive(Debug)]
pub enum PageItem {
    Item(Value),
    /// No more items; every later call returns this too
    Exhausted,
    /// A page could not be fetched
    Error(anyhow::Error),
}

/// Item-at-a-time iteration over a paginated listing
///
/// A failed page fetch is reported once as [`PageItem::Error`]; since there is
/// no cursor left to resume from, the paginator is exhausted afterwards.
pub struct Paginator<'a> {
    client: &'a dyn ListingClient,
    kind: &'a KindDef,
    scope: &'a str,
    buffer: VecDeque<Value>,
    next_token: Option<String>,
    done: bool,
    pages: usize,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a dyn ListingClient, kind: &'a KindDef, scope: &'a str) -> Self {
        Self {
            client,
            kind,
            scope,
            buffer: VecDeque::new(),
            next_token: None,
            done: false,
            pages: 0,
        }
    }

    /// Number of pages fetched so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub async fn next(&mut self) -> PageItem {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return PageItem::Item(item);
            }
            if self.done {
                return PageItem::Exhausted;
            }

            match self
                .client
                .list(self.kind, self.scope, self.next_token.as_deref())
                .await
            {
                Ok(page) => {
                    self.pages += 1;
                    self.buffer.extend(page.items);
                    self.next_token = page.next_token;
                    if self.next_token.is_none() {
                        self.done = true;
                    }
                },
                Err(e) => {
                    self.done = true;
                    return PageItem::Error(e);
                },
            }
        }
    }
}
