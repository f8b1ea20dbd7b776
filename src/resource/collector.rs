//! Collector
//!
//! Discovers and normalizes every resource of one family. Strict families fail
//! on the first listing error; lenient families log and skip what they cannot
//! read.

use super::error::DiscoveryError;
use super::listing::{fetch_all, ListingClient, PageItem, Paginator};
use super::policy::PolicyTable;
use super::record::{ResourceRecord, PROVIDER};
use super::registry::{FamilyDef, KindDef, ListingMode};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

/// Fetch-and-normalize driver for one resource family
pub struct Collector<'a> {
    key: &'a str,
    family: &'a FamilyDef,
    policies: &'a PolicyTable,
}

impl<'a> Collector<'a> {
    pub fn new(key: &'a str, family: &'a FamilyDef, policies: &'a PolicyTable) -> Self {
        Self {
            key,
            family,
            policies,
        }
    }

    pub fn key(&self) -> &str {
        self.key
    }

    /// Discover every record of the family under `scope`
    ///
    /// Records come back in discovery order, each parent directly followed by
    /// its children.
    pub async fn collect(
        &self,
        client: &dyn ListingClient,
        scope: &str,
    ) -> Result<Vec<ResourceRecord>, DiscoveryError> {
        let records = match self.family.listing {
            ListingMode::Strict => self.collect_strict(client, scope).await?,
            ListingMode::Lenient => self.collect_lenient(client, scope).await,
        };

        tracing::info!(
            "{}: discovered {} records",
            self.family.display_name,
            records.len()
        );
        Ok(records)
    }

    async fn collect_strict(
        &self,
        client: &dyn ListingClient,
        scope: &str,
    ) -> Result<Vec<ResourceRecord>, DiscoveryError> {
        let mut records = Vec::new();

        for kind in &self.family.kinds {
            let items = fetch_all(client, kind, scope)
                .await
                .map_err(|source| self.listing_error(kind, source))?;

            for item in &items {
                let record = self.normalize(kind, None, item)?;
                let parent_id = record.durable_id().to_string();
                records.push(record);
                self.collect_children(client, scope, kind, parent_id, &mut records)
                    .await?;
            }
        }

        Ok(records)
    }

    fn collect_children<'b>(
        &'b self,
        client: &'b dyn ListingClient,
        scope: &'b str,
        parent: &'b KindDef,
        parent_id: String,
        records: &'b mut Vec<ResourceRecord>,
    ) -> BoxFuture<'b, Result<(), DiscoveryError>> {
        async move {
            for child in &parent.children {
                let items = client
                    .list_children(child, scope, &parent_id)
                    .await
                    .map_err(|source| self.listing_error(child, source))?;

                for item in &items {
                    let record = self.normalize(child, Some(&parent_id), item)?;
                    let child_id = record.durable_id().to_string();
                    records.push(record);
                    self.collect_children(client, scope, child, child_id, records)
                        .await?;
                }
            }
            Ok(())
        }
        .boxed()
    }

    async fn collect_lenient(&self, client: &dyn ListingClient, scope: &str) -> Vec<ResourceRecord> {
        let mut records = Vec::new();

        for kind in &self.family.kinds {
            let mut paginator = Paginator::new(client, kind, scope);
            let mut skipped = 0usize;

            loop {
                match paginator.next().await {
                    PageItem::Item(item) => match self.normalize(kind, None, &item) {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            tracing::warn!("Skipping {} item: {}", kind.kind, e);
                            skipped += 1;
                        },
                    },
                    PageItem::Exhausted => break,
                    PageItem::Error(e) => {
                        tracing::warn!(
                            "Error listing {} (page {}): {:#}",
                            kind.kind,
                            paginator.pages() + 1,
                            e
                        );
                        skipped += 1;
                    },
                }
            }

            if skipped > 0 {
                tracing::warn!("{}: {} listing errors skipped", kind.kind, skipped);
            }
        }

        records
    }

    /// Turn one listed item into a record
    fn normalize(
        &self,
        kind: &KindDef,
        parent_id: Option<&str>,
        item: &Value,
    ) -> Result<ResourceRecord, DiscoveryError> {
        let local = item
            .get(&kind.name_field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| self.invalid_item(kind, format!("missing '{}' field", kind.name_field)))?;

        let policy = self.policies.get(&kind.kind);
        let identity = policy.id_scheme.compose(parent_id, local);
        let attributes = policy.attributes_for(&identity.durable_id);

        ResourceRecord::new(
            identity.durable_id,
            identity.display_name,
            kind.kind.as_str(),
            PROVIDER,
            attributes,
            policy,
        )
        .map_err(|e| self.invalid_item(kind, e.to_string()))
    }

    fn listing_error(&self, kind: &KindDef, source: anyhow::Error) -> DiscoveryError {
        DiscoveryError::Listing {
            family: self.key.to_string(),
            kind: kind.kind.clone(),
            source,
        }
    }

    fn invalid_item(&self, kind: &KindDef, reason: String) -> DiscoveryError {
        DiscoveryError::InvalidItem {
            family: self.key.to_string(),
            kind: kind.kind.clone(),
            reason,
        }
    }
}
