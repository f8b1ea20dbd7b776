//! Listing dispatch
//!
//! Maps the listing method names used in the family registry to concrete GCP
//! REST calls.

use super::listing::{extract_items, ListingClient, Page};
use super::registry::KindDef;
use crate::gcp::client::GcpClient;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
impl ListingClient for GcpClient {
    async fn list(&self, kind: &KindDef, scope: &str, page_token: Option<&str>) -> Result<Page> {
        tracing::debug!("list: kind={}, method={}, scope={}", kind.kind, kind.method, scope);

        let url = match kind.method.as_str() {
            "list_sql_instances" => self.sqladmin_url(scope, "instances"),
            "list_notification_channels" => self.monitoring_url(scope, "notificationChannels"),
            "list_uptime_check_configs" => self.monitoring_url(scope, "uptimeCheckConfigs"),
            _ => return Err(anyhow::anyhow!("Unknown listing method: {}", kind.method)),
        };
        let url = add_page_token(&url, page_token);

        let response = self.get(&url).await?;
        Ok(Page::from_response(&response, &kind.response_path))
    }

    async fn list_children(
        &self,
        kind: &KindDef,
        scope: &str,
        parent_id: &str,
    ) -> Result<Vec<Value>> {
        tracing::debug!(
            "list_children: kind={}, method={}, parent={}",
            kind.kind,
            kind.method,
            parent_id
        );

        let url = match kind.method.as_str() {
            "list_sql_databases" => self.sqladmin_databases_url(scope, parent_id),
            _ => return Err(anyhow::anyhow!("Unknown child listing method: {}", kind.method)),
        };

        let response = self.get(&url).await?;
        Ok(extract_items(&response, &kind.response_path))
    }
}

fn add_page_token(url: &str, page_token: Option<&str>) -> String {
    let Some(token) = page_token else {
        return url.to_string();
    };

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}pageToken={}", url, separator, urlencoding::encode(token))
}
