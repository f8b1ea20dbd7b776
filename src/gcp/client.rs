//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication
//! and HTTP functionality.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;

const SQLADMIN_ENDPOINT: &str = "https://sqladmin.googleapis.com";
const MONITORING_ENDPOINT: &str = "https://monitoring.googleapis.com";

/// Base URLs of the APIs the client talks to
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub sqladmin: String,
    pub monitoring: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            sqladmin: SQLADMIN_ENDPOINT.to_string(),
            monitoring: MONITORING_ENDPOINT.to_string(),
        }
    }
}

impl Endpoints {
    /// Route every API to the same base URL (mock servers)
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            sqladmin: base.clone(),
            monitoring: base,
        }
    }
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub endpoints: Endpoints,
}

impl GcpClient {
    /// Create a new GCP client using Application Default Credentials
    pub async fn new() -> Result<Self> {
        let credentials = GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?;

        Self::with_credentials(credentials, Endpoints::default())
    }

    /// Create a client from already-resolved credentials
    pub fn with_credentials(credentials: GcpCredentials, endpoints: Endpoints) -> Result<Self> {
        let http = GcpHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            endpoints,
        })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    // =========================================================================
    // Cloud SQL Admin API helpers
    // =========================================================================

    /// Build Cloud SQL Admin API URL
    pub fn sqladmin_url(&self, project: &str, path: &str) -> String {
        format!(
            "{}/sql/v1beta4/projects/{}/{}",
            self.endpoints.sqladmin,
            urlencoding::encode(project),
            path
        )
    }

    /// Build the databases URL of one Cloud SQL instance
    pub fn sqladmin_databases_url(&self, project: &str, instance: &str) -> String {
        self.sqladmin_url(
            project,
            &format!("instances/{}/databases", urlencoding::encode(instance)),
        )
    }

    // =========================================================================
    // Cloud Monitoring API helpers
    // =========================================================================

    /// Build Cloud Monitoring API URL
    pub fn monitoring_url(&self, project: &str, resource: &str) -> String {
        format!(
            "{}/v3/projects/{}/{}",
            self.endpoints.monitoring,
            urlencoding::encode(project),
            resource
        )
    }
}

/// Format a GCP API error for display
pub fn format_gcp_error(error: &anyhow::Error) -> String {
    super::http::format_gcp_error(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GcpClient {
        GcpClient::with_credentials(
            GcpCredentials::from_static_token("t"),
            Endpoints::single("http://localhost:9000/"),
        )
        .unwrap()
    }

    #[test]
    fn test_sqladmin_urls() {
        let client = client();
        assert_eq!(
            client.sqladmin_url("my-project", "instances"),
            "http://localhost:9000/sql/v1beta4/projects/my-project/instances"
        );
        assert_eq!(
            client.sqladmin_databases_url("my-project", "db1"),
            "http://localhost:9000/sql/v1beta4/projects/my-project/instances/db1/databases"
        );
    }

    #[test]
    fn test_monitoring_url() {
        let client = client();
        assert_eq!(
            client.monitoring_url("my-project", "uptimeCheckConfigs"),
            "http://localhost:9000/v3/projects/my-project/uptimeCheckConfigs"
        );
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.sqladmin, "https://sqladmin.googleapis.com");
        assert_eq!(endpoints.monitoring, "https://monitoring.googleapis.com");
    }
}
