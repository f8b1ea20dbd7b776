//! Discovery engine
//!
//! Runs the collectors of the requested families against one listing client,
//! concatenates their records in family order and strips ignored attribute keys.

use super::collector::Collector;
use super::error::DiscoveryError;
use super::listing::ListingClient;
use super::record::ResourceRecord;
use super::registry::Registry;
use futures::future::try_join_all;
use std::collections::{BTreeSet, HashSet};

/// Attribute keys stripped when nothing else is configured
pub const DEFAULT_IGNORE_KEYS: &[&str] = &["id", "self_link"];

/// How collectors are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheduling {
    /// One family after the other
    #[default]
    Sequential,
    /// All families polled together; the first fatal error drops the rest
    Concurrent,
}

/// Inputs of one discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Project the listing calls are scoped to
    pub scope: String,
    /// Family keys to discover; empty means every registered family
    pub families: Vec<String>,
    pub ignore_keys: BTreeSet<String>,
    pub scheduling: Scheduling,
}

impl DiscoveryConfig {
    pub fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            families: Vec::new(),
            ignore_keys: DEFAULT_IGNORE_KEYS.iter().map(|k| k.to_string()).collect(),
            scheduling: Scheduling::default(),
        }
    }

    pub fn with_families(mut self, families: Vec<String>) -> Self {
        self.families = families;
        self
    }

    pub fn with_ignore_keys(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.ignore_keys = keys.into_iter().collect();
        self
    }

    pub fn with_scheduling(mut self, scheduling: Scheduling) -> Self {
        self.scheduling = scheduling;
        self
    }
}

/// Orchestrates collectors over a family registry
pub struct DiscoveryEngine<'a> {
    registry: &'a Registry,
}

impl<'a> DiscoveryEngine<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Order the requested families so dependencies run first
    ///
    /// Only dependencies that were themselves requested constrain the order;
    /// otherwise the request order is kept.
    pub fn resolve_order(&self, requested: &[String]) -> Result<Vec<&'a str>, DiscoveryError> {
        let mut pending: Vec<&'a str> = Vec::new();
        if requested.is_empty() {
            pending.extend(self.registry.families.keys().map(|k| k.as_str()));
        } else {
            for key in requested {
                let Some((key, _)) = self.registry.families.get_key_value(key.as_str()) else {
                    return Err(DiscoveryError::UnknownFamily(key.clone()));
                };
                if !pending.contains(&key.as_str()) {
                    pending.push(key.as_str());
                }
            }
        }

        let wanted: HashSet<&str> = pending.iter().copied().collect();
        let mut ordered: Vec<&'a str> = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let ready = pending.iter().position(|key| {
                self.registry.families[*key]
                    .depends_on
                    .iter()
                    .filter(|dep| wanted.contains(dep.as_str()))
                    .all(|dep| ordered.contains(&dep.as_str()))
            });

            match ready {
                Some(index) => ordered.push(pending.remove(index)),
                None => return Err(DiscoveryError::DependencyCycle(pending[0].to_string())),
            }
        }

        Ok(ordered)
    }

    /// Discover every requested family under the configured scope
    ///
    /// Any fatal collector error aborts the run; no partial aggregate is
    /// returned in that case.
    pub async fn discover(
        &self,
        client: &dyn ListingClient,
        config: &DiscoveryConfig,
    ) -> Result<Vec<ResourceRecord>, DiscoveryError> {
        if config.scope.trim().is_empty() {
            return Err(DiscoveryError::EmptyScope);
        }

        let order = self.resolve_order(&config.families)?;
        tracing::info!(
            "Discovering {} in {} ({:?})",
            order.join(", "),
            config.scope,
            config.scheduling
        );

        let collectors: Vec<Collector<'_>> = order
            .iter()
            .map(|key| Collector::new(key, &self.registry.families[*key], &self.registry.policies))
            .collect();

        let batches = match config.scheduling {
            Scheduling::Sequential => {
                let mut batches = Vec::with_capacity(collectors.len());
                for collector in &collectors {
                    batches.push(collector.collect(client, &config.scope).await?);
                }
                batches
            },
            Scheduling::Concurrent => {
                try_join_all(
                    collectors
                        .iter()
                        .map(|collector| collector.collect(client, &config.scope)),
                )
                .await?
            },
        };

        let records: Vec<ResourceRecord> = batches.into_iter().flatten().collect();
        tracing::info!("Discovery finished with {} records", records.len());

        Ok(strip_ignored(records, &config.ignore_keys))
    }
}

/// Remove ignored attribute keys from every record
pub fn strip_ignored(records: Vec<ResourceRecord>, keys: &BTreeSet<String>) -> Vec<ResourceRecord> {
    records
        .into_iter()
        .map(|record| record.without_attributes(keys))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::registry::get_registry;
    use crate::resource::testing::FakeListing;

    fn engine() -> DiscoveryEngine<'static> {
        DiscoveryEngine::new(get_registry())
    }

    fn full_project() -> FakeListing {
        FakeListing::new()
            .with_page("list_sql_instances", &["db1"], None)
            .with_children("list_sql_databases", "db1", &["users", "orders"])
            .with_page(
                "list_notification_channels",
                &["projects/p/notificationChannels/1"],
                None,
            )
            .with_page("list_uptime_check_configs", &["projects/p/uptimeCheckConfigs/u"], None)
    }

    #[test]
    fn test_resolve_order_defaults_to_all() {
        let order = engine().resolve_order(&[]).unwrap();
        assert_eq!(order, vec!["cloudsql", "monitoring"]);
    }

    #[test]
    fn test_resolve_order_puts_dependencies_first() {
        let requested = vec!["monitoring".to_string(), "cloudsql".to_string()];
        assert_eq!(
            engine().resolve_order(&requested).unwrap(),
            vec!["cloudsql", "monitoring"]
        );
    }

    #[test]
    fn test_resolve_order_ignores_unrequested_dependencies() {
        let requested = vec!["monitoring".to_string(), "monitoring".to_string()];
        assert_eq!(engine().resolve_order(&requested).unwrap(), vec!["monitoring"]);
    }

    #[test]
    fn test_resolve_order_unknown_family() {
        let err = engine().resolve_order(&["spanner".to_string()]).unwrap_err();
        assert!(matches!(err, DiscoveryError::UnknownFamily(ref f) if f == "spanner"));
    }

    #[test]
    fn test_resolve_order_detects_cycle() {
        let registry = Registry::from_json(
            r#"{"families": {
                "a": {"display_name": "A", "depends_on": ["b"], "kinds": [{"kind": "x", "method": "m", "response_path": "items"}]},
                "b": {"display_name": "B", "depends_on": ["a"], "kinds": [{"kind": "y", "method": "m", "response_path": "items"}]}
            }}"#,
        )
        .unwrap();
        let err = DiscoveryEngine::new(&registry).resolve_order(&[]).unwrap_err();
        assert!(matches!(err, DiscoveryError::DependencyCycle(_)));
    }

    #[tokio::test]
    async fn test_discover_all_families() {
        let client = full_project();
        let config = DiscoveryConfig::new("my-project");

        let records = engine().discover(&client, &config).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.durable_id()).collect();
        assert_eq!(
            ids,
            vec![
                "db1",
                "db1:users",
                "db1:orders",
                "projects/p/notificationChannels/1",
                "projects/p/uptimeCheckConfigs/u",
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let client = full_project();
        let sequential = DiscoveryConfig::new("my-project");
        let concurrent = DiscoveryConfig::new("my-project").with_scheduling(Scheduling::Concurrent);

        let a = engine().discover(&client, &sequential).await.unwrap();
        let b = engine().discover(&client, &concurrent).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_ignore_keys_are_stripped() {
        let client = full_project();
        let config = DiscoveryConfig::new("my-project").with_ignore_keys(vec!["name".to_string()]);

        let records = engine().discover(&client, &config).await.unwrap();
        assert!(records.iter().all(|r| !r.attributes().contains_key("name")));
    }

    #[tokio::test]
    async fn test_fatal_error_returns_no_records() {
        let client = FakeListing::new()
            .with_failing_page("list_sql_instances")
            .with_page("list_notification_channels", &["c1"], None);

        for scheduling in [Scheduling::Sequential, Scheduling::Concurrent] {
            let config = DiscoveryConfig::new("my-project").with_scheduling(scheduling);
            let err = engine().discover(&client, &config).await.unwrap_err();
            assert_eq!(err.family(), Some("cloudsql"));
        }
    }

    #[tokio::test]
    async fn test_lenient_failure_keeps_run_successful() {
        let client = FakeListing::new()
            .with_page("list_sql_instances", &["db1"], None)
            .with_failing_page("list_notification_channels")
            .with_page("list_uptime_check_configs", &["u1"], None);

        let records = engine()
            .discover(&client, &DiscoveryConfig::new("my-project"))
            .await
            .unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.durable_id()).collect();
        assert_eq!(ids, vec!["db1", "u1"]);
    }

    #[tokio::test]
    async fn test_empty_scope_is_rejected() {
        let client = FakeListing::new();
        let err = engine()
            .discover(&client, &DiscoveryConfig::new("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::EmptyScope));
        assert_eq!(client.calls(), 0);
    }
}
