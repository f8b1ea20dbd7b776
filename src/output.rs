//! Record output
//!
//! Serializes the final record set for the emitter.

use crate::resource::ResourceRecord;
use anyhow::{Context, Result};
use clap::ValueEnum;

/// Serialization format of the record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Render records in the requested format
pub fn render(records: &[ResourceRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(records).context("Failed to serialize records as JSON")
        },
        OutputFormat::Yaml => {
            serde_yaml::to_string(records).context("Failed to serialize records as YAML")
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{KindPolicy, PROVIDER};
    use std::collections::BTreeMap;

    fn records() -> Vec<ResourceRecord> {
        vec![ResourceRecord::new(
            "db1:users",
            "db1-users",
            "google_sql_database",
            PROVIDER,
            BTreeMap::new(),
            &KindPolicy::default(),
        )
        .unwrap()]
    }

    #[test]
    fn test_render_json() {
        let out = render(&records(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["durable_id"], "db1:users");
        assert_eq!(value[0]["display_name"], "db1-users");
        assert_eq!(value[0]["provider"], "google");
    }

    #[test]
    fn test_render_yaml() {
        let out = render(&records(), OutputFormat::Yaml).unwrap();
        assert!(out.contains("display_name: db1-users"));
        assert!(out.contains("kind: google_sql_database"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[], OutputFormat::Json).unwrap(), "[]");
    }
}
