//! Kind policies
//!
//! Per-kind field handling: which fields may be empty downstream, which fields
//! are merged into every record, and how identifiers are composed.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Joins a parent durable id and a child's local name
pub const CHILD_ID_SEPARATOR: &str = ":";

/// Joins a parent durable id and a child's local name in display names
pub const CHILD_DISPLAY_SEPARATOR: &str = "-";

/// How a kind's identifiers are derived from the listed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScheme {
    /// The item's own name is both durable id and display name
    #[default]
    Flat,
    /// Composed from the parent's durable id and the item's local name
    ParentScoped,
}

/// Identifiers of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub durable_id: String,
    pub display_name: String,
}

impl IdScheme {
    /// Compose the identity of an item named `local`, listed under `parent` if any
    pub fn compose(self, parent: Option<&str>, local: &str) -> Identity {
        match (self, parent) {
            (IdScheme::ParentScoped, Some(parent)) => Identity {
                durable_id: format!("{}{}{}", parent, CHILD_ID_SEPARATOR, local),
                display_name: format!("{}{}{}", parent, CHILD_DISPLAY_SEPARATOR, local),
            },
            _ => Identity {
                durable_id: local.to_string(),
                display_name: local.to_string(),
            },
        }
    }
}

/// Field handling for one resource kind
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct KindPolicy {
    #[serde(default)]
    pub allow_empty_fields: BTreeSet<String>,
    #[serde(default)]
    pub additional_fields: BTreeMap<String, String>,
    #[serde(default)]
    pub id_scheme: IdScheme,
    /// Attribute keys that receive the record's durable id
    #[serde(default)]
    pub id_attributes: Vec<String>,
}

impl KindPolicy {
    /// Attributes injected into a record at discovery time
    pub fn attributes_for(&self, durable_id: &str) -> BTreeMap<String, String> {
        self.id_attributes
            .iter()
            .map(|key| (key.clone(), durable_id.to_string()))
            .collect()
    }
}

/// Immutable lookup of kind policies
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: HashMap<String, KindPolicy>,
    fallback: KindPolicy,
}

impl PolicyTable {
    pub fn new(policies: HashMap<String, KindPolicy>) -> Self {
        Self {
            policies,
            fallback: KindPolicy::default(),
        }
    }

    /// Policy of `kind`, or the empty flat policy for kinds without an entry
    pub fn get(&self, kind: &str) -> &KindPolicy {
        self.policies.get(kind).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.policies.contains_key(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_identity() {
        let id = IdScheme::Flat.compose(Some("ignored"), "db1");
        assert_eq!(id.durable_id, "db1");
        assert_eq!(id.display_name, "db1");
    }

    #[test]
    fn test_parent_scoped_identity() {
        let id = IdScheme::ParentScoped.compose(Some("db1"), "users");
        assert_eq!(id.durable_id, "db1:users");
        assert_eq!(id.display_name, "db1-users");
    }

    #[test]
    fn test_attributes_for() {
        let policy = KindPolicy {
            id_attributes: vec!["name".to_string()],
            ..KindPolicy::default()
        };
        let attrs = policy.attributes_for("projects/p/notificationChannels/1");
        assert_eq!(
            attrs.get("name").map(String::as_str),
            Some("projects/p/notificationChannels/1")
        );
        assert!(KindPolicy::default().attributes_for("x").is_empty());
    }

    #[test]
    fn test_table_fallback() {
        let mut policies = HashMap::new();
        policies.insert(
            "google_sql_database".to_string(),
            KindPolicy {
                id_scheme: IdScheme::ParentScoped,
                ..KindPolicy::default()
            },
        );
        let table = PolicyTable::new(policies);

        assert_eq!(table.get("google_sql_database").id_scheme, IdScheme::ParentScoped);
        assert!(!table.contains("unknown_kind"));
        assert_eq!(table.get("unknown_kind"), &KindPolicy::default());
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: KindPolicy =
            serde_json::from_str(r#"{"id_scheme": "parent_scoped"}"#).unwrap();
        assert_eq!(policy.id_scheme, IdScheme::ParentScoped);
        assert!(policy.allow_empty_fields.is_empty());
        assert!(policy.id_attributes.is_empty());
    }
}
