//! Resource Registry - Load family and policy definitions from JSON
//!
//! Families and kind policies are defined in embedded JSON, parsed once and
//! never changed afterwards. Adding a family with the same shape as an
//! existing one needs no code changes beyond a dispatch entry.

use super::policy::{IdScheme, KindPolicy, PolicyTable};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Embedded family definitions (compiled into the binary)
const REGISTRY_JSON: &str = include_str!("../resources/families.json");

/// How listing failures inside a family are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingMode {
    /// Any failed call aborts the family (primary resources)
    #[default]
    Strict,
    /// Failed pages and undecodable items are logged and skipped (supplementary resources)
    Lenient,
}

/// One listable resource kind, optionally owning child kinds
#[derive(Debug, Clone, Deserialize)]
pub struct KindDef {
    pub kind: String,
    /// Listing method understood by the `ListingClient`
    pub method: String,
    /// Dot-separated path of the item array in a response page
    pub response_path: String,
    /// Item field holding the local name
    #[serde(default = "default_name_field")]
    pub name_field: String,
    #[serde(default)]
    pub children: Vec<KindDef>,
}

fn default_name_field() -> String {
    "name".to_string()
}

/// A family of related kinds discovered by one collector
#[derive(Debug, Clone, Deserialize)]
pub struct FamilyDef {
    pub display_name: String,
    #[serde(default)]
    pub listing: ListingMode,
    /// Families that must be discovered before this one when both are requested
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub kinds: Vec<KindDef>,
}

/// Root structure of resources/families.json
#[derive(Debug, Clone, Deserialize)]
struct RegistryConfig {
    #[serde(default)]
    families: BTreeMap<String, FamilyDef>,
    #[serde(default)]
    policies: HashMap<String, KindPolicy>,
}

/// Parsed and validated registry
#[derive(Debug, Clone)]
pub struct Registry {
    pub families: BTreeMap<String, FamilyDef>,
    pub policies: PolicyTable,
}

impl Registry {
    /// Parse and validate a registry document
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: RegistryConfig = serde_json::from_str(content)?;
        let registry = Self {
            families: config.families,
            policies: PolicyTable::new(config.policies),
        };
        registry.validate()?;
        Ok(registry)
    }

    pub fn family(&self, key: &str) -> Option<&FamilyDef> {
        self.families.get(key)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (key, family) in &self.families {
            if family.kinds.is_empty() {
                anyhow::bail!("family '{}' defines no kinds", key);
            }
            for dep in &family.depends_on {
                if !self.families.contains_key(dep) {
                    anyhow::bail!("family '{}' depends on unknown family '{}'", key, dep);
                }
            }
            for kind in &family.kinds {
                if family.listing == ListingMode::Lenient && !kind.children.is_empty() {
                    anyhow::bail!(
                        "lenient family '{}' cannot nest children under {}",
                        key,
                        kind.kind
                    );
                }
                self.validate_children(key, kind)?;
            }
        }
        Ok(())
    }

    fn validate_children(&self, family: &str, kind: &KindDef) -> anyhow::Result<()> {
        for child in &kind.children {
            // Child ids must embed the parent id
            if self.policies.get(&child.kind).id_scheme != IdScheme::ParentScoped {
                anyhow::bail!(
                    "child kind {} of family '{}' must use the parent_scoped id scheme",
                    child.kind,
                    family
                );
            }
            self.validate_children(family, child)?;
        }
        Ok(())
    }
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Get the family registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        Registry::from_json(REGISTRY_JSON)
            .unwrap_or_else(|e| panic!("Failed to load embedded family registry: {}", e))
    })
}

/// Get a family definition by key
pub fn get_family(key: &str) -> Option<&'static FamilyDef> {
    get_registry().family(key)
}

/// Get all family keys, sorted
pub fn get_all_family_keys() -> Vec<&'static str> {
    get_registry().families.keys().map(|s| s.as_str()).collect()
}

/// Get the kind policy table
pub fn get_policies() -> &'static PolicyTable {
    &get_registry().policies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(!registry.families.is_empty(), "Registry should have families");
    }

    #[test]
    fn test_cloudsql_family() {
        let family = get_family("cloudsql").expect("cloudsql family should exist");
        assert_eq!(family.listing, ListingMode::Strict);
        assert_eq!(family.kinds.len(), 1);

        let instances = &family.kinds[0];
        assert_eq!(instances.kind, "google_sql_database_instance");
        assert_eq!(instances.children.len(), 1);
        assert_eq!(instances.children[0].kind, "google_sql_database");
    }

    #[test]
    fn test_monitoring_family_is_flat_and_lenient() {
        let family = get_family("monitoring").expect("monitoring family should exist");
        assert_eq!(family.listing, ListingMode::Lenient);
        assert!(family.kinds.iter().all(|k| k.children.is_empty()));
    }

    #[test]
    fn test_get_all_family_keys() {
        assert_eq!(get_all_family_keys(), vec!["cloudsql", "monitoring"]);
    }

    #[test]
    fn test_monitoring_policies_inject_name() {
        let policy = get_policies().get("google_monitoring_uptime_check_config");
        assert_eq!(policy.id_attributes, vec!["name".to_string()]);
    }

    #[test]
    fn test_rejects_lenient_children() {
        let json = r#"{
            "families": {"f": {"display_name": "F", "listing": "lenient", "kinds": [
                {"kind": "a", "method": "m", "response_path": "items",
                 "children": [{"kind": "b", "method": "m2", "response_path": "items"}]}
            ]}},
            "policies": {"b": {"id_scheme": "parent_scoped"}}
        }"#;
        assert!(Registry::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_flat_child_policy() {
        let json = r#"{
            "families": {"f": {"display_name": "F", "kinds": [
                {"kind": "a", "method": "m", "response_path": "items",
                 "children": [{"kind": "b", "method": "m2", "response_path": "items"}]}
            ]}}
        }"#;
        let err = Registry::from_json(json).unwrap_err();
        assert!(err.to_string().contains("parent_scoped"));
    }

    #[test]
    fn test_rejects_unknown_dependency() {
        let json = r#"{
            "families": {"f": {"display_name": "F", "depends_on": ["nope"], "kinds": [
                {"kind": "a", "method": "m", "response_path": "items"}
            ]}}
        }"#;
        assert!(Registry::from_json(json).is_err());
    }
}
