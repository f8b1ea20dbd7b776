//! Discovery errors
//!
//! Everything here is fatal for the family it names. Skipped items of lenient
//! families never surface as a `DiscoveryError`; they are only logged.

use thiserror::Error;

/// Errors that abort a discovery run
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A primary listing call (parent or child) failed
    #[error("discovery did not complete for family '{family}': listing {kind} failed: {source:#}")]
    Listing {
        family: String,
        kind: String,
        #[source]
        source: anyhow::Error,
    },

    /// An item of a strict family could not be turned into a record
    #[error("discovery did not complete for family '{family}': invalid {kind} item: {reason}")]
    InvalidItem {
        family: String,
        kind: String,
        reason: String,
    },

    /// The caller asked for a family the registry does not define
    #[error("unknown resource family '{0}'")]
    UnknownFamily(String),

    /// Family dependencies cannot be ordered
    #[error("resource families have a dependency cycle involving '{0}'")]
    DependencyCycle(String),

    /// No project/account was supplied
    #[error("no scope configured for discovery")]
    EmptyScope,
}

impl DiscoveryError {
    /// Family the error belongs to, if any
    pub fn family(&self) -> Option<&str> {
        match self {
            Self::Listing { family, .. } | Self::InvalidItem { family, .. } => Some(family.as_str()),
            Self::UnknownFamily(family) | Self::DependencyCycle(family) => Some(family.as_str()),
            Self::EmptyScope => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_error_message_names_family() {
        let err = DiscoveryError::Listing {
            family: "cloudsql".to_string(),
            kind: "google_sql_database".to_string(),
            source: anyhow::anyhow!("API request failed: 403 Forbidden"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cloudsql"));
        assert!(msg.contains("google_sql_database"));
        assert!(msg.contains("403"));
        assert_eq!(err.family(), Some("cloudsql"));
    }

    #[test]
    fn test_empty_scope_has_no_family() {
        assert_eq!(DiscoveryError::EmptyScope.family(), None);
    }
}
