//! Resource records
//!
//! The canonical, provider-agnostic description of one discovered cloud object,
//! handed to the emitter once discovery finishes.

use super::policy::KindPolicy;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Provider tag of every record produced by this crate
pub const PROVIDER: &str = "google";

/// Reasons a record cannot be constructed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("durable id is empty")]
    EmptyId,
    #[error("resource kind is empty")]
    EmptyKind,
    #[error("provider is empty")]
    EmptyProvider,
}

/// One discovered resource
///
/// Fields are private: a record is built once and never changed afterwards.
/// The only derivation is [`ResourceRecord::without_attributes`], which returns
/// a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    durable_id: String,
    display_name: String,
    kind: String,
    provider: String,
    attributes: BTreeMap<String, String>,
    allow_empty_fields: BTreeSet<String>,
    additional_fields: BTreeMap<String, String>,
}

impl ResourceRecord {
    /// Build a record, attaching the kind policy's field lists
    pub fn new(
        durable_id: impl Into<String>,
        display_name: impl Into<String>,
        kind: impl Into<String>,
        provider: impl Into<String>,
        attributes: BTreeMap<String, String>,
        policy: &KindPolicy,
    ) -> Result<Self, RecordError> {
        let durable_id = durable_id.into();
        let kind = kind.into();
        let provider = provider.into();

        if durable_id.is_empty() {
            return Err(RecordError::EmptyId);
        }
        if kind.is_empty() {
            return Err(RecordError::EmptyKind);
        }
        if provider.is_empty() {
            return Err(RecordError::EmptyProvider);
        }

        Ok(Self {
            durable_id,
            display_name: display_name.into(),
            kind,
            provider,
            attributes,
            allow_empty_fields: policy.allow_empty_fields.clone(),
            additional_fields: policy.additional_fields.clone(),
        })
    }

    pub fn durable_id(&self) -> &str {
        &self.durable_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn allow_empty_fields(&self) -> &BTreeSet<String> {
        &self.allow_empty_fields
    }

    pub fn additional_fields(&self) -> &BTreeMap<String, String> {
        &self.additional_fields
    }

    /// Copy of this record with the given attribute keys removed
    pub fn without_attributes(self, keys: &BTreeSet<String>) -> Self {
        if keys.is_empty() {
            return self;
        }
        let attributes = self
            .attributes
            .into_iter()
            .filter(|(key, _)| !keys.contains(key))
            .collect();
        Self { attributes, ..self }
    }
}
