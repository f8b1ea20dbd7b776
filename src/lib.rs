//! gcpimport
//!
//! Discovers live GCP resources and normalizes them into records an
//! infrastructure-as-code emitter can turn into definitions and import state.

pub mod config;
pub mod gcp;
pub mod output;
pub mod resource;

/// Version injected at compile time via GCPIMPORT_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GCPIMPORT_VERSION") {
    Some(v) => v,
    None => "dev",
};
