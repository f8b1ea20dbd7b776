//! Resource discovery and normalization
//!
//! Families of related GCP resource kinds are described in embedded JSON, so a
//! new family with the same shape as an existing one needs no new pipeline.
//!
//! # Architecture
//!
//! - [`registry`] - Loads family and kind policy definitions from embedded JSON
//! - [`policy`] - Per-kind field handling and identifier composition
//! - [`record`] - The normalized record handed to the emitter
//! - [`listing`] - Listing client abstraction and pagination
//! - [`dispatch`] - Listing client implementation over the GCP REST APIs
//! - [`collector`] - Fetch-and-normalize algorithm for one family
//! - [`engine`] - Runs collectors and applies the ignore-key pass
//!
//! # Example
//!
//! ```ignore
//! use gcpimport::gcp::client::GcpClient;
//! use gcpimport::resource::{get_registry, DiscoveryConfig, DiscoveryEngine};
//!
//! async fn discover(client: &GcpClient) -> anyhow::Result<()> {
//!     let engine = DiscoveryEngine::new(get_registry());
//!     let records = engine.discover(client, &DiscoveryConfig::new("my-project")).await?;
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod listing;
pub mod policy;
pub mod record;
pub mod registry;
pub mod testing;

pub use collector::Collector;
pub use engine::{strip_ignored, DiscoveryConfig, DiscoveryEngine, Scheduling, DEFAULT_IGNORE_KEYS};
pub use error::DiscoveryError;
pub use listing::{fetch_all, ListingClient, Page, PageItem, Paginator};
pub use policy::{IdScheme, KindPolicy, PolicyTable};
pub use record::{ResourceRecord, PROVIDER};
pub use registry::*;
