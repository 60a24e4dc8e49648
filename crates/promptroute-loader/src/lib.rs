// ABOUTME: Loads markdown profile documents into atomically published snapshots
// ABOUTME: Owns extends resolution, keyword table rebuilds and the metadata registry

pub mod document;
pub mod error;
pub mod extends;
pub mod loader;
pub mod registry;
pub mod snapshot;

pub use document::{extract_checklist, extract_section, parse_document, INSTRUCTIONS_SECTION};
pub use error::*;
pub use extends::{resolve_extends, ExtendsResolution};
pub use loader::{ProfileLoader, ReloadResult};
pub use registry::{MetadataRegistry, MetadataRegistryEntry, RegistrySummary, REGISTRY_SCHEMA_VERSION};
pub use snapshot::{ProfileSnapshot, SnapshotStore};
