//! Storage for captured records, protocols, and statistical manifests.
//!
//! Repositories are written against the [`KeyValueStore`] trait rather
//! than any concrete backend; production uses [`DirStore`], tests use
//! [`MemoryStore`].

pub mod error;
pub mod kv;
pub mod manifests;
pub mod protocols;
pub mod records;

pub use error::{Result, StoreError};
pub use kv::{DirStore, KeyValueStore, MemoryStore};
pub use manifests::{MANIFESTS_KEY, ManifestStore};
pub use protocols::{PROTOCOLS_KEY, ProtocolStore};
pub use records::{RECORDS_KEY, RecordInput, RecordStore, SaveOutcome, StorageStats};
