//! Schema-to-table generator.
//!
//! Turns a versioned protocol schema into flat database table definitions,
//! classifying every field as normal/new/modified/deprecated against the
//! previous protocol version. Field statuses are pure functions of the two
//! versions and are recomputed on every call; nothing here caches them.

pub mod adapter;
pub mod diff;
pub mod tables;

pub use adapter::{
    BlockSource, SimplifiedBlock, SimplifiedMetadata, SimplifiedValidation, convert_simplified,
    normalize,
};
pub use diff::{classify_block, deprecated_fields, generate_fields};
pub use tables::{VISIT_OPTIONS, generate_tables};
