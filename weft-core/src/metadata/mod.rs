//! Process-wide storage of collected declaration facts.

pub mod store;

pub use store::{DeclEntry, MetadataStore};
