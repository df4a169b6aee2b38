//! Core types, errors, configuration, and the metadata store for Weft.
//!
//! Weft incrementally discovers declarative markers across a source tree,
//! matches aspect rules against the discovered declarations, and caches
//! generated proxy artifacts so repeated runs only redo what changed.
//! This crate holds everything the engine and cache layers share.

pub mod config;
pub mod errors;
pub mod metadata;
pub mod telemetry;
pub mod types;
