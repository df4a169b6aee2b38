//! Configuration system for Weft.
//! TOML-based, layered resolution: env > deployment override > project > defaults.

pub mod rule_sources;
pub mod weft_config;

pub use rule_sources::{load_rules, AspectDecl};
pub use weft_config::{CacheSection, ScanSection, WeftConfig};
