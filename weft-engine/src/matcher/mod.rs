//! Aspect matching: rule patterns against collected declarations.

pub mod pattern;
pub mod resolver;

pub use pattern::NamePattern;
pub use resolver::resolve;
