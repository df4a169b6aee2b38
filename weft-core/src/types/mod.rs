//! Shared data model: declarations, markers, aspect rules, weave sets.

pub mod aspect;
pub mod collections;
pub mod declaration;
pub mod weave;

pub use aspect::{AspectRegistry, AspectRule, RuleSource};
pub use declaration::{DeclKind, Declaration, Marker};
pub use weave::WeaveSet;
