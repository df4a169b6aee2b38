//! Proxy artifact cache: regenerate only what went stale, remove orphans.

pub mod cache;
pub mod generator;

pub use cache::{ProxyCache, ProxyRecord};
pub use generator::{ProxyGenerator, StubGenerator};
