//! Persistence layer for Weft.
//!
//! Owns everything that survives a process: the consolidated cache
//! snapshot, the smaller aspect-rule-name blob, the cross-process scan
//! lease, and the proxy artifact cache. All persisted blobs follow the
//! same discipline: full overwrite, write-then-atomic-rename, and corrupt
//! state is treated as absent rather than fatal.

pub mod lease;
pub mod proxy;
pub mod rules_cache;
pub mod snapshot;

pub use lease::{LeaseGuard, ScanLease};
pub use proxy::{ProxyCache, ProxyGenerator, ProxyRecord, StubGenerator};
pub use rules_cache::RuleNameCache;
pub use snapshot::{CacheSnapshot, SnapshotStore, SNAPSHOT_VERSION};
