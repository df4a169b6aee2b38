//! Scanner subsystem: root walking, marker introspection, and the
//! coordinating pipeline with cross-process scan ownership.

pub mod coordinator;
pub mod introspect;
pub mod types;
pub mod walker;

pub use coordinator::ScanCoordinator;
pub use introspect::{Introspector, RawDecl, TextIntrospector};
pub use types::{DiscoveredFile, ScanOutput, ScanStats};
pub use walker::FileWalker;
