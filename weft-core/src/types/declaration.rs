//! Declarations and the markers attached to them.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// What kind of source construct a declaration names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    Type,
    Property,
    Method,
}

/// A single discovered declaration.
///
/// Identity is the fully qualified `name`: namespaces separated by `\`,
/// members of a type suffixed as `Type::member`. A declaration is never
/// mutated in place; re-scanning a file replaces its entries wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Fully qualified name, globally unique within a run.
    pub name: String,
    pub kind: DeclKind,
    /// File the declaration originates from.
    pub file: PathBuf,
    /// Modification time of `file` at collection, milliseconds since epoch.
    pub mtime_ms: i64,
}

impl Declaration {
    /// The owning type's name for a member declaration, or the name itself
    /// for a type declaration.
    pub fn type_name(&self) -> &str {
        match self.name.split_once("::") {
            Some((ty, _)) => ty,
            None => &self.name,
        }
    }

    /// True if this declaration is a member (`Type::member`) of `type_name`.
    pub fn is_member_of(&self, type_name: &str) -> bool {
        self.name
            .strip_prefix(type_name)
            .is_some_and(|rest| rest.starts_with("::"))
    }
}

/// A declarative tag attached to a declaration, with its ordered
/// construction arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    /// Key/value construction arguments in declaration order.
    pub args: Vec<(String, String)>,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Look up a construction argument by key.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Extract a file modification time as milliseconds since the epoch.
/// Pre-epoch or unreadable times collapse to 0.
pub fn mtime_millis(mtime: SystemTime) -> i64 {
    match mtime.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, kind: DeclKind) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind,
            file: PathBuf::from("a.src"),
            mtime_ms: 0,
        }
    }

    #[test]
    fn type_name_strips_member_suffix() {
        let d = decl("App\\Service\\Foo::fetch", DeclKind::Method);
        assert_eq!(d.type_name(), "App\\Service\\Foo");
        let t = decl("App\\Service\\Foo", DeclKind::Type);
        assert_eq!(t.type_name(), "App\\Service\\Foo");
    }

    #[test]
    fn member_check_requires_separator() {
        let d = decl("App\\Foo::fetch", DeclKind::Method);
        assert!(d.is_member_of("App\\Foo"));
        assert!(!d.is_member_of("App\\Fo"));
    }

    #[test]
    fn marker_arg_lookup() {
        let m = Marker {
            name: "Cached".to_string(),
            args: vec![("ttl".to_string(), "300".to_string())],
        };
        assert_eq!(m.arg("ttl"), Some("300"));
        assert_eq!(m.arg("level"), None);
    }
}
