//! Marker introspection: turning source text into declarations and
//! markers without instantiating anything.
//!
//! The trait is the seam to a real language frontend. The default
//! implementation reads the line-oriented declaration format used by
//! `.src` fixtures:
//!
//! ```text
//! #[Loggable(level = "info")]
//! class App\Service\Foo
//!     #[Cached(ttl = 300)]
//!     fn fetch
//!     prop repo
//! ```
//!
//! Marker lines apply to the next declaration line; `fn` and `prop` lines
//! belong to the most recent `class` and are identified as
//! `Class::member`.

use std::path::Path;

use tracing::warn;

use weft_core::types::{DeclKind, Marker};

/// A declaration as extracted from one file, before file/mtime stamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDecl {
    pub name: String,
    pub kind: DeclKind,
    pub markers: Vec<Marker>,
}

/// Extracts declarations and their markers from source text.
pub trait Introspector: Send + Sync {
    fn introspect(&self, path: &Path, source: &str) -> Vec<RawDecl>;
}

/// Default introspector for the `.src` declaration format.
#[derive(Debug, Default)]
pub struct TextIntrospector;

impl Introspector for TextIntrospector {
    fn introspect(&self, path: &Path, source: &str) -> Vec<RawDecl> {
        let mut decls = Vec::new();
        let mut pending: Vec<Marker> = Vec::new();
        let mut current_class: Option<String> = None;

        for (lineno, raw_line) in source.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("#[") {
                match parse_marker(line) {
                    Some(marker) => pending.push(marker),
                    None => {
                        warn!(path = %path.display(), line = lineno + 1, "malformed marker, skipping");
                    }
                }
            } else if let Some(name) = line.strip_prefix("class ") {
                let name = name.trim().to_string();
                current_class = Some(name.clone());
                decls.push(RawDecl {
                    name,
                    kind: DeclKind::Type,
                    markers: std::mem::take(&mut pending),
                });
            } else if let Some(member) = line.strip_prefix("fn ") {
                push_member(
                    &mut decls,
                    &current_class,
                    member,
                    DeclKind::Method,
                    &mut pending,
                    path,
                    lineno,
                );
            } else if let Some(member) = line.strip_prefix("prop ") {
                push_member(
                    &mut decls,
                    &current_class,
                    member,
                    DeclKind::Property,
                    &mut pending,
                    path,
                    lineno,
                );
            }
            // Anything else is body text; markers keep pending until a
            // declaration line consumes them.
        }

        decls
    }
}

fn push_member(
    decls: &mut Vec<RawDecl>,
    current_class: &Option<String>,
    member: &str,
    kind: DeclKind,
    pending: &mut Vec<Marker>,
    path: &Path,
    lineno: usize,
) {
    match current_class {
        Some(class) => decls.push(RawDecl {
            name: format!("{class}::{}", member.trim()),
            kind,
            markers: std::mem::take(pending),
        }),
        None => {
            warn!(path = %path.display(), line = lineno + 1, "member outside a class, skipping");
            pending.clear();
        }
    }
}

/// Parse `#[Name]` or `#[Name(k = v, k2 = "v2")]`.
fn parse_marker(line: &str) -> Option<Marker> {
    let inner = line.strip_prefix("#[")?.strip_suffix(']')?;
    let (name, args_src) = match inner.split_once('(') {
        Some((name, rest)) => (name.trim(), Some(rest.strip_suffix(')')?)),
        None => (inner.trim(), None),
    };
    if name.is_empty() {
        return None;
    }

    let mut marker = Marker::new(name);
    if let Some(args_src) = args_src {
        for arg in args_src.split(',') {
            let arg = arg.trim();
            if arg.is_empty() {
                continue;
            }
            let (key, value) = arg.split_once('=')?;
            let value = value.trim().trim_matches('"');
            marker
                .args
                .push((key.trim().to_string(), value.to_string()));
        }
    }
    Some(marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn introspect(source: &str) -> Vec<RawDecl> {
        TextIntrospector.introspect(&PathBuf::from("t.src"), source)
    }

    #[test]
    fn class_with_member_markers() {
        let decls = introspect(
            r#"
#[Loggable(level = "info")]
class App\Service\Foo
    #[Cached(ttl = 300)]
    fn fetch
    prop repo
"#,
        );

        assert_eq!(decls.len(), 3);
        assert_eq!(decls[0].name, "App\\Service\\Foo");
        assert_eq!(decls[0].kind, DeclKind::Type);
        assert_eq!(decls[0].markers[0].name, "Loggable");
        assert_eq!(decls[0].markers[0].arg("level"), Some("info"));

        assert_eq!(decls[1].name, "App\\Service\\Foo::fetch");
        assert_eq!(decls[1].kind, DeclKind::Method);
        assert_eq!(decls[1].markers[0].arg("ttl"), Some("300"));

        assert_eq!(decls[2].name, "App\\Service\\Foo::repo");
        assert_eq!(decls[2].kind, DeclKind::Property);
        assert!(decls[2].markers.is_empty());
    }

    #[test]
    fn multiple_classes_per_file() {
        let decls = introspect("class App\\A\n\nclass App\\B\n    fn run\n");
        assert_eq!(decls.len(), 3);
        assert_eq!(decls[2].name, "App\\B::run");
    }

    #[test]
    fn repeated_arg_keys_are_kept_in_order() {
        let decls = introspect(
            "#[Aspect(classes = \"App\\X\\*\", classes = \"App\\Y\\*\", priority = 5)]\nclass App\\Aspect\\Two\n",
        );
        let args = &decls[0].markers[0].args;
        assert_eq!(
            args,
            &vec![
                ("classes".to_string(), "App\\X\\*".to_string()),
                ("classes".to_string(), "App\\Y\\*".to_string()),
                ("priority".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn member_outside_class_is_dropped() {
        let decls = introspect("fn orphan\nclass App\\A\n");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "App\\A");
    }

    #[test]
    fn malformed_marker_is_skipped() {
        let decls = introspect("#[Broken(\nclass App\\A\n");
        assert_eq!(decls.len(), 1);
        assert!(decls[0].markers.is_empty());
    }
}
