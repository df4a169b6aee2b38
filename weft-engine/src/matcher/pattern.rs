//! Glob-style name patterns: `*` matches any run of characters, anything
//! else is a literal, case-sensitive, anchored at both ends.

use regex::Regex;
use tracing::warn;

enum Kind {
    Literal,
    Wildcard(Regex),
}

/// A compiled target-name pattern.
///
/// An optional `::member` suffix is stripped before compilation; rules
/// may point at a method (`App\Foo::fetch`) but matching is always
/// against the bare type name.
pub struct NamePattern {
    bare: String,
    kind: Kind,
}

impl NamePattern {
    pub fn new(pattern: &str) -> Self {
        let bare = match pattern.split_once("::") {
            Some((ty, _)) => ty.to_string(),
            None => pattern.to_string(),
        };
        if !bare.contains('*') {
            return Self {
                bare,
                kind: Kind::Literal,
            };
        }
        // Escape everything, then turn the escaped `*` back into `.*`.
        let escaped = regex::escape(&bare).replace("\\*", ".*");
        let kind = match Regex::new(&format!("^{escaped}$")) {
            Ok(re) => Kind::Wildcard(re),
            Err(e) => {
                warn!(pattern = %bare, error = %e, "pattern failed to compile, matching literally");
                Kind::Literal
            }
        };
        Self { bare, kind }
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.kind {
            Kind::Literal => self.bare == name,
            Kind::Wildcard(re) => re.is_match(name),
        }
    }

    /// The exact name a wildcard-free pattern requires, for index lookups.
    pub fn as_literal(&self) -> Option<&str> {
        match self.kind {
            Kind::Literal => Some(&self.bare),
            Kind::Wildcard(_) => None,
        }
    }
}
