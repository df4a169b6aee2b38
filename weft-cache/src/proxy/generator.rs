//! The proxy source generation seam.
//!
//! Real text/AST rewriting lives outside the core; the cache only decides
//! *when* to regenerate and hands the target over. The stub generator
//! below produces a readable placeholder wrapper, which is all the tests
//! and the artifact-location bookkeeping need.

use weft_core::errors::CacheError;
use weft_core::metadata::DeclEntry;

/// Produces proxy source text for a declaration and its woven aspects,
/// ordered outermost first.
pub trait ProxyGenerator: Send + Sync {
    fn generate(&self, entry: &DeclEntry, aspects: &[String]) -> Result<String, CacheError>;
}

/// Default generator: emits a wrapper stub naming the interception chain.
#[derive(Debug, Default)]
pub struct StubGenerator;

impl ProxyGenerator for StubGenerator {
    fn generate(&self, entry: &DeclEntry, aspects: &[String]) -> Result<String, CacheError> {
        let mut out = String::new();
        out.push_str(&format!("// proxy for {}\n", entry.declaration.name));
        out.push_str(&format!("// source: {}\n", entry.declaration.file.display()));
        for aspect in aspects {
            out.push_str(&format!("// weaves: {aspect}\n"));
        }
        out.push_str(&format!("class {} proxies original\n", entry.declaration.name));
        Ok(out)
    }
}
