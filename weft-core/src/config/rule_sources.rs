//! Aspect rule loading from layered sources.
//!
//! Precedence (highest first): deployment override file > project config >
//! library-provided defaults > in-source declarations. Pattern lists union
//! across all sources; only the priority follows precedence.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::WeftConfig;
use crate::errors::ConfigError;
use crate::types::{AspectRegistry, RuleSource};

/// One aspect rule as written in a TOML source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AspectDecl {
    pub name: String,
    pub classes: Vec<String>,
    pub annotations: Vec<String>,
    pub priority: Option<i32>,
}

/// Shape of the deployment override file (`aspects.toml`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OverrideFile {
    aspects: Vec<AspectDecl>,
}

/// Merge aspect rules from all configuration sources into `registry`.
///
/// `defaults` are library-provided rules registered in code; rules already
/// present in the registry (collected from `#[Aspect]` markers during the
/// scan) keep their patterns and participate in priority resolution at the
/// lowest specificity.
pub fn load_rules(
    config: &WeftConfig,
    config_dir: Option<&Path>,
    defaults: &[AspectDecl],
    registry: &mut AspectRegistry,
) -> Result<(), ConfigError> {
    for decl in defaults {
        merge_decl(registry, decl, RuleSource::Defaults)?;
    }

    for decl in &config.aspects {
        merge_decl(registry, decl, RuleSource::Config)?;
    }

    if let Some(dir) = config_dir {
        let path = dir.join("aspects.toml");
        if path.exists() {
            let text =
                std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            let file: OverrideFile =
                toml::from_str(&text).map_err(|e| ConfigError::ParseError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            debug!(path = %path.display(), rules = file.aspects.len(), "loaded aspect overrides");
            for decl in &file.aspects {
                merge_decl(registry, decl, RuleSource::Override)?;
            }
        }
    }

    Ok(())
}

fn merge_decl(
    registry: &mut AspectRegistry,
    decl: &AspectDecl,
    source: RuleSource,
) -> Result<(), ConfigError> {
    registry.merge(
        &decl.name,
        &decl.classes,
        &decl.annotations,
        decl.priority,
        source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_file_beats_project_config_priority() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("aspects.toml"),
            r#"
[[aspects]]
name = "App\\Aspect\\Log"
classes = ["App\\Override\\*"]
priority = 1
"#,
        )
        .unwrap();

        let config = WeftConfig::from_toml(
            r#"
[[aspects]]
name = "App\\Aspect\\Log"
classes = ["App\\Service\\*"]
priority = 10
"#,
        )
        .unwrap();

        let mut registry = AspectRegistry::new();
        load_rules(&config, Some(dir.path()), &[], &mut registry).unwrap();

        let rule = registry.get("App\\Aspect\\Log").unwrap();
        assert_eq!(rule.priority, Some(1));
        // Patterns union rather than replace.
        assert_eq!(rule.classes, vec!["App\\Service\\*", "App\\Override\\*"]);
    }

    #[test]
    fn missing_override_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let config = WeftConfig::default();
        let mut registry = AspectRegistry::new();
        load_rules(&config, Some(dir.path()), &[], &mut registry).unwrap();
        assert!(registry.is_empty());
    }
}
