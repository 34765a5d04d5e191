//! Optimizer configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```
//! use styletrim::{OptimizerConfig, OutputFormat};
//!
//! let config = OptimizerConfig::from_toml_str(r#"
//! mine_mixins = false
//! output = "scss"
//! "#).unwrap();
//!
//! assert!(!config.mine_mixins);
//! assert!(config.detect_undo);
//! assert_eq!(config.output, OutputFormat::Scss);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Output flavour of the rendered stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain CSS; accepted mixins are expanded back into their selectors.
    #[default]
    Css,
    /// SCSS with `@mixin` blocks and `@include` references.
    Scss,
}

/// Switches and knobs for one optimization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Collapse repeated property names inside one selector.
    pub eliminate_duplicates: bool,
    /// Run the cascade and drop overridden or unmatched declarations.
    pub remove_ineffective: bool,
    /// Drop declarations that only restate a property default.
    pub detect_undo: bool,
    /// Extract declarations shared across selectors into mixins.
    pub mine_mixins: bool,
    /// Rewrite descendant/sibling combinators into child/adjacent ones.
    pub tighten_combinators: bool,
    /// Name prefix for generated mixins.
    pub mixin_prefix: String,
    /// Rendered output flavour.
    pub output: OutputFormat,
    /// Normalize declaration values while parsing.
    pub normalize_values: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            eliminate_duplicates: true,
            remove_ineffective: true,
            detect_undo: true,
            mine_mixins: true,
            tighten_combinators: true,
            mixin_prefix: "mixin".to_string(),
            output: OutputFormat::Css,
            normalize_values: true,
        }
    }
}

impl OptimizerConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// A configuration with every pass disabled.
    pub fn analysis_only() -> Self {
        Self {
            eliminate_duplicates: false,
            remove_ineffective: false,
            detect_undo: false,
            mine_mixins: false,
            tighten_combinators: false,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_enable_every_pass() {
        let config = OptimizerConfig::default();
        assert!(config.eliminate_duplicates);
        assert!(config.remove_ineffective);
        assert!(config.tighten_combinators);
        assert_eq!(config.mixin_prefix, "mixin");
        assert_eq!(config.output, OutputFormat::Css);
    }

    #[test]
    fn empty_toml_is_default() {
        let config = OptimizerConfig::from_toml_str("").unwrap();
        assert_eq!(config, OptimizerConfig::default());
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = OptimizerConfig::from_toml_str("detect_undo = 3").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mixin_prefix = \"shared\"\ntighten_combinators = false").unwrap();

        let config = OptimizerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.mixin_prefix, "shared");
        assert!(!config.tighten_combinators);
        assert!(config.mine_mixins);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = OptimizerConfig::from_file("/nonexistent/styletrim.toml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
