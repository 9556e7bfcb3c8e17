//! Type checker configuration, read from the `[typeck]` table of `typec.toml`.

use std::path::Path;

use serde::Deserialize;

/// Knobs that change how the inference core records its side effects.
///
/// Inference semantics (literal defaulting, join rules) are fixed; only the
/// monomorphization bookkeeping is configurable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeckConfig {
    /// Whether concrete generic instantiations are recorded in the registry.
    pub record_instantiations: bool,
    /// Replacement character for punctuation in mangled instantiation names.
    pub mangle_separator: char,
}

impl Default for TypeckConfig {
    fn default() -> Self {
        TypeckConfig {
            record_instantiations: true,
            mangle_separator: '_',
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    typeck: TypeckConfig,
}

impl TypeckConfig {
    /// Read and parse a `typec.toml` file.
    pub fn from_file(path: &Path) -> Result<TypeckConfig, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text. A missing `[typeck]` table yields defaults.
    pub fn from_toml(content: &str) -> Result<TypeckConfig, String> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| format!("Failed to parse config: {}", e))?;
        if !file.typeck.mangle_separator.is_ascii_alphanumeric()
            && file.typeck.mangle_separator != '_'
            && file.typeck.mangle_separator != '$'
        {
            return Err(format!(
                "mangle_separator must be an ASCII identifier character, got {:?}",
                file.typeck.mangle_separator
            ));
        }
        Ok(file.typeck)
    }
}
