//! Converter configuration.
//!
//! Holds the reserved names the converter relies on: the prefixes that keep
//! definition symbols apart from calculus primitives, the naming
//! convention that identifies configuration cells, and the attribute names
//! that classify symbols. Defaults match the K framework's Kore output.

use serde::{Deserialize, Serialize};

/// Reserved names and conventions used by [`KoreConverter`](crate::kore::KoreConverter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Prefix prepended to every definition symbol name.
    pub symbol_prefix: String,
    /// Prefix prepended to every sort name.
    pub sort_prefix: String,
    /// Symbol of the outermost configuration cell.
    pub generated_top_symbol: String,
    /// Regular expression matching cell symbols; capture group 1 is the cell name.
    pub cell_pattern: String,
    /// Attribute marking symbols that denote exactly one value.
    pub functional_attribute: String,
    /// Attribute marking symbols defined by equations.
    pub function_attribute: String,
    /// Attribute marking symbols implemented natively by the backend.
    pub hook_attribute: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            symbol_prefix: "kore_".to_string(),
            sort_prefix: "kore_sort_".to_string(),
            generated_top_symbol: "Lbl'-LT-'generatedTop'-GT-'".to_string(),
            cell_pattern: r"^Lbl'-LT-'(.+)'-GT-'$".to_string(),
            functional_attribute: "functional".to_string(),
            function_attribute: "function".to_string(),
            hook_attribute: "hook".to_string(),
        }
    }
}

impl ConverterConfig {
    /// Serializes the configuration to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let bytes = serde_cbor::to_vec(self)?;
        Ok(bytes)
    }

    /// Deserializes a configuration from CBOR bytes.
    ///
    /// Missing fields take their default value.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_cbor::from_slice(bytes)?;
        Ok(config)
    }

    /// Saves the configuration to a file in CBOR format.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
        let bytes = self.to_cbor()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Loads a configuration from a CBOR file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        Self::from_cbor(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_kore_conventions() {
        let config = ConverterConfig::default();
        assert_eq!(config.symbol_prefix, "kore_");
        assert_eq!(config.sort_prefix, "kore_sort_");
        let re = regex::Regex::new(&config.cell_pattern).expect("default pattern compiles");
        let caps = re.captures("Lbl'-LT-'k'-GT-'").expect("k cell matches");
        assert_eq!(&caps[1], "k");
        assert!(re.is_match(&config.generated_top_symbol));
        assert!(!re.is_match("Lblfoo"));
    }

    #[test]
    fn file_roundtrip_preserves_configuration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("converter.cbor");
        let config = ConverterConfig {
            symbol_prefix: "sym_".to_string(),
            ..ConverterConfig::default()
        };
        config.save_to_file(&path).expect("save");
        let loaded = ConverterConfig::load_from_file(&path).expect("load");
        assert_eq!(loaded, config);
    }
}
