//! Rulesets and rosters read from TOML or JSON documents

mod ruleset;

pub use ruleset::{
    default_ruleset, load_ruleset, parse_ruleset, AgeBand, ItemModifier, PerkModifier, Ruleset,
};

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a ruleset or roster could not be used
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Bad rule data: {0}")]
    Invalid(String),
}

/// Document syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// `.json` files are JSON; everything else is read as TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

/// Deserialize a document held in memory
pub fn parse_document<T: DeserializeOwned>(
    content: &str,
    format: Format,
) -> Result<T, ConfigError> {
    Ok(match format {
        Format::Toml => toml::from_str(content)?,
        Format::Json => serde_json::from_str(content)?,
    })
}

/// Read and deserialize a document, picking the syntax from its extension
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&content, Format::from_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("rosters/company.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("champion.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("ruleset")), Format::Toml);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_document::<Ruleset>(Path::new("/nonexistent/ruleset.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/ruleset.toml"));
    }

    #[test]
    fn test_syntax_errors_by_format() {
        let toml = parse_document::<Ruleset>("base_morale = [", Format::Toml);
        assert!(matches!(toml, Err(ConfigError::Toml(_))));
        let json = parse_document::<Ruleset>("{\"base_morale\": ", Format::Json);
        assert!(matches!(json, Err(ConfigError::Json(_))));
    }
}
