//! Session configuration.
//!
//! Everything has a default, so a config file only needs the keys it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::locations::{get_default_log_dir, get_default_storage_dir};

const DEFAULT_SEED_CONTENT: &str = "fn main() {\n    println!(\"Hello, world!\");\n}\n";

/// The project created when no saved state exists. `folder` also names the
/// fallback folder inserted when a delete empties the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedProject {
    pub folder: String,
    pub file: String,
    pub content: String,
}

impl Default for SeedProject {
    fn default() -> Self {
        Self {
            folder: "src".to_string(),
            file: "main.rs".to_string(),
            content: DEFAULT_SEED_CONTENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub project: String,
    pub storage_dir: PathBuf,
    pub log_dir: PathBuf,
    pub seed: SeedProject,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            project: "default".to_string(),
            storage_dir: get_default_storage_dir(),
            log_dir: get_default_log_dir(),
            seed: SeedProject::default(),
        }
    }
}

impl ExplorerConfig {
    pub fn from_file(path: &Path) -> Result<ExplorerConfig> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        tracing::info!("Loaded explorer config from {}", path.display());
        Ok(config)
    }

    /// Directory holding the sled database.
    pub fn database_dir(&self) -> PathBuf {
        self.storage_dir.join("explorer.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExplorerErrorType;

    #[test]
    fn test_partial_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("explorer.json");
        std::fs::write(&path, r#"{"project": "scratch", "seed": {"file": "lib.rs"}}"#).unwrap();

        let config = ExplorerConfig::from_file(&path).unwrap();
        assert_eq!(config.project, "scratch");
        assert_eq!(config.seed.folder, "src");
        assert_eq!(config.seed.file, "lib.rs");
        assert_eq!(config.storage_dir, get_default_storage_dir());
    }

    #[test]
    fn test_missing_and_malformed_config() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = ExplorerConfig::from_file(&tmp.path().join("nope.json")).unwrap_err();
        assert_eq!(missing.kind(), ExplorerErrorType::IOError);

        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{ project").unwrap();
        let bad = ExplorerConfig::from_file(&path).unwrap_err();
        assert_eq!(bad.kind(), ExplorerErrorType::SerializationError);
    }
}
