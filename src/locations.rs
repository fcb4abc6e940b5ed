use crate::errors::Result;
use directories::BaseDirs;
use std::path::{Path, PathBuf};

const PACKAGE_DIR: &str = "explorer_vfs";

/// Root of everything the explorer writes to disk. Falls back to a hidden
/// folder in the working directory when the platform has no data directory.
pub fn get_main_dir() -> PathBuf {
    match BaseDirs::new() {
        Some(base_dirs) => base_dirs.data_dir().join(PACKAGE_DIR),
        None => {
            tracing::warn!("No user data directory available, using the working directory");
            PathBuf::from(format!(".{}", PACKAGE_DIR))
        }
    }
}

pub fn get_default_storage_dir() -> PathBuf {
    get_main_dir().join("projects")
}

pub fn get_default_log_dir() -> PathBuf {
    get_main_dir().join("logs")
}

pub fn ensure_dir(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_live_under_main_dir() {
        let main = get_main_dir();
        assert!(get_default_storage_dir().starts_with(&main));
        assert!(get_default_log_dir().starts_with(&main));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        let created = ensure_dir(&nested).unwrap();
        assert!(created.is_dir());
        // Second call is a no-op
        ensure_dir(&nested).unwrap();
    }
}
