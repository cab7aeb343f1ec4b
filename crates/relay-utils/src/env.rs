//! `.env` file loading

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Load variables from a `.env` file into the process environment.
///
/// Looks in the current directory (and its parents) first, then next to the
/// executable. Variables already present in the environment are kept.
/// Returns the path of the file that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from: {:?}", path);
        return Some(path);
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))?;
    load_dotenv_from(&exe_dir.join(".env"))
}

/// Load a specific `.env` file, logging parse failures instead of failing.
pub fn load_dotenv_from(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        return None;
    }
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!("Loaded .env from: {:?}", path);
            Some(path.to_path_buf())
        }
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dotenv_from(&dir.path().join(".env")).is_none());
    }

    #[test]
    fn test_env_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "RELAY_UTILS_TEST_ONLY_VAR=loaded\n").unwrap();

        assert_eq!(load_dotenv_from(&path), Some(path.clone()));
        assert_eq!(
            std::env::var("RELAY_UTILS_TEST_ONLY_VAR").as_deref(),
            Ok("loaded")
        );
    }
}
