use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/keyskill`, or the platform data dir without a HOME
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("keyskill"))
        } else {
            ProjectDirs::from("", "", "keyskill").map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn storage_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("storage.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("keyskill.log"))
    }
}
