use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "readalong")
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("readalong_config.json"))
    }

    /// Session log database under `$HOME/.local/state/readalong`, falling back
    /// to the platform data dir.
    pub fn store_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("readalong")
                .join("sessions.db");
        }
        Self::project()
            .map(|pd| pd.data_local_dir().join("sessions.db"))
            .unwrap_or_else(|| PathBuf::from("readalong_sessions.db"))
    }
}
