use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "dialogue-skipper";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("dialogue_skipper_config.json"))
    }

    pub fn log_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.data_local_dir().join("dialogue_skipper.log"))
            .unwrap_or_else(|| PathBuf::from("dialogue_skipper.log"))
    }
}
