use hoops_api::client::DEFAULT_BASE_URL;
use log::LevelFilter;
use std::path::PathBuf;

pub const API_URL_VAR: &str = "HOOPS_API_URL";
pub const LOG_LEVEL_VAR: &str = "HOOPS_LOG";
pub const SESSION_FILE_VAR: &str = "HOOPS_SESSION_FILE";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub api_url: String,
    pub session_file: PathBuf,
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_env(|key| std::env::var(key).ok())
    }

    pub fn from_env(var: impl Fn(&str) -> Option<String>) -> Self {
        Self::resolve(var, dirs::config_dir())
    }

    /// `config_dir` is the platform config directory, when there is one.
    fn resolve(var: impl Fn(&str) -> Option<String>, config_dir: Option<PathBuf>) -> Self {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let log_level = non_empty(LOG_LEVEL_VAR).and_then(|raw| raw.trim().parse().ok());
        let api_url = non_empty(API_URL_VAR)
            .map(|url| url.trim().trim_end_matches('/').to_owned())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let session_file = non_empty(SESSION_FILE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_session_path(config_dir));

        Self { full_screen: false, log_level, api_url, session_file }
    }
}

fn default_session_path(config_dir: Option<PathBuf>) -> PathBuf {
    config_dir
        .map(|d| d.join("hoopstui").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("session.json"))
}
