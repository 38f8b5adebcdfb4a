use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_LISTEN: &str = "0.0.0.0:4040";
const DEFAULT_MPD_ADDRESS: &str = "localhost:6600";

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    pub music_dir: Option<PathBuf>,
    pub mpd: Option<String>,
    pub mpd_password: Option<String>,
    pub listen: Option<String>,
    pub keepalive: Option<u64>,
    pub verbose: Option<bool>,
}

/// Process-wide settings. Read-only once the server is constructed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credentials Subsonic clients must present on every request.
    pub subsonic_user: String,
    pub subsonic_password: String,
    /// Root of MPD's music directory; stream paths are resolved against it.
    pub music_directory: PathBuf,
    pub mpd_address: String,
    pub mpd_password: Option<String>,
    pub listen: SocketAddr,
    pub verbose: bool,
    /// Interval between MPD keepalive pings. Zero disables keepalive.
    pub keepalive: Duration,
}

impl Config {
    /// Merge CLI arguments over the config file over built-in defaults.
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();

        let listen = match args.listen {
            Some(addr) => addr,
            None => {
                let raw = file.listen.as_deref().unwrap_or(DEFAULT_LISTEN);
                raw.parse()
                    .map_err(|_| ConfigError::InvalidListen(raw.to_string()))?
            }
        };

        Ok(Config {
            subsonic_user: args
                .user
                .clone()
                .or(file.user)
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::Missing("user"))?,
            subsonic_password: args
                .password
                .clone()
                .or(file.password)
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::Missing("password"))?,
            music_directory: args
                .music_dir
                .clone()
                .or(file.music_dir)
                .ok_or(ConfigError::Missing("music_dir"))?,
            mpd_address: args
                .mpd
                .clone()
                .or(file.mpd)
                .unwrap_or_else(|| DEFAULT_MPD_ADDRESS.to_string()),
            mpd_password: args.mpd_password.clone().or(file.mpd_password),
            listen,
            verbose: args.verbose || file.verbose.unwrap_or(false),
            keepalive: Duration::from_secs(args.keepalive.or(file.keepalive).unwrap_or(0)),
        })
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("mpdsonic.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("mpdsonic").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting: {0} (pass it on the command line or in the config file)")]
    Missing(&'static str),
    #[error("invalid listen address: {0}")]
    InvalidListen(String),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
