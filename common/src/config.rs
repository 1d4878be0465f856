// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use config::{Config as ConfigFile, File, Environment};

const DEFAULT_WEB_SERVER_ADDR: &str = "127.0.0.1:8081";
const DEFAULT_AGENT_TYPE: &str = "ollama";
const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:8081/api/chat";
const DEFAULT_COOKIE_AGE_DAYS: i64 = 7;

/// Central configuration for the web server and the stream client
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub web_server_addr: String,
    /// Base URL of the upstream agent API. Never defaulted: a missing value
    /// surfaces as a configuration error on the routes that need it.
    pub agent_api_base_url: Option<String>,
    pub agent_type: String,
    /// Chat relay endpoint the stream client connects to
    pub relay_url: String,
    pub log_level: String,

    pub cookies: CookieConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CookieConfig {
    pub secure: bool,
    pub age_days: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    pub path: String,
    pub index: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web_server_addr: DEFAULT_WEB_SERVER_ADDR.to_string(),
            agent_api_base_url: None,
            agent_type: DEFAULT_AGENT_TYPE.to_string(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            log_level: "info".to_string(),
            cookies: CookieConfig {
                secure: false,
                age_days: DEFAULT_COOKIE_AGE_DAYS,
            },
            static_files: StaticFilesConfig {
                path: "./static".to_string(),
                index: "index.html".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let defaults = Self::default();

        let config = ConfigFile::builder()
            .set_default("web_server_addr", defaults.web_server_addr)?
            .set_default("agent_type", defaults.agent_type)?
            .set_default("relay_url", defaults.relay_url)?
            .set_default("log_level", defaults.log_level)?
            .set_default("cookies.secure", run_mode == "production")?
            .set_default("cookies.age_days", defaults.cookies.age_days)?
            .set_default("static_files.path", defaults.static_files.path)?
            .set_default("static_files.index", defaults.static_files.index)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Environment variables with prefix "APP", e.g. APP__COOKIES__SECURE
            .add_source(Environment::with_prefix("APP").separator("__"))
            // The deployment-wide agent API variable wins over everything else
            .set_override_option("agent_api_base_url", env::var("AGENT_API_BASE_URL").ok())?
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load configuration, falling back to plain environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");

                let defaults = Self::default();

                let web_server_addr = env::var("WEB_SERVER_ADDR")
                    .unwrap_or(defaults.web_server_addr);

                let agent_api_base_url = env::var("AGENT_API_BASE_URL").ok();

                let agent_type = env::var("AGENT_TYPE")
                    .unwrap_or(defaults.agent_type);

                let relay_url = env::var("RELAY_URL")
                    .unwrap_or(defaults.relay_url);

                let log_level = env::var("LOG_LEVEL")
                    .unwrap_or(defaults.log_level);

                let secure = env::var("RUN_MODE")
                    .map(|v| v == "production")
                    .unwrap_or(false);

                let age_days = env::var("COOKIE_AGE_DAYS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(DEFAULT_COOKIE_AGE_DAYS);

                let static_files_path = env::var("STATIC_FILES_PATH")
                    .unwrap_or(defaults.static_files.path);

                let static_files_index = env::var("STATIC_FILES_INDEX")
                    .unwrap_or(defaults.static_files.index);

                Self {
                    web_server_addr,
                    agent_api_base_url,
                    agent_type,
                    relay_url,
                    log_level,
                    cookies: CookieConfig { secure, age_days },
                    static_files: StaticFilesConfig {
                        path: static_files_path,
                        index: static_files_index,
                    },
                }
            }
        }
    }

    /// The configured agent API base URL, if usable
    ///
    /// Empty values count as unset and a trailing slash is dropped so paths
    /// can be appended directly.
    pub fn agent_base_url(&self) -> Option<&str> {
        self.agent_api_base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}
