//! Configuration for the server and the client surfaces.
//!
//! The configuration is a JSON document (`config.json`) in the platform data
//! directory. Both sections are optional and omitted from the file when
//! unset. `.env` files and `TODOSYNC_*` environment variables override the
//! file at load time.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use todosync::libs::config::Config;
//!
//! let config = Config::load()?;
//! let server = config.server_or_default();
//! println!("binding {}", server.bind);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::libs::sync_bus::ShellKind;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect, Select};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs::{self, File};
use std::path::PathBuf;
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_BIND: &str = "127.0.0.1:4100";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:4100";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// How the server resolves the caller behind a credential.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// HS256 bearer tokens signed with `jwtSecret`.
    Jwt,
    /// Deterministic development identity.
    #[default]
    Mock,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Jwt => write!(f, "jwt"),
            AuthMode::Mock => write!(f, "mock"),
        }
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jwt" => Ok(AuthMode::Jwt),
            "mock" => Ok(AuthMode::Mock),
            other => Err(format!("unknown auth mode '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Database file; `todosync.db` in the data directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    #[serde(default)]
    pub auth_mode: AuthMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Page size used when a surface refetches the whole list.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Which sync bus transport the surfaces use.
    #[serde(default)]
    pub shell: ShellKind,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientConfig>,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            database: None,
            auth_mode: AuthMode::default(),
            jwt_secret: None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: default_api_url(),
            auth_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            page_size: default_page_size(),
            shell: ShellKind::default(),
        }
    }
}

impl Config {
    /// Reads `config.json`, or returns the default configuration when the
    /// file does not exist yet.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    /// Reads the file, then applies `.env` and `TODOSYNC_*` overrides.
    ///
    /// This is what the binaries use; `read` stays a plain view of the file
    /// so that `init` never persists values that came from the environment.
    pub fn load() -> Result<Config> {
        dotenv::dotenv().ok();
        let mut config = Self::read()?;
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Removes `config.json`. Returns whether a file was there.
    pub fn delete() -> Result<bool> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(false);
        }
        fs::remove_file(config_file_path)?;
        Ok(true)
    }

    pub fn server_or_default(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn client_or_default(&self) -> ClientConfig {
        self.client.clone().unwrap_or_default()
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| env::var(key).ok());
    }

    /// Applies overrides from an arbitrary lookup; `apply_env` passes the
    /// process environment.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(bind) = lookup("TODOSYNC_BIND") {
            self.server.get_or_insert_with(ServerConfig::default).bind = bind;
        }
        if let Some(database) = lookup("TODOSYNC_DATABASE") {
            self.server.get_or_insert_with(ServerConfig::default).database = Some(PathBuf::from(database));
        }
        if let Some(mode) = lookup("TODOSYNC_AUTH_MODE").and_then(|mode| mode.parse().ok()) {
            self.server.get_or_insert_with(ServerConfig::default).auth_mode = mode;
        }
        if let Some(secret) = lookup("TODOSYNC_JWT_SECRET") {
            self.server.get_or_insert_with(ServerConfig::default).jwt_secret = Some(secret);
        }
        if let Some(api_url) = lookup("TODOSYNC_API_URL") {
            self.client.get_or_insert_with(ClientConfig::default).api_url = api_url;
        }
        if let Some(token) = lookup("TODOSYNC_TOKEN") {
            self.client.get_or_insert_with(ClientConfig::default).auth_token = Some(token);
        }
        if let Some(shell) = lookup("TODOSYNC_SHELL").and_then(|shell| shell.parse().ok()) {
            self.client.get_or_insert_with(ClientConfig::default).shell = shell;
        }
    }

    /// Interactive wizard. Existing values are offered as defaults.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();
        let theme = ColorfulTheme::default();

        let modules = [Message::ConfigModuleServer.to_string(), Message::ConfigModuleClient.to_string()];
        let selected = MultiSelect::with_theme(&theme)
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules)
            .interact()?;

        for selection in selected {
            match selection {
                0 => {
                    let default = config.server_or_default();
                    msg_print!(Message::ConfigModuleServer);
                    let bind: String = Input::with_theme(&theme)
                        .with_prompt(Message::PromptServerBind.to_string())
                        .default(default.bind)
                        .interact_text()?;
                    let database: String = Input::with_theme(&theme)
                        .with_prompt(Message::PromptServerDatabase.to_string())
                        .default(default.database.map(|p| p.display().to_string()).unwrap_or_default())
                        .allow_empty(true)
                        .interact_text()?;
                    let modes = [AuthMode::Mock, AuthMode::Jwt];
                    let mode = Select::with_theme(&theme)
                        .with_prompt(Message::PromptAuthMode.to_string())
                        .items(&modes)
                        .default(modes.iter().position(|m| *m == default.auth_mode).unwrap_or(0))
                        .interact()?;
                    let auth_mode = modes[mode];
                    let jwt_secret = if auth_mode == AuthMode::Jwt {
                        let secret: String = Input::with_theme(&theme)
                            .with_prompt(Message::PromptJwtSecret.to_string())
                            .default(default.jwt_secret.unwrap_or_default())
                            .interact_text()?;
                        Some(secret)
                    } else {
                        None
                    };

                    config.server = Some(ServerConfig {
                        bind,
                        database: Some(database).filter(|d| !d.trim().is_empty()).map(PathBuf::from),
                        auth_mode,
                        jwt_secret,
                    });
                }
                1 => {
                    let default = config.client_or_default();
                    msg_print!(Message::ConfigModuleClient);
                    let api_url: String = Input::with_theme(&theme)
                        .with_prompt(Message::PromptApiUrl.to_string())
                        .default(default.api_url)
                        .interact_text()?;
                    let auth_token: String = Input::with_theme(&theme)
                        .with_prompt(Message::PromptAuthToken.to_string())
                        .default(default.auth_token.unwrap_or_default())
                        .allow_empty(true)
                        .interact_text()?;
                    let request_timeout_secs: u64 = Input::with_theme(&theme)
                        .with_prompt(Message::PromptRequestTimeout.to_string())
                        .default(default.request_timeout_secs)
                        .interact_text()?;
                    let page_size: u32 = Input::with_theme(&theme)
                        .with_prompt(Message::PromptPageSize.to_string())
                        .default(default.page_size)
                        .interact_text()?;
                    let shells = [ShellKind::Web, ShellKind::Desktop];
                    let shell = Select::with_theme(&theme)
                        .with_prompt(Message::PromptShell.to_string())
                        .items(&shells)
                        .default(shells.iter().position(|s| *s == default.shell).unwrap_or(0))
                        .interact()?;

                    config.client = Some(ClientConfig {
                        api_url,
                        auth_token: Some(auth_token).filter(|t| !t.trim().is_empty()),
                        request_timeout_secs,
                        page_size: page_size.clamp(1, 100),
                        shell: shells[shell],
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
