//! Application configuration.
//!
//! Layered: built-in defaults, then the TOML file, then `BOARDGATE__*`
//! environment variables, then the plain `ADAPTER_BASE_URL`, `JWT_SECRET`,
//! `JWT_EXPIRES_IN` and `PORT` variables.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::adapter::{CallerId, IdentityPolicy};
use crate::auth::AuthConfig;

pub const APP_NAME: &str = "boardgate";

/// Prefix for structured environment overrides.
pub const ENV_PREFIX: &str = "BOARDGATE";

/// Plain environment variables and the config keys they override.
const COMPAT_ENV_VARS: &[(&str, &str)] = &[
    ("ADAPTER_BASE_URL", "adapter.base_url"),
    ("JWT_SECRET", "auth.jwt_secret"),
    ("JWT_EXPIRES_IN", "auth.access_token_ttl"),
    ("PORT", "server.port"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub adapter: AdapterConfig,
    pub auth: AuthConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS origins. Empty allows any origin without credentials.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub base_url: String,
    /// Caller id used when a request has no valid one. Unset means such
    /// requests are rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_user_id: Option<i64>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            fallback_user_id: None,
        }
    }
}

impl AdapterConfig {
    pub fn identity_policy(&self) -> Result<IdentityPolicy> {
        match self.fallback_user_id {
            None => Ok(IdentityPolicy::strict()),
            Some(raw) => CallerId::new(raw)
                .map(IdentityPolicy::with_fallback)
                .ok_or_else(|| anyhow!("adapter.fallback_user_id must be positive, got {raw}")),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base_url = self.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!(
                "adapter.base_url must be an http(s) URL, got '{}'",
                self.base_url
            );
        }
        self.identity_policy()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// JSONL audit file. Auditing is off when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl AppConfig {
    /// Load the configuration from a file and the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env(path, std::env::vars().collect())
    }

    /// Load the configuration from a file and the given environment.
    pub fn load_with_env(path: &Path, env: HashMap<String, String>) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .source(Some(env.clone().into_iter().collect())),
            );

        for (var, key) in COMPAT_ENV_VARS {
            let value = env.get(*var).filter(|value| !value.is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        let mut config: AppConfig = builder
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("parsing configuration")?;

        if let Some(ref file) = config.audit.file {
            config.audit.file = Some(expand_str_path(file)?.display().to_string());
        }

        Ok(config)
    }

    /// Check everything that can be checked before binding.
    pub fn validate(&self) -> Result<()> {
        self.adapter.validate()?;
        self.auth
            .validate()
            .context("Invalid auth configuration")?;
        Ok(())
    }
}

pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {parent:?}"))?;
    }

    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config).context("serializing default config to TOML")?;
    let mut body = default_config_header(path);
    body.push_str(&toml);
    fs::write(path, body).with_context(|| format!("writing config file to {}", path.display()))
}

fn default_config_header(path: &Path) -> String {
    let mut buffer = String::new();
    buffer.push_str("# Configuration for ");
    buffer.push_str(APP_NAME);
    buffer.push('\n');
    buffer.push_str("# File: ");
    buffer.push_str(&path.display().to_string());
    buffer.push('\n');
    buffer.push_str("# auth.jwt_secret is required unless auth.dev_mode is true\n");
    buffer.push('\n');
    buffer
}

pub fn expand_path(path: PathBuf) -> Result<PathBuf> {
    if let Some(text) = path.to_str() {
        expand_str_path(text)
    } else {
        Ok(path)
    }
}

pub fn expand_str_path(text: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(text).context("expanding path")?;
    Ok(PathBuf::from(expanded.to_string()))
}

pub fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}
