//! Authentication configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Secrets that must never be accepted outside dev mode.
const PLACEHOLDER_SECRETS: &[&str] = &["change_me", "dev-secret-change-in-production"];

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Enable development mode (ephemeral secret allowed, cookies without `Secure`).
    pub dev_mode: bool,

    /// JWT secret for HS256. Supports `env:VAR_NAME`.
    /// REQUIRED when dev_mode is false.
    pub jwt_secret: Option<String>,

    /// Access token lifetime (e.g. "60s", "15m", "24h").
    pub access_token_ttl: String,

    /// Refresh token lifetime.
    pub refresh_token_ttl: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            // No default JWT secret - must be explicitly configured
            jwt_secret: None,
            access_token_ttl: "60s".to_string(),
            refresh_token_ttl: "7d".to_string(),
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    /// Returns the resolved secret or None if not configured.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        match &self.jwt_secret {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                    }
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Parsed access token lifetime.
    pub fn access_ttl(&self) -> Result<Duration, ConfigValidationError> {
        parse_duration(&self.access_token_ttl)
    }

    /// Parsed refresh token lifetime.
    pub fn refresh_ttl(&self) -> Result<Duration, ConfigValidationError> {
        parse_duration(&self.refresh_token_ttl)
    }

    /// Validate the configuration.
    /// Returns an error if the configuration is invalid for the current mode.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.access_ttl()?;
        self.refresh_ttl()?;

        let secret = self.resolve_jwt_secret()?;
        if self.dev_mode {
            return Ok(());
        }

        let secret = secret.ok_or(ConfigValidationError::MissingJwtSecret)?;
        if PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
            return Err(ConfigValidationError::InsecureJwtSecret);
        }
        if secret.len() < 32 {
            return Err(ConfigValidationError::JwtSecretTooShort);
        }

        Ok(())
    }

    /// Generate a random JWT secret from the OS-backed thread RNG.
    pub fn generate_jwt_secret() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const SECRET_LENGTH: usize = 64;

        let mut rng = rand::rng();
        (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Parse a duration string like "60s", "15m", "24h", "7d", "2w".
pub fn parse_duration(s: &str) -> Result<Duration, ConfigValidationError> {
    let invalid = || ConfigValidationError::InvalidDuration(s.to_string());

    let s = s.trim();
    let unit = s.chars().last().ok_or_else(invalid)?;
    let num: i64 = s[..s.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;
    if num <= 0 {
        return Err(invalid());
    }

    let factor = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        'w' => 604800,
        _ => return Err(invalid()),
    };

    num.checked_mul(factor)
        .and_then(Duration::try_seconds)
        .ok_or_else(invalid)
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// JWT secret is required in production mode.
    MissingJwtSecret,
    /// JWT secret is a well-known placeholder value.
    InsecureJwtSecret,
    /// JWT secret is too short (minimum 32 characters).
    JwtSecretTooShort,
    /// Environment variable not found (for `env:VAR_NAME` syntax).
    EnvVarNotFound(String),
    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    EnvVarEmpty(String),
    /// A token lifetime could not be parsed.
    InvalidDuration(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingJwtSecret => {
                write!(
                    f,
                    "JWT secret is required when dev_mode is false. Set JWT_SECRET or auth.jwt_secret in config."
                )
            }
            Self::InsecureJwtSecret => {
                write!(
                    f,
                    "JWT secret cannot be a placeholder value in production. Please configure a secure secret."
                )
            }
            Self::JwtSecretTooShort => {
                write!(f, "JWT secret must be at least 32 characters long.")
            }
            Self::EnvVarNotFound(var) => {
                write!(
                    f,
                    "Environment variable '{}' not found (referenced via env:{} in config).",
                    var, var
                )
            }
            Self::EnvVarEmpty(var) => {
                write!(
                    f,
                    "Environment variable '{}' is empty (referenced via env:{} in config).",
                    var, var
                )
            }
            Self::InvalidDuration(value) => {
                write!(
                    f,
                    "invalid token lifetime '{}', use a positive number followed by s/m/h/d/w",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

#[cfg(test)]
#[allow(clippy::field_reassign_with_default)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert!(!config.dev_mode);
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.access_ttl().unwrap(), Duration::seconds(60));
        assert_eq!(config.refresh_ttl().unwrap(), Duration::days(7));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_duration("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_duration(" 24h ").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("2w").unwrap(), Duration::weeks(2));
    }

    #[test]
    fn test_parse_duration_invalid() {
        for case in ["", "s", "10", "10y", "-5m", "0s", "abc", "9223372036854775807w"] {
            assert!(parse_duration(case).is_err(), "{case} should fail");
        }
    }

    #[test]
    fn test_config_validation_dev_mode() {
        let mut config = AuthConfig::default();
        config.dev_mode = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_production_mode_no_secret() {
        let config = AuthConfig::default();
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::MissingJwtSecret
        );
    }

    #[test]
    fn test_config_validation_placeholder_secret() {
        let mut config = AuthConfig::default();
        config.jwt_secret = Some("change_me".to_string());
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::InsecureJwtSecret
        );
    }

    #[test]
    fn test_config_validation_short_secret() {
        let mut config = AuthConfig::default();
        config.jwt_secret = Some("tooshort".to_string());
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::JwtSecretTooShort
        );
    }

    #[test]
    fn test_config_validation_bad_ttl() {
        let mut config = AuthConfig::default();
        config.dev_mode = true;
        config.access_token_ttl = "soon".to_string();
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::InvalidDuration("soon".to_string())
        );
    }

    #[test]
    fn test_config_validation_production_mode_valid() {
        let mut config = AuthConfig::default();
        config.jwt_secret =
            Some("a-very-long-and-secure-jwt-secret-that-is-at-least-32-chars".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_jwt_secret_passes_validation() {
        let secret = AuthConfig::generate_jwt_secret();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));

        let mut config = AuthConfig::default();
        config.jwt_secret = Some(secret);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_jwt_secret_env_var() {
        // SAFETY: test-only environment variable with a unique name
        unsafe {
            std::env::set_var(
                "BOARDGATE_TEST_JWT_SECRET_4821",
                "secret-from-env-var-at-least-32-chars",
            );
        }

        let mut config = AuthConfig::default();
        config.jwt_secret = Some("env:BOARDGATE_TEST_JWT_SECRET_4821".to_string());
        assert_eq!(
            config.resolve_jwt_secret().unwrap(),
            Some("secret-from-env-var-at-least-32-chars".to_string())
        );

        // SAFETY: cleaning up the variable set above
        unsafe {
            std::env::remove_var("BOARDGATE_TEST_JWT_SECRET_4821");
        }
    }

    #[test]
    fn test_resolve_jwt_secret_env_var_not_found() {
        let mut config = AuthConfig::default();
        config.jwt_secret = Some("env:BOARDGATE_MISSING_VAR_4821".to_string());
        assert_eq!(
            config.resolve_jwt_secret().unwrap_err(),
            ConfigValidationError::EnvVarNotFound("BOARDGATE_MISSING_VAR_4821".to_string())
        );
    }
}
