use serde::{Deserialize, Serialize};
use std::fs;

use crate::session::MAX_TTL_DAYS;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WicketSettings {
    pub application: ApplicationSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Signing secret for session tokens. REQUIRED: startup fails if this
    /// is empty after config and environment are applied. There is no
    /// generated fallback; a silently random key would invalidate every
    /// session on restart and hide misconfiguration.
    pub secret: String,
    /// Session lifetime in days, from issuance or last renewal
    pub ttl_days: u64,
    /// Interval in minutes between expired-record sweeps; 0 disables the
    /// sweep (verification already treats expired records as absent)
    pub sweep_interval_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be provided by config or environment
            ttl_days: 7,
            sweep_interval_minutes: 60,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true, // Default to secure cookies
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl WicketSettings {
    /// Load settings from configuration files and environment variables.
    /// Priority, highest first: environment variables, Settings.toml in the
    /// current directory, built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The settings file cannot be read or parsed
    /// - The session secret is missing after all sources are applied
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.validate()?;
        settings.initialize_logging();

        Ok(settings)
    }

    /// Initialize the logger from the resolved log filter: the built-in
    /// default, then `[logging].level` in Settings.toml, then `RUST_LOG`.
    /// Best-effort so repeated loads in tests do not fail.
    fn initialize_logging(&self) {
        let _ = env_logger::Builder::new()
            .parse_filters(&self.logging.level)
            .try_init();
    }

    /// Load base settings from Settings.toml if present, defaults otherwise.
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::path::PathBuf::from("Settings.toml");
        if config_path.exists() {
            let toml_content = fs::read_to_string(&config_path)?;
            Ok(basic_toml::from_str(&toml_content)?)
        } else {
            Ok(Self::default())
        }
    }

    fn apply_env_overrides(settings: &mut Self) {
        if let Ok(host) = std::env::var("HOST") {
            settings.application.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                settings.application.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            settings.application.cors_origins = cors_origins;
        }
        if let Ok(secret) = std::env::var("SESSION_SECRET") {
            if !secret.is_empty() {
                settings.session.secret = secret;
            }
        }
        Self::apply_numeric_env_override("SESSION_TTL_DAYS", &mut settings.session.ttl_days);
        Self::apply_numeric_env_override(
            "SESSION_SWEEP_INTERVAL_MINUTES",
            &mut settings.session.sweep_interval_minutes,
        );
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                settings.cookies.secure = cookie_secure;
            }
        }
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            settings.logging.level = log_level;
        }
    }

    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    /// Reject configurations the service must not start with.
    ///
    /// # Errors
    ///
    /// Returns an error if the session secret is absent or the TTL is
    /// outside 1..=[`MAX_TTL_DAYS`]
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.session.secret.is_empty() {
            return Err(
                "session secret is not configured; set SESSION_SECRET or \
                 [session].secret in Settings.toml"
                    .into(),
            );
        }
        if self.session.ttl_days == 0 {
            return Err("session ttl_days must be at least 1".into());
        }
        if self.session.ttl_days > MAX_TTL_DAYS {
            return Err(format!("session ttl_days must be at most {MAX_TTL_DAYS}").into());
        }
        Ok(())
    }

    /// Load environment variables from a .env file if one exists
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    if std::env::var(key.trim()).is_err() {
                        std::env::set_var(key.trim(), value.trim());
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_require_a_secret() {
        let settings = WicketSettings::default();
        assert!(settings.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_configured_secret_passes_validation() {
        let mut settings = WicketSettings::default();
        settings.session.secret = "a-configured-secret".to_string();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.session.ttl_days, 7);
    }

    #[test]
    #[serial]
    fn test_zero_ttl_rejected() {
        let mut settings = WicketSettings::default();
        settings.session.secret = "a-configured-secret".to_string();
        settings.session.ttl_days = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_oversized_ttl_rejected() {
        let mut settings = WicketSettings::default();
        settings.session.secret = "a-configured-secret".to_string();
        settings.session.ttl_days = MAX_TTL_DAYS + 1;
        assert!(settings.validate().is_err());

        settings.session.ttl_days = MAX_TTL_DAYS;
        assert!(settings.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_rust_log_overrides_log_filter() {
        std::env::set_var("RUST_LOG", "wicket=trace");

        let mut settings = WicketSettings::default();
        WicketSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.logging.level, "wicket=trace");
        std::env::remove_var("RUST_LOG");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("SESSION_SECRET", "env-secret");
        std::env::set_var("SESSION_TTL_DAYS", "14");
        std::env::set_var("COOKIE_SECURE", "false");

        let mut settings = WicketSettings::default();
        WicketSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.session.secret, "env-secret");
        assert_eq!(settings.session.ttl_days, 14);
        assert!(!settings.cookies.secure);

        std::env::remove_var("SESSION_SECRET");
        std::env::remove_var("SESSION_TTL_DAYS");
        std::env::remove_var("COOKIE_SECURE");
    }

    #[test]
    #[serial]
    fn test_empty_env_secret_is_not_an_override() {
        std::env::set_var("SESSION_SECRET", "");

        let mut settings = WicketSettings::default();
        settings.session.secret = "from-config".to_string();
        WicketSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.session.secret, "from-config");
        std::env::remove_var("SESSION_SECRET");
    }

    #[test]
    fn test_bind_address_and_cors() {
        let settings = WicketSettings::default();
        assert_eq!(settings.get_bind_address(), "0.0.0.0:8080");
        assert_eq!(
            settings.get_cors_origins(),
            vec!["http://localhost:3000", "http://localhost:8080"]
        );
    }
}
