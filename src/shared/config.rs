//! Application configuration. Listener, storage, auth and mail settings.

use secrecy::SecretString;
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_TOKEN_TTL_MINUTES: u64 = 120;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
/// Spreadsheet uploads can be large.
pub const DEFAULT_MAX_BODY_BYTES: usize = 250 * 1024 * 1024;
pub const DEFAULT_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub host: Option<String>,
    /// Listen port. Read from PORT or PROJECTDESK_PORT.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub data_dir: Option<String>,

    /// JWT signing secret. Read from SECRET_KEY or PROJECTDESK_SECRET_KEY. Required.
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub token_ttl_minutes: Option<u64>,
    #[serde(default)]
    pub bcrypt_cost: Option<u32>,

    #[serde(default)]
    pub max_body_bytes: Option<usize>,
    #[serde(default)]
    pub default_page_limit: Option<u32>,
    /// Comma-separated list. Unset or empty allows any origin.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Mail (SMTP). Notifications are only logged when EMAIL_HOST is unset.
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub email_host: Option<String>,
    #[serde(default)]
    pub email_port: Option<u16>,
    #[serde(default)]
    pub email_user: Option<String>,
    #[serde(default)]
    pub email_pass: Option<String>,
    #[serde(default)]
    pub email_from: Option<String>,
}

/// Resolved SMTP settings; present only when a host is configured.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut cfg = Self::from_sources(
            config::Environment::with_prefix("PROJECTDESK"),
            std::env::var("PROJECTDESK_CONFIG").ok().as_deref(),
        )?;

        // Conventional unprefixed names win so an existing .env keeps working.
        if let Ok(s) = std::env::var("PORT") {
            if let Ok(port) = s.parse::<u16>() {
                cfg.port = Some(port);
            }
        }
        if let Ok(s) = std::env::var("SECRET_KEY") {
            cfg.secret_key = Some(s);
        }
        if let Ok(s) = std::env::var("EMAIL_HOST") {
            cfg.email_host = Some(s);
        }
        if let Ok(s) = std::env::var("EMAIL_PORT") {
            if let Ok(port) = s.parse::<u16>() {
                cfg.email_port = Some(port);
            }
        }
        if let Ok(s) = std::env::var("EMAIL_USER") {
            cfg.email_user = Some(s);
        }
        if let Ok(s) = std::env::var("EMAIL_PASS") {
            cfg.email_pass = Some(s);
        }
        if let Ok(s) = std::env::var("EMAIL_FROM") {
            cfg.email_from = Some(s);
        }
        Ok(cfg)
    }

    /// Prefixed environment plus an optional config file. Malformed values
    /// (a non-numeric port, say) are errors, not silently dropped.
    fn from_sources(
        env: config::Environment,
        file: Option<&str>,
    ) -> Result<Self, config::ConfigError> {
        let mut c = config::Config::builder().add_source(env);
        if let Some(path) = file {
            c = c.add_source(config::File::with_name(path));
        }
        c.build()?.try_deserialize()
    }

    pub fn host_or_default(&self) -> String {
        self.host.clone().unwrap_or_else(|| "0.0.0.0".to_string())
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    /// Returns the signing secret, or `None` when unset or blank.
    pub fn secret_key(&self) -> Option<SecretString> {
        self.secret_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SecretString::from)
    }

    pub fn token_ttl_minutes_or_default(&self) -> u64 {
        self.token_ttl_minutes
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES)
    }

    pub fn bcrypt_cost_or_default(&self) -> u32 {
        self.bcrypt_cost.unwrap_or(DEFAULT_BCRYPT_COST)
    }

    pub fn max_body_bytes_or_default(&self) -> usize {
        self.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES)
    }

    pub fn default_page_limit_or_default(&self) -> u32 {
        self.default_page_limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
    }

    /// Allowed CORS origins. Empty means any origin.
    pub fn cors_allowed_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// SMTP settings when EMAIL_HOST is configured.
    pub fn email(&self) -> Option<EmailSettings> {
        let host = self
            .email_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())?
            .to_string();
        let username = self.email_user.clone().filter(|u| !u.is_empty());
        let from = self
            .email_from
            .clone()
            .filter(|f| !f.is_empty())
            .or_else(|| username.clone())
            .unwrap_or_else(|| "no-reply@projectdesk.local".to_string());
        Some(EmailSettings {
            host,
            port: self.email_port.unwrap_or(587),
            username,
            password: self
                .email_pass
                .clone()
                .filter(|p| !p.is_empty())
                .map(SecretString::from),
            from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.port_or_default(), 8083);
        assert_eq!(cfg.host_or_default(), "0.0.0.0");
        assert_eq!(cfg.token_ttl_minutes_or_default(), 120);
        assert_eq!(cfg.default_page_limit_or_default(), 1000);
        assert_eq!(cfg.max_body_bytes_or_default(), 250 * 1024 * 1024);
        assert!(cfg.secret_key().is_none());
        assert!(cfg.email().is_none());
        assert!(cfg.cors_allowed_origins().is_empty());
    }

    #[test]
    fn test_blank_secret_is_missing() {
        let cfg = AppConfig {
            secret_key: Some("   ".into()),
            ..Default::default()
        };
        assert!(cfg.secret_key().is_none());
    }

    #[test]
    fn test_email_from_falls_back_to_user() {
        let cfg = AppConfig {
            email_host: Some("smtp.example.com".into()),
            email_user: Some("bot@example.com".into()),
            ..Default::default()
        };
        let email = cfg.email().unwrap();
        assert_eq!(email.port, 587);
        assert_eq!(email.from, "bot@example.com");
        assert!(email.password.is_none());
    }

    fn prefixed(vars: &[(&str, &str)]) -> config::Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("PROJECTDESK").source(Some(source))
    }

    #[test]
    fn test_prefixed_env_is_read() {
        let cfg = AppConfig::from_sources(
            prefixed(&[("PROJECTDESK_PORT", "9000"), ("PROJECTDESK_SECRET_KEY", "s3cret")]),
            None,
        )
        .unwrap();
        assert_eq!(cfg.port_or_default(), 9000);
        assert_eq!(cfg.secret_key.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_malformed_port_is_an_error() {
        let err = AppConfig::from_sources(prefixed(&[("PROJECTDESK_PORT", "eighty")]), None);
        assert!(err.is_err());
    }

    #[test]
    fn test_cors_origins_split() {
        let cfg = AppConfig {
            cors_allowed_origins: Some(" http://a.test, ,http://b.test ".into()),
            ..Default::default()
        };
        assert_eq!(
            cfg.cors_allowed_origins(),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
