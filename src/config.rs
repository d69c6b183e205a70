use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// Default path segment between the upstream host and the tenant.
pub const DEFAULT_API_ROOT: &str = "SophiAWebApi";

/// Longest admin session accepted from `SESSION_DURATION_DAYS`.
pub const MAX_SESSION_DURATION_DAYS: i64 = 365;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The upstream tenant identifier.
    pub tenant: String,
    /// The upstream API username.
    pub api_user: String,
    /// The upstream API password.
    pub api_password: Zeroizing<String>,
    /// The upstream API hostname.
    pub api_hostname: String,
    /// The path segment between hostname and tenant.
    pub api_root: String,
    /// The password that unlocks the administrative views.
    pub admin_password: Zeroizing<String>,
    /// The secret used to sign session cookies.
    pub secret_key: Zeroizing<String>,
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The duration of an admin session in days.
    pub session_duration_days: i64,
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a new `Config` from an arbitrary key lookup.
    ///
    /// Every required key must be present and non-blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{} must be set", key))
        };

        let session_duration_days: i64 = lookup("SESSION_DURATION_DAYS")
            .unwrap_or_else(|| "7".to_string())
            .parse()
            .context("Invalid SESSION_DURATION_DAYS")?;
        anyhow::ensure!(
            (1..=MAX_SESSION_DURATION_DAYS).contains(&session_duration_days),
            "SESSION_DURATION_DAYS must be between 1 and {}, got {}",
            MAX_SESSION_DURATION_DAYS,
            session_duration_days
        );

        Ok(Self {
            tenant: required("UPSTREAM_TENANT")?,
            api_user: required("UPSTREAM_USER")?,
            api_password: Zeroizing::new(required("UPSTREAM_PASSWORD")?),
            api_hostname: required("UPSTREAM_API_HOSTNAME")?,
            api_root: lookup("UPSTREAM_API_ROOT")
                .unwrap_or_else(|| DEFAULT_API_ROOT.to_string()),
            admin_password: Zeroizing::new(required("ADMIN_PASSWORD")?),
            secret_key: Zeroizing::new(required("SECRET_KEY")?),
            database_url: required("DATABASE_URL")?,
            redis_url: lookup("REDIS_URL")
                .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            session_duration_days,
            bind_addr: lookup("BIND_ADDR")
                .unwrap_or_else(|| "127.0.0.1:3000".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            secure_cookies: lookup("APP_ENV")
                .unwrap_or_else(|| "development".to_string())
                == "production",
        })
    }

    /// The upstream base URL, `https://<host>/<api-root>/<tenant>`.
    pub fn api_base_url(&self) -> String {
        format!(
            "https://{}/{}/{}",
            self.api_hostname, self.api_root, self.tenant
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("UPSTREAM_TENANT", "1234".to_string()),
            ("UPSTREAM_USER", "desk".to_string()),
            ("UPSTREAM_PASSWORD", "api-secret".to_string()),
            ("UPSTREAM_API_HOSTNAME", "portal.example.com".to_string()),
            ("ADMIN_PASSWORD", "letmein".to_string()),
            ("SECRET_KEY", "session-secret".to_string()),
            ("DATABASE_URL", "postgres://localhost/pickup".to_string()),
        ])
    }

    #[test]
    fn test_loads_with_defaults() {
        let vars = full_env();
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(
            config.api_base_url(),
            "https://portal.example.com/SophiAWebApi/1234"
        );
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.session_duration_days, 7);
        assert_eq!(config.bind_addr.port(), 3000);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_every_required_key_is_fatal_when_missing() {
        for key in full_env().keys() {
            let mut vars = full_env();
            vars.remove(key);
            let err = Config::from_lookup(|k| vars.get(k).cloned())
                .err()
                .expect("missing key must fail");
            assert!(err.to_string().contains(key), "{}", err);
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = full_env();
        vars.insert("ADMIN_PASSWORD", "   ".to_string());
        assert!(Config::from_lookup(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn test_session_duration_must_be_in_range() {
        for bad in ["0", "-3", "366", "999999999999", "week"] {
            let mut vars = full_env();
            vars.insert("SESSION_DURATION_DAYS", bad.to_string());
            let err = Config::from_lookup(|k| vars.get(k).cloned())
                .err()
                .expect("out-of-range duration must fail");
            assert!(err.to_string().contains("SESSION_DURATION_DAYS"), "{}", err);
        }

        let mut vars = full_env();
        vars.insert("SESSION_DURATION_DAYS", "365".to_string());
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.session_duration_days, 365);
    }

    #[test]
    fn test_production_enables_secure_cookies() {
        let mut vars = full_env();
        vars.insert("APP_ENV", "production".to_string());
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert!(config.secure_cookies);
    }
}
