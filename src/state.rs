use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;
use sha2::{Digest, Sha512};
use tower_cookies::Key;

use crate::clients::upstream::UpstreamClient;
use crate::config::Config;
use crate::error::{AppError, Result};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The Redis connection manager (session store).
    pub redis: ConnectionManager,
    /// The application's configuration.
    pub config: Config,
    /// The upstream school-management API client.
    pub upstream: UpstreamClient,
    /// The key signing session cookies.
    pub cookie_key: Key,
}

/// Derives the cookie signing key from the configured secret.
pub fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        crate::db::ensure_schema(&db).await?;
        tracing::info!("✅ PostgreSQL Pool initialized with deadpool-postgres");

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis Connection Manager initialized (sessions)");

        let upstream = UpstreamClient::new(config)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        tracing::info!("✅ Upstream client ready for {}", config.api_hostname);

        Ok(AppState {
            db,
            redis,
            config: config.clone(),
            upstream,
            cookie_key: cookie_key(&config.secret_key),
        })
    }
}
