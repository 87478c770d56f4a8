use std::{env, sync::Arc};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub auth: AuthSettings,
}

/// Token signing settings shared with the auth extractor.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: Arc<str>,
    pub token_ttl_hours: i64,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<Arc<str>>, token_ttl_hours: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_hours,
        }
    }
}

/// `DATABASE_URL`, shared by the server and the maintenance binaries.
pub fn database_url() -> anyhow::Result<String> {
    env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = database_url()?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let token_ttl_hours = env::var("JWT_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        Ok(Self {
            port,
            database_url,
            host,
            auth: AuthSettings::new(jwt_secret, token_ttl_hours),
        })
    }
}
