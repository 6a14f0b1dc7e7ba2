use std::{env, net::SocketAddr};

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub session_ttl_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://voyara.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:10000".to_string())
            .parse()
            .map_err(|err| ApiError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "720".to_string())
            .parse()
            .map_err(|err| ApiError::Config(format!("invalid SESSION_TTL_HOURS: {err}")))?;

        Ok(Self {
            database_url,
            listen_addr,
            session_ttl_hours,
        })
    }
}
