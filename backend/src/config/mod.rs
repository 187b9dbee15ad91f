//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, token secrets and lifetimes, and the
//! default admin bootstrap credentials.

use anyhow::{Context, Result, bail};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// Secret used to sign access tokens. Must differ from the refresh secret.
    pub access_token_secret: String,
    /// Secret used to sign refresh tokens.
    pub refresh_token_secret: String,
    pub access_token_expires_in_seconds: u64,
    pub refresh_token_expires_in_seconds: u64,
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    /// Marks the refresh cookie `Secure` when true.
    pub cookie_secure: bool,
    pub server_port: u16,
    pub default_admin_name: String,
    pub default_admin_email: String,
    pub default_admin_password: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let access_token_secret =
            env::var("ACCESS_TOKEN_SECRET").context("ACCESS_TOKEN_SECRET not set")?;

        let refresh_token_secret =
            env::var("REFRESH_TOKEN_SECRET").context("REFRESH_TOKEN_SECRET not set")?;

        // A shared secret would let a refresh token pass signature checks at
        // the access gate (and vice versa), so the two must never be equal.
        if access_token_secret == refresh_token_secret {
            bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        }

        let access_token_expires_in_seconds = env::var("ACCESS_TOKEN_EXPIRES_IN_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<u64>()
            .context("ACCESS_TOKEN_EXPIRES_IN_SECONDS must be a valid number")?;

        let refresh_token_expires_in_seconds = env::var("REFRESH_TOKEN_EXPIRES_IN_SECONDS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse::<u64>()
            .context("REFRESH_TOKEN_EXPIRES_IN_SECONDS must be a valid number")?;

        let login_max_attempts = env::var("LOGIN_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("LOGIN_MAX_ATTEMPTS must be a valid number")?;

        let login_window_seconds = env::var("LOGIN_WINDOW_SECONDS")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<u64>()
            .context("LOGIN_WINDOW_SECONDS must be a valid number")?;

        let cookie_secure = env::var("COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .context("COOKIE_SECURE must be true or false")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let default_admin_name =
            env::var("DEFAULT_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());

        let default_admin_email = env::var("DEFAULT_ADMIN_EMAIL")
            .unwrap_or_else(|_| "admin@tasktracker.local".to_string());

        let default_admin_password = env::var("DEFAULT_ADMIN_PASSWORD").ok();

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            access_token_secret,
            refresh_token_secret,
            access_token_expires_in_seconds,
            refresh_token_expires_in_seconds,
            login_max_attempts,
            login_window_seconds,
            cookie_secure,
            server_port,
            default_admin_name,
            default_admin_email,
            default_admin_password,
        })
    }
}
