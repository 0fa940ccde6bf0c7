// src/config/mod.rs
// All tunables come from the environment (with a .env file as a convenience);
// every value has a default so the demo runs out of the box.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::str::FromStr;

use crate::session::CookieConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct CaskConfig {
    // ── Server Configuration
    pub host: String,
    pub port: u16,

    // ── Database Configuration
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Session Configuration
    pub session_timeout: i64,
    pub cookie_key: String,
    pub cookie_domain: String,
    pub cookie_path: String,
    pub cookie_secure: bool,
    pub cookie_httponly: bool,

    // ── Store Garbage Collection
    pub gc_auto: bool,
    pub gc_auto_prob: f64,

    // ── Logging Configuration
    pub log_level: String,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => match val.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                default
            }
        },
        Err(_) => default,
    }
}

impl CaskConfig {
    pub fn from_env() -> Self {
        // Load from .env file first if it exists
        let _ = dotenvy::dotenv();

        Self {
            host: env_var_or("CASK_HOST", "0.0.0.0".to_string()),
            port: env_var_or("CASK_PORT", 8080),
            database_url: env_var_or("DATABASE_URL", "sqlite:./cask.db?mode=rwc".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 10),
            session_timeout: env_var_or("CASK_SESSION_TIMEOUT", 24 * 60 * 60),
            cookie_key: env_var_or("CASK_COOKIE_KEY", "cask.session.id".to_string()),
            cookie_domain: env_var_or("CASK_COOKIE_DOMAIN", String::new()),
            cookie_path: env_var_or("CASK_COOKIE_PATH", "/".to_string()),
            cookie_secure: env_var_or("CASK_COOKIE_SECURE", false),
            cookie_httponly: env_var_or("CASK_COOKIE_HTTPONLY", false),
            gc_auto: env_var_or("CASK_GC_AUTO", true),
            gc_auto_prob: env_var_or("CASK_GC_AUTO_PROB", 0.001),
            log_level: env_var_or("CASK_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Cookie settings in the form the session layer consumes
    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig {
            key: self.cookie_key.clone(),
            domain: (!self.cookie_domain.is_empty()).then(|| self.cookie_domain.clone()),
            path: (!self.cookie_path.is_empty()).then(|| self.cookie_path.clone()),
            secure: self.cookie_secure,
            httponly: self.cookie_httponly,
        }
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<CaskConfig> = Lazy::new(CaskConfig::from_env);
