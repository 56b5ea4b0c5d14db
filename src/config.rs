use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub jwt_secret: String,
    pub email_relay_url: String,
    pub email_from: String,
    pub fcm_send_url: String,
    pub fcm_server_key: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
            database_acquire_timeout_secs: get_env_parsed_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?,
            jwt_secret: get_env("JWT_SECRET")?,
            email_relay_url: get_env("EMAIL_RELAY_URL")?,
            email_from: get_env("EMAIL_FROM")?,
            fcm_send_url: get_env("FCM_SEND_URL")?,
            fcm_server_key: get_env("FCM_SERVER_KEY")?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parsed_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("Invalid value for {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_settings_fall_back_to_defaults() {
        env::remove_var("TEST_POOL_SIZE_UNSET");
        assert_eq!(
            get_env_parsed_or::<u32>("TEST_POOL_SIZE_UNSET", 10).unwrap(),
            10
        );

        env::set_var("TEST_POOL_SIZE_SET", "32");
        assert_eq!(get_env_parsed_or::<u32>("TEST_POOL_SIZE_SET", 10).unwrap(), 32);

        env::set_var("TEST_POOL_SIZE_BAD", "lots");
        assert!(matches!(
            get_env_parsed_or::<u32>("TEST_POOL_SIZE_BAD", 10),
            Err(Error::Config(_))
        ));
    }
}
