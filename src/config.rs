use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_LISTING_PRICE_CENTS: i64 = 1000;
pub const DEFAULT_LISTING_CURRENCY: &str = "usd";
pub const DEFAULT_UPLOADS_DIR: &str = "./uploads";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub webhook_secret: String,
    pub payment_api_url: String,
    pub payment_api_key: String,
    pub webapp_url: String,
    pub public_rps: u32,
    pub employer_rps: u32,
    pub listing_price_cents: i64,
    pub listing_currency: String,
    pub uploads_dir: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let listing_price_cents = match env::var("LISTING_PRICE_CENTS") {
            Ok(_) => get_env_parse("LISTING_PRICE_CENTS")?,
            Err(_) => DEFAULT_LISTING_PRICE_CENTS,
        };
        if listing_price_cents <= 0 {
            return Err(Error::Config(
                "LISTING_PRICE_CENTS must be positive".to_string(),
            ));
        }

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            webhook_secret: get_env("WEBHOOK_SECRET")?,
            payment_api_url: get_env("PAYMENT_API_URL")?,
            payment_api_key: get_env("PAYMENT_API_KEY")?,
            webapp_url: get_env("WEBAPP_URL")?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            employer_rps: get_env_parse("EMPLOYER_RPS")?,
            listing_price_cents,
            listing_currency: env::var("LISTING_CURRENCY")
                .unwrap_or_else(|_| DEFAULT_LISTING_CURRENCY.to_string()),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| DEFAULT_UPLOADS_DIR.to_string()),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
