use anyhow::Context;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub host_passcode: String,
    pub event_name: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env is fine in production, the variables come from the environment.
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host_passcode = env::var("HOST_PASSCODE")
            .ok()
            .filter(|p| !p.is_empty())
            .context("HOST_PASSCODE should be provided")?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "debug".into());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
        let event_name = env::var("EVENT_NAME").unwrap_or_else(|_| "Our Celebration".into());

        Ok(Self {
            database_url,
            rust_log,
            bind_addr,
            host_passcode,
            event_name,
        })
    }
}
