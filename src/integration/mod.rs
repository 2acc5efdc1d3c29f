use std::env;
use std::fs::File;
use std::str::FromStr;

use dotenv::dotenv;
use log::{LevelFilter, warn};
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};

use crate::auth;

pub mod db;

type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug)]
pub struct Config {
    pub db: db::Config,
    pub auth: auth::Config,
}

impl Default for Config {
    fn default() -> Self {
        dotenv().ok();

        Self {
            db: db::Config::env().unwrap_or_else(|e| {
                warn!("Falling back to default database config: {e}");
                db::Config::default()
            }),
            auth: auth::Config::env().unwrap_or_else(|e| {
                warn!("Falling back to default auth config: {e}");
                auth::Config::default()
            }),
        }
    }
}

impl Config {
    pub fn in_memory(auth: auth::Config) -> Self {
        Self {
            db: db::Config::in_memory(),
            auth,
        }
    }
}

pub fn init_logger() -> anyhow::Result<()> {
    dotenv().ok();

    let rust_log = env::var("RUST_LOG").unwrap_or("info".into());
    let level = LevelFilter::from_str(&rust_log).unwrap_or(LevelFilter::Info);
    let log_file = env::var("SERVICE_NAME")
        .map(|pkg| format!("{pkg}.log"))
        .unwrap_or("guidance.log".into());

    CombinedLogger::init(vec![
        TermLogger::new(
            level,
            simplelog::Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(level, simplelog::Config::default(), File::create(log_file)?),
    ])?;

    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to apply migrations: {0}")]
    Migration(String),

    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
}
