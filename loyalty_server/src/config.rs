//! Server configuration.
//!
//! The three deployment settings (listen address, database and accrual system address) come from command-line flags
//! or their environment variable counterparts, with the environment taking precedence:
//!
//! | flag | environment variable     | default                    |
//! |------|--------------------------|----------------------------|
//! | `-a` | `RUN_ADDRESS`            | `localhost:8080`           |
//! | `-d` | `DATABASE_URI`           | `sqlite://data/loyalty.db` |
//! | `-r` | `ACCRUAL_SYSTEM_ADDRESS` | none, this one is required |
//!
//! A listen address without a host, such as `:8080`, listens on every interface. `DATABASE_URI` may be a `sqlite:` or
//! a `postgres:` URL.
//!
//! Everything else is tuned with `LPG_*` environment variables. Malformed values fall back to the default with a
//! warning:
//! * `LPG_COOKIE_SECRET`: The key used to sign session cookies. A random key is used if it is not set, which logs
//!   every user out whenever the server restarts.
//! * `LPG_USE_X_FORWARDED_FOR`: Report the `X-Forwarded-For` address, rather than the peer address, when logging
//!   failed logins. Only switch this on behind a proxy you trust.
//! * `LPG_TICK_INTERVAL_MS`, `LPG_RECHECK_INTERVAL_MS`, `LPG_RESCAN_INTERVAL_SECS`, `LPG_INTAKE_CAPACITY`: Order
//!   tracker tuning.
//! * `LPG_ACCRUAL_TIMEOUT_SECS`, `LPG_ACCRUAL_DEFAULT_RETRY_SECS`: Accrual client tuning.
use std::env;

use accrual_client::AccrualConfig;
use log::*;
use loyalty_engine::TrackerConfig;
use lpg_common::{parse_boolean_flag, Secret};
use rand::RngCore;

use crate::{
    cli::{Arguments, DEFAULT_DATABASE_URI, DEFAULT_RUN_ADDRESS},
    errors::ServerError,
};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// `host:port` to bind to
    pub run_address: String,
    pub database_url: String,
    pub accrual: AccrualConfig,
    pub tracker: TrackerConfig,
    pub cookie_secret: Secret<String>,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
}

impl ServerConfig {
    pub fn from_args_and_env(args: Arguments) -> Result<Self, ServerError> {
        let run_address =
            prefer_env("RUN_ADDRESS", args.run_address).map(normalize_listen_address).unwrap_or_else(|| {
                info!("🪛️ No listen address was given. Using the default, {DEFAULT_RUN_ADDRESS}.");
                DEFAULT_RUN_ADDRESS.to_string()
            });
        let database_url = prefer_env("DATABASE_URI", args.database_uri).unwrap_or_else(|| {
            info!("🪛️ No database URI was given. Using the default, {DEFAULT_DATABASE_URI}.");
            DEFAULT_DATABASE_URI.to_string()
        });
        let accrual_address = prefer_env("ACCRUAL_SYSTEM_ADDRESS", args.accrual_address).ok_or_else(|| {
            ServerError::ConfigurationError(
                "The accrual system address is required. Set ACCRUAL_SYSTEM_ADDRESS or pass -r.".to_string(),
            )
        })?;
        let accrual = AccrualConfig::new(&accrual_address).with_env_tuning();
        let tracker = TrackerConfig::new_from_env_or_default();
        let cookie_secret = cookie_secret_from_env_or_random();
        let use_x_forwarded_for = parse_boolean_flag(env::var("LPG_USE_X_FORWARDED_FOR").ok(), false);
        Ok(Self { run_address, database_url, accrual, tracker, cookie_secret, use_x_forwarded_for })
    }
}

/// The environment variable if it is set and not blank, the command-line value otherwise.
fn prefer_env(name: &str, flag: Option<String>) -> Option<String> {
    select_setting(env::var(name).ok(), flag)
}

fn select_setting(env_value: Option<String>, flag: Option<String>) -> Option<String> {
    env_value.filter(|s| !s.trim().is_empty()).or(flag).filter(|s| !s.trim().is_empty())
}

/// Addresses without a host, like `:8080`, listen on every interface.
fn normalize_listen_address(address: String) -> String {
    let address = address.trim();
    match address.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => address.to_string(),
    }
}

fn cookie_secret_from_env_or_random() -> Secret<String> {
    match env::var("LPG_COOKIE_SECRET") {
        Ok(s) if !s.is_empty() => Secret::new(s),
        _ => {
            warn!(
                "🚨️🚨️🚨️ LPG_COOKIE_SECRET has not been set. I'm using a random value for this session. Every user \
                 will be logged out when the server restarts. 🚨️🚨️🚨️"
            );
            let mut key = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut key);
            Secret::new(base64::encode(key))
        },
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for }
    }
}
