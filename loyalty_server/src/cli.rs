use clap::Parser;

pub const DEFAULT_RUN_ADDRESS: &str = "localhost:8080";
pub const DEFAULT_DATABASE_URI: &str = "sqlite://data/loyalty.db";

/// Command-line flags. Each one has an environment variable counterpart, and the environment variable wins when both
/// are given.
#[derive(Parser, Debug, Default)]
#[command(version, about = "Loyalty points gateway")]
pub struct Arguments {
    /// Address to listen on, as host:port or :port [env: RUN_ADDRESS]
    #[arg(short = 'a', long = "address")]
    pub run_address: Option<String>,
    /// Database connection URI, sqlite: or postgres: [env: DATABASE_URI]
    #[arg(short = 'd', long = "database")]
    pub database_uri: Option<String>,
    /// Base address of the accrual system [env: ACCRUAL_SYSTEM_ADDRESS]
    #[arg(short = 'r', long = "accrual")]
    pub accrual_address: Option<String>,
}
