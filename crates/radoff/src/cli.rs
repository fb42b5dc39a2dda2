use clap::Parser;

/// Poll Radoff cloud air-quality sensors and print their readings.
#[derive(Debug, Parser)]
#[command(name = "radoff", version, about)]
pub struct Cli {
    /// Cloud account username.
    #[arg(long, env = "RADOFF_USERNAME")]
    pub username: String,

    /// Cloud account password.
    #[arg(long, env = "RADOFF_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Identity provider app client id.
    #[arg(long, env = "RADOFF_CLIENT_ID")]
    pub client_id: String,

    /// Identity pool id (e.g. "eu-west-1_AbCdEfGh").
    #[arg(long, env = "RADOFF_POOL_ID")]
    pub pool_id: String,

    /// Identity pool region (e.g. "eu-west-1").
    #[arg(long, env = "RADOFF_POOL_REGION")]
    pub pool_region: String,

    /// Poll interval in seconds (minimum 10).
    #[arg(long, default_value_t = radoff_core::DEFAULT_POLL_INTERVAL_SECS)]
    pub interval: u64,

    /// Keep polling and print each new snapshot (default: poll once).
    #[arg(long)]
    pub watch: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
