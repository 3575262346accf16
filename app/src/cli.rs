use clap::Parser;
use std::time::Duration;

use crate::app::lib::{client, miner, pow};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// chain server to talk to, defaults to http://127.0.0.1:5000
    #[arg(short, long)]
    pub server: Option<String>,
    /// table cells longer than this get shortened, defaults to 40
    #[arg(short, long)]
    pub trim_length: Option<usize>,
    /// rejected submissions with this status keep mining going, defaults to 401
    #[arg(short, long)]
    pub recoverable_status: Vec<u16>,
    /// highest nonce tried before giving up on a block
    #[arg(long)]
    pub max_nonce: Option<u64>,
    /// pause after an accepted block in milliseconds, defaults to 250
    #[arg(long)]
    pub cooldown_ms: Option<u64>,
    /// delay before reporting that mining went idle in seconds, defaults to 5
    #[arg(long)]
    pub idle_notice_secs: Option<u64>,
    /// log filter used when RUST_LOG is not set, defaults to "info"
    #[arg(short, long)]
    pub log_level: Option<String>,
}

pub struct Config {
    pub server: String,
    pub trim_length: usize,
    pub recoverable_status: Vec<u16>,
    pub max_nonce: u64,
    pub cooldown: Duration,
    pub idle_notice_delay: Duration,
    pub log_level: String,
}

impl Cli {
    pub fn get_config(&self) -> anyhow::Result<Config> {
        const DEFAULT_TRIM_LENGTH: usize = 40;
        let server = self
            .server
            .clone()
            .unwrap_or_else(|| client::DEFAULT_SERVER.into());
        // Parse early so a typo fails at startup, not on the first request.
        check_server(&server)?;
        let recoverable_status = if self.recoverable_status.is_empty() {
            vec![miner::DEFAULT_RECOVERABLE_STATUS]
        } else {
            self.recoverable_status.clone()
        };
        let cooldown = self
            .cooldown_ms
            .map(Duration::from_millis)
            .unwrap_or(miner::DEFAULT_COOLDOWN);
        let idle_notice_delay = self
            .idle_notice_secs
            .map(Duration::from_secs)
            .unwrap_or(miner::DEFAULT_IDLE_NOTICE_DELAY);
        Ok(Config {
            server,
            trim_length: self.trim_length.unwrap_or(DEFAULT_TRIM_LENGTH),
            recoverable_status,
            max_nonce: self.max_nonce.unwrap_or(pow::DEFAULT_MAX_NONCE),
            cooldown,
            idle_notice_delay,
            log_level: self.log_level.clone().unwrap_or_else(|| "info".into()),
        })
    }
}

fn check_server(server: &str) -> anyhow::Result<()> {
    client::HttpChainService::new(server)?;
    Ok(())
}
