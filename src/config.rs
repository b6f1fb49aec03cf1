//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

use crate::{error::ConfigError, state::TimerConfig};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "interval-timer")]
#[command(about = "Interval workout timer with a background runner and HTTP control")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Work interval in seconds (5-900)
    #[arg(short, long, default_value = "45")]
    pub work: u32,

    /// Rest interval in seconds (5-300)
    #[arg(short, long, default_value = "15")]
    pub rest: u32,

    /// Number of rounds (1-99)
    #[arg(long, default_value = "8")]
    pub rounds: u32,

    /// Run rounds until reset
    #[arg(long)]
    pub unlimited: bool,

    /// Skip rest intervals
    #[arg(long)]
    pub no_rest: bool,

    /// Countdown before the first interval in seconds (3-10)
    #[arg(short, long, default_value = "5")]
    pub countdown: u32,

    /// Tick period of both engines in milliseconds
    #[arg(long, default_value = "100")]
    pub tick_ms: u64,

    /// Connectivity debounce window in milliseconds
    #[arg(long, default_value = "300")]
    pub debounce_ms: u64,

    /// Do not announce audio cues
    #[arg(long)]
    pub mute: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// The default workout, validated
    pub fn timer_config(&self) -> Result<TimerConfig, ConfigError> {
        TimerConfig::new(
            self.work,
            self.rest,
            self.rounds,
            self.unlimited,
            self.no_rest,
            self.countdown,
        )
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
