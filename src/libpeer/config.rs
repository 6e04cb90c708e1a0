use crate::libround::config::{RoundTiming, TimingError, COUNTDOWN_FROM};
use clap::Args;
use std::time::Duration;

/// Settings shared by both ends of the link.
#[derive(Args, Debug, Clone)]
pub struct PeerArgs {
    /// Name shown to the other player.
    #[arg(short, long, default_value = "player")]
    pub name: String,

    /// Let the program get ready and pick hands on its own.
    #[arg(long)]
    pub auto: bool,

    /// Value the countdown starts from.
    #[arg(long, default_value_t = COUNTDOWN_FROM)]
    pub countdown: u8,

    /// Length of one countdown tick.
    #[arg(long, default_value_t = 1000)]
    pub tick_ms: u64,

    /// Delay from the start of the countdown until the result is evaluated.
    #[arg(long, default_value_t = 4000)]
    pub resolve_ms: u64,

    /// Delay from the start of the countdown until the table resets.
    #[arg(long, default_value_t = 8000)]
    pub reset_ms: u64,
}

impl PeerArgs {
    pub fn timing(&self) -> Result<RoundTiming, TimingError> {
        RoundTiming::new(
            self.countdown,
            Duration::from_millis(self.tick_ms),
            Duration::from_millis(self.resolve_ms),
            Duration::from_millis(self.reset_ms),
        )
    }
}

pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
