use std::time::Duration;
use thiserror::Error;

pub const COUNTDOWN_FROM: u8 = 3;
pub const TICK_PERIOD: Duration = Duration::from_secs(1);
pub const RESOLVE_AFTER: Duration = Duration::from_secs(4);
pub const RESET_AFTER: Duration = Duration::from_secs(8);

/// Delays of the three per-round timers, all measured from the moment the countdown starts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RoundTiming {
    countdown_from: u8,
    tick: Duration,
    resolve_after: Duration,
    reset_after: Duration,
}

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum TimingError {
    #[error("countdown must start at 1 or more")]
    ZeroCountdown,
    #[error("tick period must be positive")]
    ZeroTick,
    #[error("resolve delay {resolve:?} must be at least one tick past the last tick at {countdown:?}")]
    ResolveTooEarly { countdown: Duration, resolve: Duration },
    #[error("reset delay {reset:?} must exceed the resolve delay {resolve:?}")]
    ResetBeforeResolve { resolve: Duration, reset: Duration },
}

impl RoundTiming {
    pub fn new(
        countdown_from: u8,
        tick: Duration,
        resolve_after: Duration,
        reset_after: Duration,
    ) -> Result<RoundTiming, TimingError> {
        if countdown_from == 0 {
            return Err(TimingError::ZeroCountdown);
        }
        if tick.is_zero() {
            return Err(TimingError::ZeroTick);
        }
        // The last tick and the resolve timer are separate tasks; keep a full tick between them.
        let countdown = tick * u32::from(countdown_from);
        if resolve_after < countdown + tick {
            return Err(TimingError::ResolveTooEarly {
                countdown,
                resolve: resolve_after,
            });
        }
        if reset_after <= resolve_after {
            return Err(TimingError::ResetBeforeResolve {
                resolve: resolve_after,
                reset: reset_after,
            });
        }
        Ok(RoundTiming {
            countdown_from,
            tick,
            resolve_after,
            reset_after,
        })
    }

    pub fn countdown_from(&self) -> u8 {
        self.countdown_from
    }
    pub fn tick(&self) -> Duration {
        self.tick
    }
    pub fn resolve_after(&self) -> Duration {
        self.resolve_after
    }
    pub fn reset_after(&self) -> Duration {
        self.reset_after
    }
}

impl Default for RoundTiming {
    fn default() -> Self {
        RoundTiming {
            countdown_from: COUNTDOWN_FROM,
            tick: TICK_PERIOD,
            resolve_after: RESOLVE_AFTER,
            reset_after: RESET_AFTER,
        }
    }
}
