//! Runs a `RoundEngine` on a single task.
//!
//! User actions, inbound payloads, connection changes and timer events all arrive on one channel
//! and are applied one at a time, so the round state is never mutated concurrently. Timers post
//! back onto the same channel.

use crate::libpeer::link::PeerLink;
use crate::libround::{
    config::RoundTiming,
    engine::{Command, Input, Rejection, RoundEngine, TimerKind},
    message::encode,
    state::RoundState,
};
use log::{debug, warn};
use tokio::{
    sync::{
        mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender, WeakUnboundedSender},
        watch,
    },
    task::JoinHandle,
    time::{self, Duration, Instant},
};

/// What the rest of the program keeps to talk to a running driver.
#[derive(Clone)]
pub struct DriverHandle {
    events: UnboundedSender<Input>,
    view: watch::Receiver<RoundState>,
}

impl DriverHandle {
    pub fn events(&self) -> UnboundedSender<Input> {
        self.events.clone()
    }

    pub fn view(&self) -> watch::Receiver<RoundState> {
        self.view.clone()
    }

    /// Returns false once the driver has stopped.
    pub fn send(&self, input: Input) -> bool {
        self.events.send(input).is_ok()
    }
}

pub struct RoundDriver<L> {
    engine: RoundEngine,
    link: L,
    events: UnboundedReceiver<Input>,
    // Weak so that the driver stops once every handle is dropped.
    loopback: WeakUnboundedSender<Input>,
    timers: Vec<JoinHandle<()>>,
    view: watch::Sender<RoundState>,
}

impl<L: PeerLink> RoundDriver<L> {
    pub fn new(timing: RoundTiming, link: L) -> (Self, DriverHandle) {
        let engine = RoundEngine::new(timing);
        let (tx, rx) = unbounded_channel();
        let (view_tx, view_rx) = watch::channel(engine.state().clone());
        let driver = RoundDriver {
            engine,
            link,
            events: rx,
            loopback: tx.downgrade(),
            timers: Vec::new(),
            view: view_tx,
        };
        let handle = DriverHandle {
            events: tx,
            view: view_rx,
        };
        (driver, handle)
    }

    pub fn state(&self) -> &RoundState {
        self.engine.state()
    }

    pub async fn run(mut self) {
        while let Some(input) = self.events.recv().await {
            self.handle(input);
        }
        debug!("Round driver stopped");
    }

    pub fn handle(&mut self, input: Input) {
        if input == Input::Ready && self.link.connected_peer_count() != 1 {
            warn!("Not getting ready: {}", Rejection::NotConnected);
            return;
        }
        match self.engine.apply(input) {
            Ok(commands) => {
                for command in commands {
                    self.execute(command);
                }
                self.view.send_replace(self.engine.state().clone());
            }
            Err(rejection) => warn!("Action rejected: {}", rejection),
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Send(message) => {
                if let Err(err) = self.link.send(encode(message)) {
                    warn!("Could not send {:?}: {}", message, err);
                }
            }
            Command::ArmTimers { round } => self.arm_timers(round),
            Command::CancelTimers => self.cancel_timers(),
        }
    }

    fn arm_timers(&mut self, round: u64) {
        self.cancel_timers();
        let timing = *self.engine.timing();
        let start = Instant::now();
        self.timers = vec![
            spawn_ticks(self.loopback.clone(), round, start, timing),
            spawn_once(
                self.loopback.clone(),
                round,
                TimerKind::Resolve,
                start + timing.resolve_after(),
            ),
            spawn_once(
                self.loopback.clone(),
                round,
                TimerKind::Reset,
                start + timing.reset_after(),
            ),
        ];
    }

    fn cancel_timers(&mut self) {
        for timer in self.timers.drain(..) {
            timer.abort();
        }
    }
}

impl<L> Drop for RoundDriver<L> {
    fn drop(&mut self) {
        for timer in &self.timers {
            timer.abort();
        }
    }
}

fn post(loopback: &WeakUnboundedSender<Input>, input: Input) -> bool {
    match loopback.upgrade() {
        Some(tx) => tx.send(input).is_ok(),
        None => false,
    }
}

fn spawn_ticks(
    loopback: WeakUnboundedSender<Input>,
    round: u64,
    start: Instant,
    timing: RoundTiming,
) -> JoinHandle<()> {
    let period: Duration = timing.tick();
    tokio::spawn(async move {
        let mut interval = time::interval_at(start + period, period);
        for _ in 0..timing.countdown_from() {
            interval.tick().await;
            let tick = Input::Timer {
                round,
                kind: TimerKind::Tick,
            };
            if !post(&loopback, tick) {
                return;
            }
        }
    })
}

fn spawn_once(
    loopback: WeakUnboundedSender<Input>,
    round: u64,
    kind: TimerKind,
    deadline: Instant,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        time::sleep_until(deadline).await;
        post(&loopback, Input::Timer { round, kind });
    })
}
