//! The round state machine.
//!
//! Every trigger (a local action, an inbound payload, a peer-state change, a timer) is an
//! `Input`. `transition` folds one input into the current snapshot and returns the next one
//! together with the side effects the caller must carry out. It never touches the network or the
//! clock itself, so both peers' engines can be driven side by side in tests.

use crate::libround::{
    config::RoundTiming,
    hand::{resolve, Hand},
    message::{decode, PeerMessage},
    state::{PeerDisplay, PeerState, Readiness, RoundPhase, RoundState, ScoreTally, Status},
};
use log::{debug, info, warn};
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerKind {
    Tick,
    Resolve,
    Reset,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Input {
    Ready,
    Choose(Hand),
    PeerState(PeerState),
    Received(Vec<u8>),
    Timer { round: u64, kind: TimerKind },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Command {
    Send(PeerMessage),
    /// Start the tick, resolve and reset timers for `round`, dropping any previous set.
    ArmTimers { round: u64 },
    CancelTimers,
}

/// A local action that is not allowed right now. The snapshot is left untouched.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Rejection {
    #[error("no peer is connected")]
    NotConnected,
    #[error("a round is already in progress")]
    NotIdle,
    #[error("hands can only be chosen during the countdown")]
    NotCountingDown,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transition {
    pub state: RoundState,
    pub commands: Vec<Command>,
}

pub fn transition(
    state: &RoundState,
    input: Input,
    timing: &RoundTiming,
) -> Result<Transition, Rejection> {
    let mut next = state.clone();
    let mut commands = Vec::new();

    match input {
        Input::Ready => set_local_ready(&mut next, &mut commands)?,
        Input::Choose(hand) => choose_hand(&mut next, hand, &mut commands)?,
        Input::PeerState(peer) => peer_state_changed(&mut next, peer, timing, &mut commands),
        Input::Received(payload) => match decode(&payload) {
            Ok(PeerMessage::Ready(flag)) => remote_ready(&mut next, flag, &mut commands),
            Ok(PeerMessage::Choice(hand)) => remote_choice(&mut next, hand),
            Err(err) => warn!("Dropping message {:?}: {}", payload, err),
        },
        Input::Timer { round, kind } if round != next.round => {
            debug!("Ignoring stale {:?} timer of round {}", kind, round);
        }
        Input::Timer { kind, .. } => match kind {
            TimerKind::Tick => tick(&mut next),
            TimerKind::Resolve => resolve_round(&mut next),
            TimerKind::Reset => reset_round(&mut next, timing, &mut commands),
        },
    }

    Ok(Transition {
        state: next,
        commands,
    })
}

fn set_local_ready(state: &mut RoundState, commands: &mut Vec<Command>) -> Result<(), Rejection> {
    if !state.peer.is_connected() {
        return Err(Rejection::NotConnected);
    }
    if state.phase != RoundPhase::Idle {
        return Err(Rejection::NotIdle);
    }
    if state.readiness.local {
        return Ok(());
    }
    state.readiness.local = true;
    commands.push(Command::Send(PeerMessage::Ready(true)));
    evaluate_readiness(state, commands);
    Ok(())
}

fn remote_ready(state: &mut RoundState, flag: bool, commands: &mut Vec<Command>) {
    if !state.peer.is_connected() {
        warn!("Readiness received without a connected peer");
        return;
    }
    if state.phase != RoundPhase::Idle {
        debug!("Peer readiness {} deferred until this round resets", flag);
        state.deferred_remote_ready = Some(flag);
        return;
    }
    state.readiness.remote = flag;
    evaluate_readiness(state, commands);
}

fn evaluate_readiness(state: &mut RoundState, commands: &mut Vec<Command>) {
    if state.readiness.both() {
        start_countdown(state, commands);
    } else {
        state.status = state.idle_status();
    }
}

fn start_countdown(state: &mut RoundState, commands: &mut Vec<Command>) {
    state.round += 1;
    state.phase = RoundPhase::Countdown;
    state.local_choice = None;
    state.remote_choice = None;
    state.outcome = None;
    state.peer_display = PeerDisplay::Counting(state.countdown);
    state.status = Status::MakeSelection(state.countdown);
    debug!("Round {} started", state.round);
    commands.push(Command::ArmTimers { round: state.round });
}

// Repeated choices overwrite the previous one and are sent again; the peer keeps the last one
// that reaches it before it resolves.
fn choose_hand(
    state: &mut RoundState,
    hand: Hand,
    commands: &mut Vec<Command>,
) -> Result<(), Rejection> {
    if !state.choices_enabled() {
        return Err(Rejection::NotCountingDown);
    }
    state.local_choice = Some(hand);
    commands.push(Command::Send(PeerMessage::Choice(hand)));
    Ok(())
}

fn remote_choice(state: &mut RoundState, hand: Hand) {
    match state.phase {
        RoundPhase::Countdown | RoundPhase::Resolving => state.remote_choice = Some(hand),
        phase => debug!("Dropping peer choice {} received while {:?}", hand, phase),
    }
}

/// Counts down by one. The tick reaching 0 shows `Status::TimeUp` instead of a zero counter and
/// hands the round over to the resolve timer.
fn tick(state: &mut RoundState) {
    if state.phase != RoundPhase::Countdown || state.countdown == 0 {
        return;
    }
    state.countdown -= 1;
    state.peer_display = PeerDisplay::Counting(state.countdown);
    if state.countdown > 0 {
        state.status = Status::MakeSelection(state.countdown);
    } else {
        state.phase = RoundPhase::Resolving;
        state.status = Status::TimeUp;
    }
}

fn resolve_round(state: &mut RoundState) {
    if state.phase != RoundPhase::Resolving {
        debug!("Resolve timer fired while {:?}", state.phase);
        return;
    }
    state.peer_display = PeerDisplay::Revealed(state.remote_choice);
    state.outcome = resolve(state.local_choice, state.remote_choice);
    match state.outcome {
        Some(outcome) => {
            state.score.record(outcome);
            state.status = Status::Finished(outcome);
            info!(
                "Round {}: {:?} vs {:?} -> {:?}",
                state.round, state.local_choice, state.remote_choice, outcome
            );
        }
        // Any unset side leaves the round unscored.
        None => info!(
            "Round {}: {:?} vs {:?} is not scored",
            state.round, state.local_choice, state.remote_choice
        ),
    }
    state.phase = RoundPhase::ShowingResult;
}

fn reset_round(state: &mut RoundState, timing: &RoundTiming, commands: &mut Vec<Command>) {
    if !matches!(state.phase, RoundPhase::Resolving | RoundPhase::ShowingResult) {
        debug!("Reset timer fired while {:?}", state.phase);
        return;
    }
    clear_round(state, timing);
    state.readiness = Readiness {
        local: false,
        remote: state.deferred_remote_ready.take().unwrap_or(false),
    };
    state.status = state.idle_status();
    commands.push(Command::CancelTimers);
}

fn peer_state_changed(
    state: &mut RoundState,
    peer: PeerState,
    timing: &RoundTiming,
    commands: &mut Vec<Command>,
) {
    info!("{}", peer);
    // Invalidate every timer armed so far, even if the driver fails to abort it.
    state.round += 1;
    commands.push(Command::CancelTimers);
    clear_round(state, timing);
    state.readiness = Readiness::default();
    state.deferred_remote_ready = None;
    if peer == PeerState::NotConnected {
        state.score = ScoreTally::default();
    }
    state.peer = peer;
    state.status = state.idle_status();
}

fn clear_round(state: &mut RoundState, timing: &RoundTiming) {
    state.phase = RoundPhase::Idle;
    state.countdown = timing.countdown_from();
    state.local_choice = None;
    state.remote_choice = None;
    state.outcome = None;
    state.peer_display = PeerDisplay::Waiting;
}

/// Owns the current snapshot and replaces it after every accepted input.
pub struct RoundEngine {
    state: RoundState,
    timing: RoundTiming,
}

impl RoundEngine {
    pub fn new(timing: RoundTiming) -> Self {
        RoundEngine {
            state: RoundState::new(timing.countdown_from()),
            timing,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn timing(&self) -> &RoundTiming {
        &self.timing
    }

    pub fn apply(&mut self, input: Input) -> Result<Vec<Command>, Rejection> {
        let Transition { state, commands } = transition(&self.state, input, &self.timing)?;
        self.state = state;
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libround::{hand::Outcome, message::encode};
    use pretty_assertions::assert_eq;

    fn engine() -> RoundEngine {
        RoundEngine::new(RoundTiming::default())
    }

    fn connected() -> RoundEngine {
        let mut e = engine();
        e.apply(Input::PeerState(PeerState::Connected {
            name: "Bob".to_string(),
        }))
        .unwrap();
        e
    }

    fn receive(e: &mut RoundEngine, message: PeerMessage) -> Vec<Command> {
        e.apply(Input::Received(encode(message))).unwrap()
    }

    fn fire(e: &mut RoundEngine, kind: TimerKind) {
        let round = e.state().round();
        e.apply(Input::Timer { round, kind }).unwrap();
    }

    fn counting_down() -> RoundEngine {
        let mut e = connected();
        e.apply(Input::Ready).unwrap();
        receive(&mut e, PeerMessage::Ready(true));
        assert_eq!(e.state().phase(), RoundPhase::Countdown);
        e
    }

    fn run_countdown(e: &mut RoundEngine) {
        for _ in 0..e.timing().countdown_from() {
            fire(e, TimerKind::Tick);
        }
    }

    #[test]
    fn test_ready_requires_peer() {
        let mut e = engine();
        assert_eq!(e.apply(Input::Ready), Err(Rejection::NotConnected));
        assert_eq!(e.state().readiness(), Readiness::default());
    }

    #[test]
    fn test_local_ready_announces_once() {
        let mut e = connected();
        assert_eq!(e.apply(Input::Ready), Ok(vec![Command::Send(PeerMessage::Ready(true))]));
        let before = e.state().clone();
        assert_eq!(e.apply(Input::Ready), Ok(vec![]));
        assert_eq!(e.state(), &before);
        assert_eq!(e.state().status(), &Status::WaitingOnPeer("Bob".to_string()));
        assert_eq!(e.state().phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_both_ready_starts_countdown() {
        let mut e = connected();
        assert_eq!(receive(&mut e, PeerMessage::Ready(true)), vec![]);
        assert_eq!(e.state().status(), &Status::PeerReady("Bob".to_string()));

        let commands = e.apply(Input::Ready).unwrap();
        assert_eq!(
            commands,
            vec![
                Command::Send(PeerMessage::Ready(true)),
                Command::ArmTimers {
                    round: e.state().round()
                },
            ]
        );
        assert_eq!(e.state().phase(), RoundPhase::Countdown);
        assert_eq!(e.state().status(), &Status::MakeSelection(3));
        assert!(e.state().choices_enabled());
    }

    #[test]
    fn test_remote_not_ready_keeps_idle() {
        let mut e = connected();
        e.apply(Input::Ready).unwrap();
        receive(&mut e, PeerMessage::Ready(false));
        assert_eq!(e.state().phase(), RoundPhase::Idle);
        assert_eq!(e.state().status(), &Status::WaitingOnPeer("Bob".to_string()));
    }

    #[test]
    fn test_choose_outside_countdown_is_rejected() {
        let mut e = connected();
        assert_eq!(e.apply(Input::Choose(Hand::Rock)), Err(Rejection::NotCountingDown));
        let mut e = counting_down();
        run_countdown(&mut e);
        assert_eq!(e.apply(Input::Choose(Hand::Rock)), Err(Rejection::NotCountingDown));
        assert_eq!(e.state().local_choice(), None);
    }

    #[test]
    fn test_choice_overwrites_and_resends() {
        let mut e = counting_down();
        assert_eq!(
            e.apply(Input::Choose(Hand::Rock)),
            Ok(vec![Command::Send(PeerMessage::Choice(Hand::Rock))])
        );
        assert_eq!(
            e.apply(Input::Choose(Hand::Paper)),
            Ok(vec![Command::Send(PeerMessage::Choice(Hand::Paper))])
        );
        assert_eq!(e.state().local_choice(), Some(Hand::Paper));
    }

    #[test]
    fn test_ticks_count_down_to_resolving() {
        let mut e = counting_down();
        fire(&mut e, TimerKind::Tick);
        assert_eq!(e.state().status(), &Status::MakeSelection(2));
        assert_eq!(e.state().peer_display(), PeerDisplay::Counting(2));
        fire(&mut e, TimerKind::Tick);
        assert_eq!(e.state().status(), &Status::MakeSelection(1));
        fire(&mut e, TimerKind::Tick);
        assert_eq!(e.state().countdown(), 0);
        assert_eq!(e.state().phase(), RoundPhase::Resolving);
        assert_eq!(e.state().status(), &Status::TimeUp);
        assert!(!e.state().choices_enabled());

        // Extra ticks do nothing.
        let before = e.state().clone();
        fire(&mut e, TimerKind::Tick);
        assert_eq!(e.state(), &before);
    }

    #[test]
    fn test_resolve_scores_win() {
        let mut e = counting_down();
        e.apply(Input::Choose(Hand::Paper)).unwrap();
        receive(&mut e, PeerMessage::Choice(Hand::Rock));
        run_countdown(&mut e);
        fire(&mut e, TimerKind::Resolve);
        assert_eq!(e.state().phase(), RoundPhase::ShowingResult);
        assert_eq!(e.state().outcome(), Some(Outcome::Won));
        assert_eq!(e.state().status(), &Status::Finished(Outcome::Won));
        assert_eq!(e.state().peer_display(), PeerDisplay::Revealed(Some(Hand::Rock)));
        assert_eq!(
            e.state().score(),
            ScoreTally {
                wins: 1,
                losses: 0,
                draws: 0
            }
        );
    }

    #[test]
    fn test_resolve_with_missing_local_choice_is_unscored() {
        let mut e = counting_down();
        receive(&mut e, PeerMessage::Choice(Hand::Scissors));
        run_countdown(&mut e);
        fire(&mut e, TimerKind::Resolve);
        assert_eq!(e.state().phase(), RoundPhase::ShowingResult);
        assert_eq!(e.state().outcome(), None);
        assert_eq!(e.state().score(), ScoreTally::default());
        assert_eq!(e.state().status(), &Status::TimeUp);
    }

    #[test]
    fn test_resolve_before_countdown_ends_is_ignored() {
        let mut e = counting_down();
        fire(&mut e, TimerKind::Resolve);
        assert_eq!(e.state().phase(), RoundPhase::Countdown);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut e = counting_down();
        e.apply(Input::Choose(Hand::Rock)).unwrap();
        run_countdown(&mut e);
        fire(&mut e, TimerKind::Resolve);
        let round = e.state().round();
        assert_eq!(
            e.apply(Input::Timer {
                round,
                kind: TimerKind::Reset
            }),
            Ok(vec![Command::CancelTimers])
        );
        let s = e.state();
        assert_eq!(s.phase(), RoundPhase::Idle);
        assert_eq!(s.readiness(), Readiness::default());
        assert_eq!(s.countdown(), 3);
        assert_eq!(s.local_choice(), None);
        assert_eq!(s.remote_choice(), None);
        assert_eq!(s.status(), &Status::WaitingOnBoth);
        assert!(s.ready_enabled());
    }

    #[test]
    fn test_early_peer_ready_survives_reset() {
        let mut e = counting_down();
        run_countdown(&mut e);
        fire(&mut e, TimerKind::Resolve);
        receive(&mut e, PeerMessage::Ready(true));
        assert_eq!(e.state().phase(), RoundPhase::ShowingResult);

        fire(&mut e, TimerKind::Reset);
        assert_eq!(
            e.state().readiness(),
            Readiness {
                local: false,
                remote: true
            }
        );
        assert_eq!(e.state().status(), &Status::PeerReady("Bob".to_string()));
    }

    #[test]
    fn test_late_peer_choice_is_dropped() {
        let mut e = counting_down();
        run_countdown(&mut e);
        fire(&mut e, TimerKind::Resolve);
        receive(&mut e, PeerMessage::Choice(Hand::Rock));
        assert_eq!(e.state().remote_choice(), None);
    }

    #[test]
    fn test_disconnect_mid_round() {
        let mut e = counting_down();
        e.apply(Input::Choose(Hand::Rock)).unwrap();
        receive(&mut e, PeerMessage::Choice(Hand::Scissors));
        run_countdown(&mut e);
        fire(&mut e, TimerKind::Resolve);
        assert_eq!(e.state().score().wins, 1);
        let stale_round = e.state().round();

        assert_eq!(
            e.apply(Input::PeerState(PeerState::NotConnected)),
            Ok(vec![Command::CancelTimers])
        );
        let after = e.state().clone();
        assert_eq!(after.phase(), RoundPhase::Idle);
        assert_eq!(after.readiness(), Readiness::default());
        assert_eq!(after.score(), ScoreTally::default());
        assert_eq!(after.status(), &Status::ConnectToPeer);

        e.apply(Input::Timer {
            round: stale_round,
            kind: TimerKind::Reset,
        })
        .unwrap();
        assert_eq!(e.state(), &after);
    }

    #[test]
    fn test_connecting_keeps_score() {
        let mut e = counting_down();
        e.apply(Input::Choose(Hand::Rock)).unwrap();
        receive(&mut e, PeerMessage::Choice(Hand::Rock));
        run_countdown(&mut e);
        fire(&mut e, TimerKind::Resolve);
        assert_eq!(
            e.apply(Input::PeerState(PeerState::Connecting)),
            Ok(vec![Command::CancelTimers])
        );
        assert_eq!(e.state().score().draws, 1);
        assert_eq!(e.state().readiness(), Readiness::default());
        assert_eq!(e.state().phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_garbage_payload_changes_nothing() {
        let mut e = counting_down();
        let before = e.state().clone();
        assert_eq!(e.apply(Input::Received(vec![0x02, 0x09])), Ok(vec![]));
        assert_eq!(e.apply(Input::Received(b"true".to_vec())), Ok(vec![]));
        assert_eq!(e.state(), &before);
    }
}
