use crate::libround::{
    engine::Input,
    hand::{Hand, HANDS},
    state::RoundState,
};
use log::info;
use rand::seq::SliceRandom;
use tokio::sync::{mpsc::UnboundedSender, watch};

/// What the automatic player wants to do given the current table, if anything.
pub fn next_move(state: &RoundState, last_round: Option<u64>, hand: Hand) -> Option<Input> {
    if state.ready_enabled() {
        Some(Input::Ready)
    } else if state.choices_enabled()
        && state.local_choice().is_none()
        && last_round != Some(state.round())
    {
        Some(Input::Choose(hand))
    } else {
        None
    }
}

/// Plays on its own: gets ready whenever it can and picks a random hand once per round.
pub async fn autoplay(events: UnboundedSender<Input>, mut view: watch::Receiver<RoundState>) {
    let mut last_round = None;
    loop {
        let hand = *HANDS.choose(&mut rand::thread_rng()).unwrap_or(&Hand::Rock);
        let (input, round) = {
            let state = view.borrow_and_update();
            (next_move(&state, last_round, hand), state.round())
        };
        if let Some(input) = input {
            if let Input::Choose(hand) = input {
                info!("Auto player picks {}", hand);
                last_round = Some(round);
            }
            if events.send(input).is_err() {
                return;
            }
        }
        if view.changed().await.is_err() {
            return;
        }
    }
}
