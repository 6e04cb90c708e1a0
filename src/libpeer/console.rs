use crate::libround::{
    engine::Input,
    hand::Hand,
    state::{PeerDisplay, RoundPhase, RoundState},
};
use log::debug;
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::{mpsc::UnboundedSender, watch},
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Action {
    Ready,
    Choose(Hand),
    Quit,
    Help,
    Error(String),
}

pub const HELP: &str = "Commands: ready, rock, paper, scissors, quit";

pub fn parse(line: &str) -> Action {
    match &*line.trim().to_lowercase() {
        "ready" => Action::Ready,
        "rock" => Action::Choose(Hand::Rock),
        "paper" => Action::Choose(Hand::Paper),
        "scissors" => Action::Choose(Hand::Scissors),
        "quit" | "exit" => Action::Quit,
        "help" | "" => Action::Help,
        other => Action::Error(other.to_string()),
    }
}

fn hand_or_nothing(hand: Option<Hand>) -> &'static str {
    hand.map_or("nothing", Hand::name)
}

/// One line summarising the table, redrawn after every transition.
pub fn render(state: &RoundState) -> String {
    let theirs = match state.peer_display() {
        PeerDisplay::Waiting => "-".to_string(),
        PeerDisplay::Counting(n) => format!("[{}]", n),
        PeerDisplay::Revealed(hand) => hand_or_nothing(hand).to_string(),
    };
    let yours = match state.local_choice() {
        Some(hand) => hand.name(),
        None if state.phase() == RoundPhase::ShowingResult => "nothing",
        None => "-",
    };
    format!(
        "{} | {} | them: {} | you: {} | {}",
        state.peer(),
        state.score(),
        theirs,
        yours,
        state.status()
    )
}

/// Prints the table whenever the rendered line changes. Returns when the driver stops.
pub async fn render_updates(mut view: watch::Receiver<RoundState>) {
    let mut last = String::new();
    loop {
        let line = render(&view.borrow_and_update());
        if line != last {
            println!("{}", line);
            last = line;
        }
        if view.changed().await.is_err() {
            return;
        }
    }
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn read_commands(events: UnboundedSender<Input>) {
    println!("{}", HELP);
    let mut lines = BufReader::new(io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let input = match parse(&line) {
            Action::Ready => Input::Ready,
            Action::Choose(hand) => Input::Choose(hand),
            Action::Quit => return,
            Action::Help => {
                println!("{}", HELP);
                continue;
            }
            Action::Error(word) => {
                println!("Unknown command \"{}\". {}", word, HELP);
                continue;
            }
        };
        if events.send(input).is_err() {
            debug!("Round driver is gone, no longer reading commands");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libround::state::PeerState;

    #[test]
    fn test_parse() {
        assert_eq!(parse("ready"), Action::Ready);
        assert_eq!(parse("  Rock\n"), Action::Choose(Hand::Rock));
        assert_eq!(parse("PAPER"), Action::Choose(Hand::Paper));
        assert_eq!(parse("scissors"), Action::Choose(Hand::Scissors));
        assert_eq!(parse("quit"), Action::Quit);
        assert_eq!(parse(""), Action::Help);
        assert_eq!(parse("lizard"), Action::Error("lizard".to_string()));
    }

    #[test]
    fn test_render_idle_table() {
        let state = RoundState::new(3);
        assert_eq!(
            render(&state),
            "Not connected. | W 0 / L 0 / D 0 | them: - | you: - | Connect with a nearby player to begin."
        );
        assert_eq!(state.peer(), &PeerState::NotConnected);
    }
}
