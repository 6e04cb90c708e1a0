use crate::libround::hand::{Hand, Outcome};
use std::fmt;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PeerState {
    NotConnected,
    Connecting,
    Connected { name: String },
}

impl PeerState {
    pub fn is_connected(&self) -> bool {
        matches!(self, PeerState::Connected { .. })
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            PeerState::Connected { name } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerState::NotConnected => write!(f, "Not connected."),
            PeerState::Connecting => write!(f, "Connecting..."),
            PeerState::Connected { name } => write!(f, "Connected to {}.", name),
        }
    }
}

/// Each flag is only ever set by its own side.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Readiness {
    pub local: bool,
    pub remote: bool,
}

impl Readiness {
    pub fn both(&self) -> bool {
        self.local && self.remote
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoundPhase {
    Idle,
    Countdown,
    Resolving,
    ShowingResult,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ScoreTally {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl ScoreTally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Won => self.wins += 1,
            Outcome::Lost => self.losses += 1,
            Outcome::Tie => self.draws += 1,
        }
    }
}

impl fmt::Display for ScoreTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W {} / L {} / D {}", self.wins, self.losses, self.draws)
    }
}

/// What the opponent's side of the table shows.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PeerDisplay {
    Waiting,
    Counting(u8),
    Revealed(Option<Hand>),
}

/// The line telling the local player what to do next.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Status {
    ConnectToPeer,
    WaitingOnBoth,
    PeerReady(String),
    WaitingOnPeer(String),
    MakeSelection(u8),
    TimeUp,
    Finished(Outcome),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::ConnectToPeer => write!(f, "Connect with a nearby player to begin."),
            Status::WaitingOnBoth => write!(f, "Waiting on both players to get ready."),
            Status::PeerReady(name) => write!(f, "{} is ready. Type \"ready\" to begin.", name),
            Status::WaitingOnPeer(name) => write!(f, "Waiting on {} to get ready.", name),
            Status::MakeSelection(n) => write!(f, "Make your selection: {}", n),
            Status::TimeUp => write!(f, "Time's up!"),
            Status::Finished(Outcome::Won) => write!(f, "You won! Nice work!"),
            Status::Finished(Outcome::Lost) => write!(f, "You lost! Better luck next time."),
            Status::Finished(Outcome::Tie) => write!(f, "It's a tie. Great minds think alike!"),
        }
    }
}

/// One snapshot of everything a device knows about the current round.
///
/// Snapshots are only produced by `engine::transition`; everything outside the engine reads them.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RoundState {
    pub(crate) peer: PeerState,
    pub(crate) readiness: Readiness,
    // Peer readiness that arrived before our own reset finished.
    pub(crate) deferred_remote_ready: Option<bool>,
    pub(crate) phase: RoundPhase,
    pub(crate) countdown: u8,
    pub(crate) local_choice: Option<Hand>,
    pub(crate) remote_choice: Option<Hand>,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) score: ScoreTally,
    pub(crate) peer_display: PeerDisplay,
    pub(crate) status: Status,
    pub(crate) round: u64,
}

impl RoundState {
    pub fn new(countdown_from: u8) -> Self {
        RoundState {
            peer: PeerState::NotConnected,
            readiness: Readiness::default(),
            deferred_remote_ready: None,
            phase: RoundPhase::Idle,
            countdown: countdown_from,
            local_choice: None,
            remote_choice: None,
            outcome: None,
            score: ScoreTally::default(),
            peer_display: PeerDisplay::Waiting,
            status: Status::ConnectToPeer,
            round: 0,
        }
    }

    pub fn peer(&self) -> &PeerState {
        &self.peer
    }
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }
    pub fn countdown(&self) -> u8 {
        self.countdown
    }
    pub fn local_choice(&self) -> Option<Hand> {
        self.local_choice
    }
    pub fn remote_choice(&self) -> Option<Hand> {
        self.remote_choice
    }
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
    pub fn score(&self) -> ScoreTally {
        self.score
    }
    pub fn peer_display(&self) -> PeerDisplay {
        self.peer_display
    }
    pub fn status(&self) -> &Status {
        &self.status
    }
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn choices_enabled(&self) -> bool {
        self.phase == RoundPhase::Countdown && self.countdown > 0
    }

    pub fn ready_enabled(&self) -> bool {
        self.peer.is_connected() && self.phase == RoundPhase::Idle && !self.readiness.local
    }

    /// Status for an idle table, one message per readiness combination.
    pub(crate) fn idle_status(&self) -> Status {
        let name = match self.peer.name() {
            Some(name) => name.to_string(),
            None => return Status::ConnectToPeer,
        };
        match (self.readiness.local, self.readiness.remote) {
            (false, false) => Status::WaitingOnBoth,
            (false, true) => Status::PeerReady(name),
            (true, false) => Status::WaitingOnPeer(name),
            (true, true) => Status::MakeSelection(self.countdown),
        }
    }
}
