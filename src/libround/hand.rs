use std::fmt;

pub const HANDS: [Hand; 3] = [Hand::Rock, Hand::Paper, Hand::Scissors];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    /// The hand this one defeats.
    pub fn beats(self) -> Hand {
        match self {
            Hand::Rock => Hand::Scissors,
            Hand::Scissors => Hand::Paper,
            Hand::Paper => Hand::Rock,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Hand::Rock => "rock",
            Hand::Paper => "paper",
            Hand::Scissors => "scissors",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Won,
    Lost,
    Tie,
}

/// Classifies a round from the local player's perspective.
///
/// Returns `None` whenever either side is unset, including when both are. Such rounds are not
/// scored: a player who never chose does not automatically lose.
pub fn resolve(mine: Option<Hand>, theirs: Option<Hand>) -> Option<Outcome> {
    let (mine, theirs) = (mine?, theirs?);
    if mine == theirs {
        Some(Outcome::Tie)
    } else if mine.beats() == theirs {
        Some(Outcome::Won)
    } else {
        Some(Outcome::Lost)
    }
}
