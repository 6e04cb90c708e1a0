//! Round messages exchanged between the two peers.
//!
//! Every message is two bytes: a tag followed by a value. Nothing else travels in a round frame,
//! so a payload of any other length is rejected outright.

use crate::libround::hand::Hand;
use thiserror::Error;

const TAG_READY: u8 = 0x01;
const TAG_CHOICE: u8 = 0x02;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PeerMessage {
    Ready(bool),
    Choice(Hand),
}

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum CodecError {
    #[error("empty payload")]
    Empty,
    #[error("unknown message tag {0:#04x}")]
    UnknownTag(u8),
    #[error("message {tag:#04x} has {len} bytes, expected 2")]
    BadLength { tag: u8, len: usize },
    #[error("invalid readiness value {0:#04x}")]
    InvalidReadiness(u8),
    #[error("invalid hand value {0:#04x}")]
    InvalidHand(u8),
}

fn hand_to_wire(hand: Hand) -> u8 {
    match hand {
        Hand::Rock => 1,
        Hand::Paper => 2,
        Hand::Scissors => 3,
    }
}

fn hand_from_wire(value: u8) -> Result<Hand, CodecError> {
    match value {
        1 => Ok(Hand::Rock),
        2 => Ok(Hand::Paper),
        3 => Ok(Hand::Scissors),
        v => Err(CodecError::InvalidHand(v)),
    }
}

pub fn encode(message: PeerMessage) -> Vec<u8> {
    match message {
        PeerMessage::Ready(flag) => vec![TAG_READY, flag as u8],
        PeerMessage::Choice(hand) => vec![TAG_CHOICE, hand_to_wire(hand)],
    }
}

pub fn decode(payload: &[u8]) -> Result<PeerMessage, CodecError> {
    let (&tag, rest) = payload.split_first().ok_or(CodecError::Empty)?;
    if tag != TAG_READY && tag != TAG_CHOICE {
        return Err(CodecError::UnknownTag(tag));
    }
    let value = match rest {
        [value] => *value,
        _ => {
            return Err(CodecError::BadLength {
                tag,
                len: payload.len(),
            })
        }
    };

    match tag {
        TAG_READY => match value {
            0 => Ok(PeerMessage::Ready(false)),
            1 => Ok(PeerMessage::Ready(true)),
            v => Err(CodecError::InvalidReadiness(v)),
        },
        _ => hand_from_wire(value).map(PeerMessage::Choice),
    }
}
