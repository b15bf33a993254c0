use crate::error::{TfResult, TriadForgeError};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter};

/// Number of physical key slots in the modeled board.
pub const NUM_KEYS: usize = 47;

/// Number of rows in the row-transition table.
pub const NUM_ROWS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Hand {
    Left,
    Right,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum Row {
    Number = 0,
    Top = 1,
    Home = 2,
    Bottom = 3,
}

/// Finger rank. The derived ordering (pinky lowest, thumb highest) drives the
/// ascending/descending analysis of the effort model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum Finger {
    Pinky,
    Ring,
    Middle,
    Index,
    Thumb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub hand: Hand,
    pub row: Row,
    pub finger: Finger,
}

const fn key(hand: Hand, row: Row, finger: Finger) -> KeyInfo {
    KeyInfo { hand, row, finger }
}

use Finger::{Index, Middle, Pinky, Ring};
use Hand::{Left, Right};

/// Hand/row/finger for every slot, in slot order. Row lengths are 13/13/11/10.
pub static KEY_INFO: [KeyInfo; NUM_KEYS] = [
    // Number row
    key(Left, Row::Number, Pinky),
    key(Left, Row::Number, Ring),
    key(Left, Row::Number, Ring),
    key(Left, Row::Number, Middle),
    key(Left, Row::Number, Index),
    key(Left, Row::Number, Index),
    key(Left, Row::Number, Index),
    key(Right, Row::Number, Index),
    key(Right, Row::Number, Middle),
    key(Right, Row::Number, Middle),
    key(Right, Row::Number, Ring),
    key(Right, Row::Number, Pinky),
    key(Right, Row::Number, Pinky),
    // Top row
    key(Left, Row::Top, Pinky),
    key(Left, Row::Top, Ring),
    key(Left, Row::Top, Middle),
    key(Left, Row::Top, Index),
    key(Left, Row::Top, Index),
    key(Right, Row::Top, Index),
    key(Right, Row::Top, Index),
    key(Right, Row::Top, Middle),
    key(Right, Row::Top, Ring),
    key(Right, Row::Top, Pinky),
    key(Right, Row::Top, Pinky),
    key(Right, Row::Top, Pinky),
    key(Right, Row::Top, Pinky),
    // Home row
    key(Left, Row::Home, Pinky),
    key(Left, Row::Home, Ring),
    key(Left, Row::Home, Middle),
    key(Left, Row::Home, Index),
    key(Left, Row::Home, Index),
    key(Right, Row::Home, Index),
    key(Right, Row::Home, Index),
    key(Right, Row::Home, Middle),
    key(Right, Row::Home, Ring),
    key(Right, Row::Home, Pinky),
    key(Right, Row::Home, Pinky),
    // Bottom row
    key(Left, Row::Bottom, Pinky),
    key(Left, Row::Bottom, Ring),
    key(Left, Row::Bottom, Middle),
    key(Left, Row::Bottom, Index),
    key(Left, Row::Bottom, Index),
    key(Right, Row::Bottom, Index),
    key(Right, Row::Bottom, Index),
    key(Right, Row::Bottom, Middle),
    key(Right, Row::Bottom, Ring),
    key(Right, Row::Bottom, Pinky),
];

/// Row-transition cost tiers indexed by the rows of the three keys of a triad.
/// 0 = same row repeated, up to 6 = the worst row jumps.
pub static ROW_FLAG_TABLE: [[[u8; NUM_ROWS]; NUM_ROWS]; NUM_ROWS] = [
    [[0, 1, 1, 1], [3, 1, 4, 4], [5, 5, 1, 4], [5, 5, 5, 1]],
    [[2, 3, 5, 5], [2, 0, 1, 1], [5, 3, 1, 4], [5, 5, 5, 1]],
    [[2, 5, 5, 5], [6, 2, 3, 5], [2, 2, 0, 1], [5, 5, 3, 1]],
    [[2, 5, 5, 5], [6, 2, 5, 5], [6, 6, 2, 3], [2, 2, 2, 0]],
];

/// Slots whose characters the optimizer may move: the three letter rows
/// minus the bracket/backslash/quote/punctuation keys around them.
const STANDARD_MASK: [bool; NUM_KEYS] = {
    let mut mask = [false; NUM_KEYS];
    let mut i = 13;
    while i <= 22 {
        mask[i] = true;
        i += 1;
    }
    i = 26;
    while i <= 35 {
        mask[i] = true;
        i += 1;
    }
    i = 37;
    while i <= 43 {
        mask[i] = true;
        i += 1;
    }
    mask
};

#[inline(always)]
pub fn key_info(pos: usize) -> &'static KeyInfo {
    &KEY_INFO[pos]
}

/// Marks which slots may take part in swaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMask {
    allowed: [bool; NUM_KEYS],
}

impl Default for LayoutMask {
    fn default() -> Self {
        Self::standard()
    }
}

impl LayoutMask {
    pub fn standard() -> Self {
        Self {
            allowed: STANDARD_MASK,
        }
    }

    pub fn all() -> Self {
        Self {
            allowed: [true; NUM_KEYS],
        }
    }

    pub fn from_positions(positions: &[usize]) -> TfResult<Self> {
        let mut allowed = [false; NUM_KEYS];
        for &p in positions {
            if p >= NUM_KEYS {
                return Err(TriadForgeError::Config(format!(
                    "mask position {} is outside 0..{}",
                    p, NUM_KEYS
                )));
            }
            allowed[p] = true;
        }
        Ok(Self { allowed })
    }

    /// Parses a 47-character string of `0`/`1` flags. Whitespace is ignored so
    /// the mask can be written row by row.
    pub fn parse(s: &str) -> TfResult<Self> {
        let flags: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if flags.len() != NUM_KEYS {
            return Err(TriadForgeError::Config(format!(
                "mask has {} flags, expected {}",
                flags.len(),
                NUM_KEYS
            )));
        }
        let mut allowed = [false; NUM_KEYS];
        for (i, c) in flags.into_iter().enumerate() {
            allowed[i] = match c {
                '1' => true,
                '0' => false,
                other => {
                    return Err(TriadForgeError::Config(format!(
                        "invalid mask flag '{}' at slot {}",
                        other, i
                    )))
                }
            };
        }
        Ok(Self { allowed })
    }

    #[inline(always)]
    pub fn allows(&self, pos: usize) -> bool {
        self.allowed[pos]
    }

    pub fn eligible_positions(&self) -> Vec<usize> {
        (0..NUM_KEYS).filter(|&p| self.allowed[p]).collect()
    }

    pub fn count(&self) -> usize {
        self.allowed.iter().filter(|&&a| a).count()
    }
}
