use crate::error::{TfResult, TriadForgeError};
use crate::geometry::NUM_KEYS;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// The 47 characters every layout is a permutation of, in qwerty slot order.
pub const ALPHABET: &[u8; NUM_KEYS] = b"`1234567890-=qwertyuiop[]\\asdfghjkl;'zxcvbnm,./";

/// Marks a character with no slot in the inverse map.
pub const NO_POSITION: u8 = 255;

/// Character at every slot plus the inverse (character -> slot) map.
/// Both halves are updated together, so the inverse is always current.
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    keys: [u8; NUM_KEYS],
    positions: [u8; 256],
}

impl Layout {
    pub fn qwerty() -> Self {
        Self::from_keys(*ALPHABET)
    }

    fn from_keys(keys: [u8; NUM_KEYS]) -> Self {
        let mut layout = Self {
            keys,
            positions: [NO_POSITION; 256],
        };
        layout.rebuild_positions();
        layout
    }

    /// Validates that `bytes` is a permutation of [`ALPHABET`].
    pub fn from_bytes(bytes: &[u8]) -> TfResult<Self> {
        if bytes.len() != NUM_KEYS {
            return Err(TriadForgeError::Layout(format!(
                "layout has {} keys, expected {}",
                bytes.len(),
                NUM_KEYS
            )));
        }

        let mut in_alphabet = [false; 256];
        for &c in ALPHABET.iter() {
            in_alphabet[c as usize] = true;
        }

        let mut seen = [false; 256];
        let mut keys = [0u8; NUM_KEYS];
        for (i, &c) in bytes.iter().enumerate() {
            if !in_alphabet[c as usize] {
                return Err(TriadForgeError::Layout(format!(
                    "character {:?} at slot {} is not part of the layout alphabet",
                    c as char, i
                )));
            }
            if seen[c as usize] {
                return Err(TriadForgeError::Layout(format!(
                    "character {:?} appears more than once",
                    c as char
                )));
            }
            seen[c as usize] = true;
            keys[i] = c;
        }

        Ok(Self::from_keys(keys))
    }

    fn rebuild_positions(&mut self) {
        self.positions = [NO_POSITION; 256];
        for (i, &c) in self.keys.iter().enumerate() {
            self.positions[c as usize] = i as u8;
        }
    }

    #[inline(always)]
    pub fn position_of(&self, c: u8) -> Option<usize> {
        match self.positions[c as usize] {
            NO_POSITION => None,
            p => Some(p as usize),
        }
    }

    /// Raw inverse lookup for the scoring hot loop; [`NO_POSITION`] when absent.
    #[inline(always)]
    pub fn raw_position(&self, c: u8) -> u8 {
        self.positions[c as usize]
    }

    #[inline(always)]
    pub fn key_at(&self, pos: usize) -> u8 {
        self.keys[pos]
    }

    #[inline(always)]
    pub fn swap(&mut self, a: usize, b: usize) {
        self.keys.swap(a, b);
        self.positions[self.keys[a] as usize] = a as u8;
        self.positions[self.keys[b] as usize] = b as u8;
    }

    pub fn as_bytes(&self) -> &[u8; NUM_KEYS] {
        &self.keys
    }

    pub fn as_str(&self) -> &str {
        // Every byte comes from ALPHABET, which is printable ASCII.
        std::str::from_utf8(&self.keys).unwrap_or_default()
    }

    /// True when the characters are exactly the alphabet, each once.
    pub fn is_permutation(&self) -> bool {
        let mut sorted = self.keys;
        sorted.sort_unstable();
        let mut expected = *ALPHABET;
        expected.sort_unstable();
        sorted == expected
    }

    /// Parses either a [`KnownLayout`] name or a literal 47-character layout.
    pub fn resolve(input: &str) -> TfResult<Self> {
        if let Ok(known) = KnownLayout::from_str(&input.to_lowercase()) {
            return Ok(known.layout());
        }
        Self::from_bytes(input.as_bytes())
    }
}

impl FromStr for Layout {
    type Err = TriadForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Layout({:?})", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum KnownLayout {
    Qwerty,
    Dvorak,
    Colemak,
    Workman,
    Bulpkm,
    Xfyl,
    Test,
}

impl KnownLayout {
    // Full 47-key row stagger: number, top, home and bottom rows in slot order.
    pub fn get_str(&self) -> &'static str {
        match self {
            Self::Qwerty => "`1234567890-=qwertyuiop[]\\asdfghjkl;'zxcvbnm,./",
            Self::Dvorak => "`1234567890[]',.pyfgcrl/=\\aoeuidhtns-;qjkxbmwvz",
            Self::Colemak => "`1234567890-=qwfpgjluy;[]\\arstdhneio'zxcvbkm,./",
            Self::Workman => "`1234567890-=qdrwbjfup;[]\\ashtgyneoi'zxmcvkl,./",
            Self::Bulpkm => "`1234567890-='bulpkmyf;[]\\riaohdtensjzxcvqgw,./",
            Self::Xfyl => "`1234567890-=xfyljkpuw;[]\\asinhdtero'zb.mqgc,v/",
            Self::Test => "`1234567890-=tkpb'oqc,.[]\\r/;sxfzvgwluyemdnihja",
        }
    }

    pub fn layout(&self) -> Layout {
        let mut keys = [0u8; NUM_KEYS];
        keys.copy_from_slice(self.get_str().as_bytes());
        Layout::from_keys(keys)
    }
}

pub fn get_all_layouts() -> HashMap<KnownLayout, Layout> {
    let mut map = HashMap::new();
    for layout in KnownLayout::iter() {
        map.insert(layout, layout.layout());
    }
    map
}
