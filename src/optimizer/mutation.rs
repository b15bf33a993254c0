use crate::error::{TfResult, TriadForgeError};
use crate::geometry::LayoutMask;
use crate::layouts::Layout;
use fastrand::Rng;

/// Swaps a random number of mask-eligible slot pairs.
///
/// The eligible slots are collected once, so each swap samples an index
/// directly instead of retrying until it lands on an allowed slot.
#[derive(Debug, Clone)]
pub struct Mutator {
    eligible: Vec<usize>,
    min_swaps: usize,
    max_swaps: usize,
}

impl Mutator {
    pub fn new(mask: &LayoutMask, min_swaps: usize, max_swaps: usize) -> TfResult<Self> {
        let eligible = mask.eligible_positions();
        if eligible.len() < 2 {
            return Err(TriadForgeError::Config(format!(
                "mask allows {} position(s); at least 2 are needed to swap",
                eligible.len()
            )));
        }
        if min_swaps > max_swaps {
            return Err(TriadForgeError::Config(format!(
                "min_swaps ({}) is greater than max_swaps ({})",
                min_swaps, max_swaps
            )));
        }
        Ok(Self {
            eligible,
            min_swaps,
            max_swaps,
        })
    }

    pub fn eligible(&self) -> &[usize] {
        &self.eligible
    }

    /// Applies the swaps in place and returns how many were made. Pairs are
    /// drawn independently per swap, so a later swap may undo an earlier one.
    pub fn mutate(&self, layout: &mut Layout, rng: &mut Rng) -> usize {
        let swaps = rng.usize(self.min_swaps..=self.max_swaps);
        let n = self.eligible.len();

        for _ in 0..swaps {
            let a = rng.usize(0..n);
            // Draw from the n-1 remaining slots and skip over `a`.
            let mut b = rng.usize(0..n - 1);
            if b >= a {
                b += 1;
            }
            layout.swap(self.eligible[a], self.eligible[b]);
        }
        swaps
    }
}
