use super::loader::BaseEffort;
use super::physics::{triad_effort, StrokeModel};
use crate::geometry::NUM_KEYS;
use crate::layouts::{Layout, NO_POSITION};

const NUM_KEYS_SQ: usize = NUM_KEYS * NUM_KEYS;
pub const CACHE_SIZE: usize = NUM_KEYS * NUM_KEYS_SQ;

/// Memo of triad effort keyed by slot triple. Entries depend on geometry
/// only, so one cache serves every layout of a run. NaN marks "not yet computed".
#[derive(Clone)]
pub struct EffortCache {
    table: Box<[f64]>,
    filled: usize,
}

impl Default for EffortCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EffortCache {
    pub fn new() -> Self {
        Self {
            table: vec![f64::NAN; CACHE_SIZE].into_boxed_slice(),
            filled: 0,
        }
    }

    #[inline(always)]
    pub fn index(p1: usize, p2: usize, p3: usize) -> usize {
        p1 * NUM_KEYS_SQ + p2 * NUM_KEYS + p3
    }

    #[inline(always)]
    pub fn get(&self, p1: usize, p2: usize, p3: usize) -> Option<f64> {
        let v = self.table[Self::index(p1, p2, p3)];
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    #[inline(always)]
    pub fn get_or_insert_with<F: FnOnce() -> f64>(
        &mut self,
        p1: usize,
        p2: usize,
        p3: usize,
        compute: F,
    ) -> f64 {
        let slot = &mut self.table[Self::index(p1, p2, p3)];
        if slot.is_nan() {
            *slot = compute();
            self.filled += 1;
        }
        *slot
    }

    /// Number of computed entries.
    pub fn filled(&self) -> usize {
        self.filled
    }
}

/// Hot path of the optimizer: sum of effort x count over every triad,
/// divided by the total triad count. Performs no allocation.
pub fn score_layout(
    cache: &mut EffortCache,
    base: &BaseEffort,
    model: StrokeModel,
    triads: &[([u8; 3], u64)],
    total: u64,
    layout: &Layout,
) -> f64 {
    let mut sum = 0.0;

    for (triad, count) in triads {
        let p1 = layout.raw_position(triad[0]);
        let p2 = layout.raw_position(triad[1]);
        let p3 = layout.raw_position(triad[2]);

        // Characters without a slot contribute nothing but still count in `total`.
        if p1 == NO_POSITION || p2 == NO_POSITION || p3 == NO_POSITION {
            continue;
        }

        let (p1, p2, p3) = (p1 as usize, p2 as usize, p3 as usize);
        let effort =
            cache.get_or_insert_with(p1, p2, p3, || triad_effort(base, model, p1, p2, p3));
        sum += effort * (*count as f64);
    }

    if total == 0 {
        return 0.0;
    }
    sum / total as f64
}
