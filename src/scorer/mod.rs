pub mod engine;
pub mod loader;
pub mod physics;

use self::engine::EffortCache;
pub use self::loader::BaseEffort;
pub use self::physics::StrokeModel;
use crate::corpus::TriadIndex;
use crate::error::{TfResult, TriadForgeError};
use crate::geometry::NUM_KEYS;
use crate::layouts::Layout;
use tracing::debug;

/// LayoutEvaluator: base effort, the triad table flattened for the hot loop,
/// and the effort memo. Cloning gives each search its own private cache.
#[derive(Clone)]
pub struct Scorer {
    base: BaseEffort,
    stroke_model: StrokeModel,
    cache: EffortCache,

    // --- Triad data (flat, read-only) ---
    triads: Vec<([u8; 3], u64)>,
    total: u64,
}

impl Scorer {
    pub fn new(base: BaseEffort, index: &TriadIndex) -> TfResult<Self> {
        Self::with_stroke_model(base, index, StrokeModel::default())
    }

    pub fn with_stroke_model(
        base: BaseEffort,
        index: &TriadIndex,
        stroke_model: StrokeModel,
    ) -> TfResult<Self> {
        if index.is_empty() || index.total() == 0 {
            return Err(TriadForgeError::Corpus(
                "triad index is empty; nothing to score against".to_string(),
            ));
        }

        let triads: Vec<([u8; 3], u64)> = index.iter().map(|(t, c)| (*t, *c)).collect();
        debug!(
            "Scorer ready: {} distinct triads, {} total, stroke model {:?}",
            triads.len(),
            index.total(),
            stroke_model
        );

        Ok(Self {
            base,
            stroke_model,
            cache: EffortCache::new(),
            triads,
            total: index.total(),
        })
    }

    /// Memoized effort of the slot triple.
    #[inline]
    pub fn triad_effort(&mut self, p1: usize, p2: usize, p3: usize) -> f64 {
        let base = &self.base;
        let model = self.stroke_model;
        self.cache.get_or_insert_with(p1, p2, p3, || {
            physics::triad_effort(base, model, p1, p2, p3)
        })
    }

    pub fn score(&mut self, layout: &Layout) -> f64 {
        engine::score_layout(
            &mut self.cache,
            &self.base,
            self.stroke_model,
            &self.triads,
            self.total,
            layout,
        )
    }

    /// Fills every cache entry up front instead of lazily.
    pub fn precompute(&mut self) {
        for p1 in 0..NUM_KEYS {
            for p2 in 0..NUM_KEYS {
                for p3 in 0..NUM_KEYS {
                    self.triad_effort(p1, p2, p3);
                }
            }
        }
    }

    pub fn total_triads(&self) -> u64 {
        self.total
    }

    pub fn distinct_triads(&self) -> usize {
        self.triads.len()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.filled()
    }

    pub fn base(&self) -> &BaseEffort {
        &self.base
    }

    pub fn stroke_model(&self) -> StrokeModel {
        self.stroke_model
    }
}
