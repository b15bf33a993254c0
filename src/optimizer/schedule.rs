use crate::error::{TfResult, TriadForgeError};
use fastrand::Rng;

/// Acceptance draws are integers in `0..=ACCEPT_RESOLUTION`, compared against `p * ACCEPT_RESOLUTION`,
/// so even `p = 1` turns down one draw in `ACCEPT_RESOLUTION + 1`.
pub const ACCEPT_RESOLUTION: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Strictly better than the accepted layout.
    Improved,
    /// Not better, but let through by the probability test.
    Accepted,
    Rejected,
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        !matches!(self, Decision::Rejected)
    }
}

/// Exponential cooling `t = t0 * exp(-i * k / iterations)` with acceptance
/// `p = min(1, p0 * exp(-|delta| / t))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealSchedule {
    t0: f64,
    p0: f64,
    k: f64,
}

impl AnnealSchedule {
    pub fn new(t0: f64, p0: f64, k: f64) -> TfResult<Self> {
        if !t0.is_finite() || t0 <= 0.0 {
            return Err(TriadForgeError::Config(format!(
                "initial temperature must be positive and finite (got {})",
                t0
            )));
        }
        if !p0.is_finite() || p0 < 0.0 {
            return Err(TriadForgeError::Config(format!(
                "p0 must be non-negative and finite (got {})",
                p0
            )));
        }
        if !k.is_finite() || k < 0.0 {
            return Err(TriadForgeError::Config(format!(
                "cooling constant must be non-negative and finite (got {})",
                k
            )));
        }
        Ok(Self { t0, p0, k })
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn p0(&self) -> f64 {
        self.p0
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// Temperature at iteration `i` of `iterations`. Never reaches zero.
    pub fn temperature(&self, i: u64, iterations: u64) -> f64 {
        if iterations == 0 {
            return self.t0;
        }
        let t = self.t0 * (-(i as f64) * self.k / iterations as f64).exp();
        t.max(f64::MIN_POSITIVE)
    }

    /// `p0 * exp(-|delta| / t)`, always within `[0, p0]`.
    pub fn raw_acceptance(&self, delta: f64, t: f64) -> f64 {
        self.p0 * (-delta.abs() / t).exp()
    }

    pub fn acceptance_probability(&self, delta: f64, t: f64) -> f64 {
        self.raw_acceptance(delta, t).min(1.0)
    }

    /// Returns the decision and the probability used for it.
    pub fn decide(&self, delta: f64, t: f64, rng: &mut Rng) -> (Decision, f64) {
        if delta < 0.0 {
            return (Decision::Improved, 1.0);
        }
        let p = self.acceptance_probability(delta, t);
        let draw = rng.u32(0..=ACCEPT_RESOLUTION);
        if p * ACCEPT_RESOLUTION as f64 > draw as f64 {
            (Decision::Accepted, p)
        } else {
            (Decision::Rejected, p)
        }
    }
}
