use super::loader::BaseEffort;
use crate::geometry::{key_info, ROW_FLAG_TABLE};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const K1: f64 = 1.0;
pub const K2: f64 = 0.367;
pub const K3: f64 = 0.235;

pub const STROKE_SCALE: f64 = 2.0;
pub const FINGER_FLAG_WEIGHT: f64 = 0.3;
pub const ROW_FLAG_WEIGHT: f64 = 0.4;

/// Which keys feed the three terms of the stroke component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrokeModel {
    /// Every term reads the base effort of the first key.
    #[default]
    FirstKey,
    /// Term n reads the base effort of key n.
    PerKey,
}

/// Same-finger / same-hand reuse penalty code (0..=7) of a triad.
///
/// A finite case table over the relative finger rank of the three keys,
/// split by which consecutive keys share a hand. Striking the very same key
/// twice scores lower than two distinct keys under the same finger.
pub fn finger_flag(p1: usize, p2: usize, p3: usize) -> u8 {
    let k1 = key_info(p1);
    let k2 = key_info(p2);
    let k3 = key_info(p3);
    let (f1, f2, f3) = (k1.finger, k2.finger, k3.finger);

    let first_pair = k1.hand == k2.hand;
    let second_pair = k2.hand == k3.hand;

    if first_pair && second_pair {
        match f1.cmp(&f2) {
            Ordering::Less => match f2.cmp(&f3) {
                Ordering::Less => 0,
                Ordering::Equal => {
                    if p2 != p3 {
                        5
                    } else {
                        0
                    }
                }
                Ordering::Greater => match f1.cmp(&f3) {
                    Ordering::Equal => 4,
                    Ordering::Less => 2,
                    Ordering::Greater => 3,
                },
            },
            Ordering::Equal => match f2.cmp(&f3) {
                Ordering::Less => {
                    if p1 != p2 {
                        4
                    } else {
                        1
                    }
                }
                Ordering::Equal => {
                    if p1 != p2 && p2 != p3 && p1 != p3 {
                        7
                    } else {
                        5
                    }
                }
                Ordering::Greater => {
                    if p1 != p2 {
                        5
                    } else {
                        1
                    }
                }
            },
            Ordering::Greater => match f2.cmp(&f3) {
                Ordering::Greater => 3,
                Ordering::Equal => {
                    if p2 != p3 {
                        4
                    } else {
                        1
                    }
                }
                Ordering::Less => {
                    if f1 == f3 {
                        4
                    } else {
                        5
                    }
                }
            },
        }
    } else if first_pair {
        pair_flag(f1.cmp(&f2), p1 != p2)
    } else if second_pair {
        pair_flag(f2.cmp(&f3), p2 != p3)
    } else {
        0
    }
}

// Two consecutive same-hand keys, the third on the other hand.
#[inline]
fn pair_flag(order: Ordering, distinct: bool) -> u8 {
    match order {
        Ordering::Equal => {
            if distinct {
                3
            } else {
                1
            }
        }
        Ordering::Greater => 2,
        Ordering::Less => 0,
    }
}

#[inline]
pub fn row_flag(p1: usize, p2: usize, p3: usize) -> u8 {
    let r1 = key_info(p1).row as usize;
    let r2 = key_info(p2).row as usize;
    let r3 = key_info(p3).row as usize;
    ROW_FLAG_TABLE[r1][r2][r3]
}

pub fn stroke_effort(
    base: &BaseEffort,
    model: StrokeModel,
    p1: usize,
    p2: usize,
    p3: usize,
) -> f64 {
    let (b1, b2, b3) = match model {
        StrokeModel::FirstKey => {
            let b = base.get(p1);
            (b, b, b)
        }
        StrokeModel::PerKey => (base.get(p1), base.get(p2), base.get(p3)),
    };
    STROKE_SCALE * (K1 * b1 + 1.0 + K2 * b2 * (1.0 + K3 * b3))
}

#[inline]
pub fn path_effort(p1: usize, p2: usize, p3: usize) -> f64 {
    FINGER_FLAG_WEIGHT * finger_flag(p1, p2, p3) as f64
        + ROW_FLAG_WEIGHT * row_flag(p1, p2, p3) as f64
}

/// Uncached effort of striking the three slots in order. Depends only on
/// geometry and base effort, never on which characters sit there.
pub fn triad_effort(
    base: &BaseEffort,
    model: StrokeModel,
    p1: usize,
    p2: usize,
    p3: usize,
) -> f64 {
    stroke_effort(base, model, p1, p2, p3) + path_effort(p1, p2, p3)
}
