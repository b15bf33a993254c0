use rstest::rstest;
use triadforge::geometry::NUM_KEYS;
use triadforge::scorer::physics::{
    finger_flag, row_flag, stroke_effort, triad_effort, StrokeModel,
};
use triadforge::scorer::BaseEffort;

// --- KEY INDEX MAPPING (qwerty slots) ---
// Top row
const Q: usize = 13; // L Pinky
const E: usize = 15; // L Middle
const U: usize = 19; // R Index

// Home row
const A: usize = 26; // L Pinky
const S: usize = 27; // L Ring
const D: usize = 28; // L Middle
const F: usize = 29; // L Index
const G: usize = 30; // L Index (Stretch)
const J: usize = 32; // R Index
const K: usize = 33; // R Middle

// Bottom row
const Z: usize = 37; // L Pinky
const C: usize = 39; // L Middle

// --- FINGER FLAG: all three keys on one hand ---
#[rstest]
#[case(A, S, D, 0)] // rolling inward
#[case(D, S, A, 3)] // rolling outward
#[case(A, A, A, 5)] // same key three times
#[case(D, E, C, 7)] // one finger, three different keys
#[case(D, E, D, 5)] // one finger, key repeated
#[case(F, F, A, 1)] // repeat then outward
#[case(F, G, A, 5)] // same finger, two keys, then outward
#[case(A, S, A, 4)] // in then back to the start finger
#[case(A, D, S, 2)] // in then partly back
#[case(S, D, A, 3)] // in then past the start finger
#[case(D, S, F, 5)] // out then past the start finger
#[case(D, S, D, 4)] // out then back to the start finger
#[case(F, D, D, 1)] // out then a repeat
#[case(F, D, E, 4)] // out then same finger, new key
fn test_finger_flag_same_hand(
    #[case] p1: usize,
    #[case] p2: usize,
    #[case] p3: usize,
    #[case] expected: u8,
) {
    assert_eq!(
        finger_flag(p1, p2, p3),
        expected,
        "finger flag for {} {} {}",
        p1,
        p2,
        p3
    );
}

// --- FINGER FLAG: hand changes ---
#[rstest]
#[case(A, J, K, 2)] // last two same hand, outward
#[case(A, K, J, 0)] // last two same hand, inward
#[case(A, J, J, 1)] // last two a repeat
#[case(J, U, A, 3)] // first two same finger, different keys
#[case(J, J, A, 1)] // first two a repeat
#[case(K, J, A, 0)] // first two inward
#[case(A, J, A, 0)] // alternating
fn test_finger_flag_hand_change(
    #[case] p1: usize,
    #[case] p2: usize,
    #[case] p3: usize,
    #[case] expected: u8,
) {
    assert_eq!(finger_flag(p1, p2, p3), expected);
}

#[rstest]
#[case(A, S, D, 0)]
#[case(Q, A, Z, 4)]
#[case(Z, A, Q, 6)]
fn test_row_flag(#[case] p1: usize, #[case] p2: usize, #[case] p3: usize, #[case] expected: u8) {
    assert_eq!(row_flag(p1, p2, p3), expected);
}

#[test]
fn test_stroke_effort_reads_first_key() {
    let mut values = [0.0; NUM_KEYS];
    values[A] = 2.0;
    let base = BaseEffort::from_values(values);

    // 2 * (2 + 1 + 0.367 * 2 * (1 + 0.235 * 2))
    let expected = 8.15796;
    let got = stroke_effort(&base, StrokeModel::FirstKey, A, S, D);
    assert!((got - expected).abs() < 1e-9, "got {}", got);

    // Only the first slot matters in this model
    let got = stroke_effort(&base, StrokeModel::FirstKey, S, A, A);
    assert!((got - 2.0).abs() < 1e-12);
}

#[test]
fn test_stroke_effort_per_key() {
    let mut values = [0.0; NUM_KEYS];
    values[A] = 1.0;
    values[S] = 2.0;
    values[D] = 3.0;
    let base = BaseEffort::from_values(values);

    // 2 * (1 + 1 + 0.367 * 2 * (1 + 0.235 * 3))
    let expected = 2.0 * (1.0 + 1.0 + 0.367 * 2.0 * (1.0 + 0.235 * 3.0));
    let got = stroke_effort(&base, StrokeModel::PerKey, A, S, D);
    assert!((got - expected).abs() < 1e-12);
}

#[rstest]
#[case(A, S, D, 2.0)]
#[case(D, E, C, 6.1)] // 2 + 0.3 * 7 + 0.4 * 5
#[case(A, A, A, 3.5)] // 2 + 0.3 * 5
fn test_triad_effort_zero_base(
    #[case] p1: usize,
    #[case] p2: usize,
    #[case] p3: usize,
    #[case] expected: f64,
) {
    let base = BaseEffort::zeros();
    let got = triad_effort(&base, StrokeModel::FirstKey, p1, p2, p3);
    assert!((got - expected).abs() < 1e-9, "got {}", got);
}

#[test]
fn test_triad_effort_is_non_negative_everywhere() {
    let base = BaseEffort::zeros();
    for p1 in 0..NUM_KEYS {
        for p2 in 0..NUM_KEYS {
            for p3 in 0..NUM_KEYS {
                let e = triad_effort(&base, StrokeModel::FirstKey, p1, p2, p3);
                assert!(e >= 2.0 && e.is_finite());
            }
        }
    }
}
