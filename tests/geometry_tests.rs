use rstest::rstest;
use strum::IntoEnumIterator;
use triadforge::geometry::{key_info, Finger, Hand, LayoutMask, Row, KEY_INFO, NUM_KEYS, ROW_FLAG_TABLE};

#[test]
fn test_key_table_covers_every_slot() {
    assert_eq!(KEY_INFO.len(), NUM_KEYS);
    assert!(KEY_INFO.iter().all(|k| k.finger != Finger::Thumb));
}

#[test]
fn test_row_lengths() {
    let counts: Vec<usize> = Row::iter()
        .map(|row| KEY_INFO.iter().filter(|k| k.row == row).count())
        .collect();
    assert_eq!(counts, vec![13, 13, 11, 10]);
}

#[test]
fn test_hands_split_down_the_middle() {
    let left = KEY_INFO.iter().filter(|k| k.hand == Hand::Left).count();
    let right = KEY_INFO.iter().filter(|k| k.hand == Hand::Right).count();
    assert_eq!(left, 22);
    assert_eq!(right, 25);
}

// --- Qwerty slots ---
#[rstest]
#[case(13, Hand::Left, Row::Top, Finger::Pinky)] // q
#[case(16, Hand::Left, Row::Top, Finger::Index)] // r
#[case(26, Hand::Left, Row::Home, Finger::Pinky)] // a
#[case(28, Hand::Left, Row::Home, Finger::Middle)] // d
#[case(32, Hand::Right, Row::Home, Finger::Index)] // j
#[case(35, Hand::Right, Row::Home, Finger::Pinky)] // ;
#[case(39, Hand::Left, Row::Bottom, Finger::Middle)] // c
#[case(46, Hand::Right, Row::Bottom, Finger::Pinky)] // /
#[case(0, Hand::Left, Row::Number, Finger::Pinky)] // `
fn test_key_info(
    #[case] pos: usize,
    #[case] hand: Hand,
    #[case] row: Row,
    #[case] finger: Finger,
) {
    let k = key_info(pos);
    assert_eq!((k.hand, k.row, k.finger), (hand, row, finger), "slot {}", pos);
}

#[test]
fn test_finger_rank_order() {
    assert!(Finger::Pinky < Finger::Ring);
    assert!(Finger::Ring < Finger::Middle);
    assert!(Finger::Middle < Finger::Index);
    assert!(Finger::Index < Finger::Thumb);
}

#[test]
fn test_row_flag_table_range() {
    for a in ROW_FLAG_TABLE.iter() {
        for b in a.iter() {
            for &v in b.iter() {
                assert!(v <= 6);
            }
        }
    }
    // Staying on one row costs nothing
    for r in 0..4 {
        assert_eq!(ROW_FLAG_TABLE[r][r][r], 0);
    }
}

#[test]
fn test_standard_mask() {
    let mask = LayoutMask::standard();
    assert_eq!(mask.count(), 27);
    let eligible = mask.eligible_positions();
    assert_eq!(eligible.first(), Some(&13));
    assert_eq!(eligible.last(), Some(&43));
    // Number row and the brackets stay put
    assert!(!mask.allows(0));
    assert!(!mask.allows(23));
    assert!(!mask.allows(36));
    assert!(!mask.allows(44));
    assert_eq!(LayoutMask::default(), mask);
}

#[test]
fn test_mask_parse() {
    let flags = format!("{}{}", "1".repeat(2), "0".repeat(45));
    let mask = LayoutMask::parse(&flags).unwrap();
    assert_eq!(mask.eligible_positions(), vec![0, 1]);

    // Whitespace between rows is ignored
    let rows = format!(
        "{}\n{}\n{}\n{}",
        "0".repeat(13),
        "1".repeat(13),
        "0".repeat(11),
        "0".repeat(10)
    );
    assert_eq!(LayoutMask::parse(&rows).unwrap().count(), 13);
}

#[rstest]
#[case("101")]
#[case(&"x".repeat(47))]
#[case(&"1".repeat(48))]
fn test_mask_parse_rejects(#[case] input: &str) {
    assert!(LayoutMask::parse(input).is_err());
}

#[test]
fn test_mask_from_positions() {
    let mask = LayoutMask::from_positions(&[26, 27, 28]).unwrap();
    assert_eq!(mask.count(), 3);
    assert!(LayoutMask::from_positions(&[47]).is_err());
    assert_eq!(LayoutMask::all().count(), NUM_KEYS);
}
