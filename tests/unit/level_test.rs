//! Unit tests for level calculation

use questboard::levels::{level_for_xp, title_for_level, title_for_xp};

#[test]
fn test_level_curve_fixed_points() {
    assert_eq!(level_for_xp(0), 0);
    assert_eq!(level_for_xp(400), 2);
    assert_eq!(level_for_xp(10000), 10);
}

#[test]
fn test_level_never_decreases_with_xp() {
    let mut previous = 0;
    for xp in 0..5000 {
        let level = level_for_xp(xp);
        assert!(level >= previous);
        previous = level;
    }
}

#[test]
fn test_level_thresholds() {
    // Level n starts at exactly n^2 * 100 XP.
    for level in 1u64..20 {
        let threshold = level * level * 100;
        assert_eq!(level_for_xp(threshold), level as u32);
        assert_eq!(level_for_xp(threshold - 1), level as u32 - 1);
    }
}

#[test]
fn test_title_resolution() {
    assert_eq!(title_for_level(0), "Newcomer");
    assert_eq!(title_for_level(3), "Builder");
    assert_eq!(title_for_level(7), "Architect");
    assert_eq!(title_for_level(15), "Legend");
}

#[test]
fn test_title_from_xp_matches_level_title() {
    for xp in [0u64, 150, 400, 2500, 10000, 50000] {
        assert_eq!(title_for_xp(xp), title_for_level(level_for_xp(xp)));
    }
}
