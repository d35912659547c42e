//! Score arithmetic.

use crate::config::SessionConfig;

/// Multiplier applied to a route visit made with `combo` consecutive
/// route visits behind it.
pub fn combo_multiplier(combo: u32, threshold: u32, cap: u32) -> i64 {
    if combo >= threshold {
        i64::from(combo.min(cap).max(1))
    } else {
        1
    }
}

/// Points for a route visit at the current combo.
pub fn route_points(config: &SessionConfig, combo: u32) -> i64 {
    config
        .points_route_visit
        .saturating_mul(combo_multiplier(combo, config.combo_threshold, config.combo_cap))
}

/// Final score: running score plus quiz results, clamped once at zero.
pub fn final_score(config: &SessionConfig, score: i64, correct: u32, wrong: u32) -> i64 {
    let quiz = i64::from(correct)
        .saturating_mul(config.points_per_correct)
        .saturating_add(i64::from(wrong).saturating_mul(config.points_per_wrong));
    score.saturating_add(quiz).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_multiplier_thresholds() {
        assert_eq!(combo_multiplier(0, 3, 5), 1);
        assert_eq!(combo_multiplier(2, 3, 5), 1);
        assert_eq!(combo_multiplier(3, 3, 5), 3);
        assert_eq!(combo_multiplier(4, 3, 5), 4);
        assert_eq!(combo_multiplier(9, 3, 5), 5);
    }

    #[test]
    fn test_route_points_at_combo_four() {
        let cfg = SessionConfig::default();
        assert_eq!(route_points(&cfg, 4), 600);
    }

    #[test]
    fn test_all_wrong_clamps_to_zero() {
        let cfg = SessionConfig::default();
        assert_eq!(final_score(&cfg, 100, 0, 5), 0);
        assert_eq!(final_score(&cfg, 300, 1, 2), 400);
    }

    proptest! {
        #[test]
        fn prop_final_score_non_negative(
            score in 0i64..1_000_000,
            correct in 0u32..100,
            wrong in 0u32..100,
            ppw in -10_000i64..0,
        ) {
            let cfg = SessionConfig { points_per_wrong: ppw, ..SessionConfig::default() };
            prop_assert!(final_score(&cfg, score, correct, wrong) >= 0);
        }

        #[test]
        fn prop_multiplier_monotonic_and_capped(combo in 0u32..1000) {
            let (this, next) = (combo_multiplier(combo, 3, 5), combo_multiplier(combo + 1, 3, 5));
            prop_assert!(next >= this);
            prop_assert!((1..=5).contains(&this));
        }
    }
}
