//! Randomized invariants over level tables, hints and fetch timings.
//!
//! Deterministic xorshift64 PRNG keeps every run reproducible.

use dass_abr::{AbrController, AbrOptions, EwmaBandwidthEstimator, Policy};
use dass_test_utils::{PRIVACY_MARKER, Xorshift64, frag_with_hint, random_levels, stats};
use rstest::rstest;

const ITERATIONS: usize = 300;

/// Random hint: absent, a tier in `0..4`, or a malformed value.
fn random_hint(rng: &mut Xorshift64) -> Option<f64> {
    match rng.range_usize(0, 8) {
        0 => None,
        1 => Some(-1.0),
        2 => Some(f64::NAN),
        _ => Some(rng.range_usize(0, 4) as f64),
    }
}

fn feed_random(
    controller: &mut AbrController<EwmaBandwidthEstimator>,
    rng: &mut Xorshift64,
    sn: u64,
) {
    let duration_ms = rng.range_f64(0.0, 4_000.0);
    let bytes = rng.range_u64(1_000, 2_000_000);
    let hint = random_hint(rng);
    controller.on_frag_buffered(&frag_with_hint(sn, hint), &stats(duration_ms, bytes));
}

#[rstest]
#[case(Policy::Baseline)]
#[case(Policy::RiskCeiling)]
#[case(Policy::PrivacyPreferring)]
#[case(Policy::PrivacyRiskCeiling)]
fn chosen_index_is_always_in_bounds(#[case] policy: Policy) {
    let mut rng = Xorshift64::new(0xA5A5_0001);
    for round in 0..ITERATIONS {
        let levels = random_levels(&mut rng, 8, 0.5);
        let mut controller = AbrController::new(AbrOptions::default().with_policy(policy));
        controller.on_manifest_parsed(levels.clone());

        for sn in 0..rng.range_u64(0, 6) {
            feed_random(&mut controller, &mut rng, sn);
        }

        let level = controller.next_auto_level().unwrap();
        assert!(level < levels.len(), "round {round}: {level} out of {}", levels.len());
    }
}

#[rstest]
#[case(Policy::Baseline)]
#[case(Policy::PrivacyRiskCeiling)]
fn can_estimate_follows_sample_count(#[case] policy: Policy) {
    let mut rng = Xorshift64::new(7);
    let mut controller = AbrController::new(AbrOptions::default().with_policy(policy));
    assert!(!controller.estimator().can_estimate());
    assert!((controller.bandwidth_bps() - 500_000.0).abs() < f64::EPSILON);

    feed_random(&mut controller, &mut rng, 0);
    assert!(controller.estimator().can_estimate());
}

#[test]
fn estimate_stays_between_fast_and_slow_averages() {
    let mut rng = Xorshift64::new(0xC0FF_EE00);
    let mut estimator = EwmaBandwidthEstimator::new(&AbrOptions::default());

    for _ in 0..ITERATIONS {
        estimator.sample(rng.range_f64(-100.0, 5_000.0), rng.range_u64(0, 4_000_000));

        let fast = estimator.fast_estimate_bps();
        let slow = estimator.slow_estimate_bps();
        let estimate = estimator.estimate_bps();
        let tolerance = 1e-6 * fast.max(slow).max(1.0);
        assert!(estimate <= fast.max(slow) + tolerance);
        assert!(estimate >= fast.min(slow) - tolerance);
        assert!(estimate.is_finite() && estimate >= 0.0);
    }
}

#[test]
fn risk_ceiling_picks_clear_levels_under_the_ceiling() {
    let mut rng = Xorshift64::new(0x5EED_0002);
    for round in 0..ITERATIONS {
        let levels = random_levels(&mut rng, 8, 0.4);
        let mut controller =
            AbrController::new(AbrOptions::default().with_policy(Policy::RiskCeiling));
        controller.on_manifest_parsed(levels.clone());

        let tier = rng.range_usize(0, 6);
        let bytes = rng.range_u64(1_000, 2_000_000);
        controller.on_frag_buffered(
            &frag_with_hint(0, Some(tier as f64)),
            &stats(1_000.0, bytes),
        );

        let level = controller.next_auto_level().unwrap();
        let first_clear = levels.iter().position(|l| !l.is_privacy(PRIVACY_MARKER));
        if let Some(first_clear) = first_clear {
            assert!(!levels[level].is_privacy(PRIVACY_MARKER), "round {round}");
            assert!(level <= tier.max(first_clear), "round {round}: {level} above tier {tier}");
        }
    }
}

#[rstest]
#[case(Policy::PrivacyPreferring)]
#[case(Policy::PrivacyRiskCeiling)]
fn privacy_group_follows_the_hint(#[case] policy: Policy) {
    let mut rng = Xorshift64::new(0x5EED_0003);
    for round in 0..ITERATIONS {
        let levels = random_levels(&mut rng, 8, 0.5);
        let mut controller = AbrController::new(AbrOptions::default().with_policy(policy));
        controller.on_manifest_parsed(levels.clone());

        let hint = match rng.range_usize(0, 4) {
            3 => None,
            tier => Some(tier as f64),
        };
        let duration_ms = rng.range_f64(10.0, 3_000.0);
        controller.on_frag_buffered(&frag_with_hint(0, hint), &stats(duration_ms, 500_000));
        let level = controller.next_auto_level().unwrap();

        let wants_privacy = hint.is_some_and(|tier| tier < 2.0);
        let group_exists = levels.iter().any(|l| l.is_privacy(PRIVACY_MARKER) == wants_privacy);
        if group_exists {
            assert_eq!(
                levels[level].is_privacy(PRIVACY_MARKER),
                wants_privacy,
                "round {round}: hint {hint:?} chose {level}"
            );
        }
    }
}

#[rstest]
#[case(Policy::Baseline)]
#[case(Policy::PrivacyPreferring)]
fn reset_restores_default_and_keeps_hint(#[case] policy: Policy) {
    let mut rng = Xorshift64::new(0x5EED_0004);
    for _ in 0..50 {
        let mut controller = AbrController::new(AbrOptions::default().with_policy(policy));
        for sn in 0..rng.range_u64(1, 10) {
            feed_random(&mut controller, &mut rng, sn);
        }
        let hint = controller.hint();

        controller.reset_estimator();
        assert!((controller.estimator().estimate_bps() - 500_000.0).abs() < f64::EPSILON);
        assert_eq!(controller.estimator().sample_count(), 0);
        assert_eq!(controller.hint(), hint);
    }
}
