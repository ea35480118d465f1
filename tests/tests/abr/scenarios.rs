//! End-to-end decisions on fixed ladders.

use std::sync::Arc;

use dass_abr::{
    AbrController, AbrOptions, DecisionReason, FirstLevel, Fragment, Level, LevelTable, LoadStats,
    Policy, RiskTier, StartLevel, TrackKind,
};
use dass_test_utils::{clear_levels, frag_with_hint, mirrored_levels, stats};
use rstest::rstest;

fn named_table() -> LevelTable {
    Arc::from(vec![
        Level::new(500_000).with_name("low"),
        Level::new(1_500_000).with_name("high"),
        Level::new(500_001).with_name("low_privacy"),
        Level::new(1_500_001).with_name("high_privacy"),
    ])
}

#[rstest]
fn baseline_without_samples_uses_default_estimate(clear_levels: LevelTable) {
    let mut controller =
        AbrController::new(AbrOptions::default().with_default_estimate_bps(1_000_000.0));
    controller.on_manifest_parsed(clear_levels);
    assert_eq!(controller.next_auto_level(), Some(0));
}

#[rstest]
fn baseline_after_one_fast_sample_picks_top_level(clear_levels: LevelTable) {
    let mut controller =
        AbrController::new(AbrOptions::default().with_default_estimate_bps(1_000_000.0));
    controller.on_manifest_parsed(clear_levels);
    controller.on_frag_buffered(&frag_with_hint(0, None), &stats(1_000.0, 400_000));

    let decision = controller.decide().unwrap();
    assert!(decision.estimate_bps <= 3_200_000.0 + 1e-6);
    assert!(decision.estimate_bps > 1_000_000.0);
    assert_eq!(decision.level, 2);
    assert_eq!(decision.reason, DecisionReason::WithinEstimate);
}

#[rstest]
#[case(Some(0.0))]
#[case(Some(1.0))]
fn privacy_preferring_never_picks_clear_levels_on_low_risk(#[case] hint: Option<f64>) {
    let table = named_table();
    for bytes in [1_000, 100_000, 400_000, 4_000_000] {
        let mut controller =
            AbrController::new(AbrOptions::default().with_policy(Policy::PrivacyPreferring));
        controller.on_manifest_parsed(Arc::clone(&table));
        controller.on_frag_buffered(&frag_with_hint(0, hint), &stats(1_000.0, bytes));

        let level = controller.next_auto_level().unwrap();
        let name = table[level].name.as_deref().unwrap();
        assert!(name == "low_privacy" || name == "high_privacy", "picked {name}");
    }
}

#[rstest]
#[case(Policy::Baseline)]
#[case(Policy::RiskCeiling)]
#[case(Policy::PrivacyPreferring)]
#[case(Policy::PrivacyRiskCeiling)]
fn aborted_fragment_changes_nothing(#[case] policy: Policy) {
    let mut controller = AbrController::new(AbrOptions::default().with_policy(policy));
    controller.on_manifest_parsed(named_table());
    controller.on_frag_buffered(&frag_with_hint(0, Some(2.0)), &stats(500.0, 100_000));
    let samples = controller.estimator().sample_count();
    let hint = controller.hint();

    controller.on_frag_buffered(
        &frag_with_hint(1, Some(0.0)),
        &LoadStats::completed(0.0, 5.0, 100.0, 900_000).aborted(),
    );

    assert_eq!(controller.estimator().sample_count(), samples);
    assert_eq!(controller.hint(), hint);
    assert_eq!(hint, Some(RiskTier(2)));
}

#[rstest]
fn audio_fragments_are_ignored(mirrored_levels: LevelTable) {
    let mut controller = AbrController::new(AbrOptions::default());
    controller.on_manifest_parsed(mirrored_levels);
    controller.on_frag_buffered(
        &Fragment::main(0).with_kind(TrackKind::Audio),
        &stats(100.0, 1_000_000),
    );
    assert_eq!(controller.estimator().sample_count(), 0);
}

#[rstest]
fn privacy_risk_ceiling_caps_position_in_group(mirrored_levels: LevelTable) {
    let mut controller =
        AbrController::new(AbrOptions::default().with_policy(Policy::PrivacyRiskCeiling));
    controller.on_manifest_parsed(mirrored_levels);

    // 40 Mbps: every level fits, only the ceiling limits the choice.
    controller.on_frag_buffered(&frag_with_hint(0, Some(0.0)), &stats(100.0, 500_000));
    assert_eq!(controller.next_auto_level(), Some(3));

    controller.on_frag_buffered(&frag_with_hint(1, Some(1.0)), &stats(100.0, 500_000));
    assert_eq!(controller.next_auto_level(), Some(4));

    controller.on_frag_buffered(&frag_with_hint(2, Some(2.0)), &stats(100.0, 500_000));
    assert_eq!(controller.next_auto_level(), Some(2));
}

#[rstest]
fn privacy_policies_seed_the_host_start_level(mirrored_levels: LevelTable) {
    for policy in [Policy::PrivacyPreferring, Policy::PrivacyRiskCeiling] {
        let start = StartLevel::new();
        let mut controller = AbrController::new(AbrOptions::default().with_policy(policy))
            .with_start_level(start.clone());
        controller.on_manifest_parsed(Arc::clone(&mirrored_levels));

        assert_eq!(start.get(), Some(3));
        assert_eq!(controller.first_auto_level(), FirstLevel::HostConfigured);
        assert_eq!(controller.forced_auto_level(), None);
    }
}

#[test]
fn empty_table_yields_sentinels() {
    for policy in Policy::ALL {
        let controller = AbrController::new(AbrOptions::default().with_policy(policy));
        assert_eq!(controller.next_auto_level(), None);
        assert_eq!(controller.first_auto_level(), FirstLevel::HostConfigured);
    }
}
