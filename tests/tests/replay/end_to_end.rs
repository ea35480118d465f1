//! Playlist and trace text through the full replay pipeline.

use dass_abr::{AbrOptions, Policy, RiskLabel};
use dass_replay::{BandwidthTrace, ReplayConfig, Simulation, ladder, playlist};
use rstest::rstest;

/// Calm, calm, then an accident announced one segment ahead.
const PLAYLIST: &str = "\
#EXTM3U
#EXT-X-TARGETDURATION:2
#EXT-X-SEMANTICLEVEL:0
#EXT-X-NEXT-SEMANTICLEVEL:0
#EXTINF:2.0,
s0.ts
#EXT-X-SEMANTICLEVEL:0
#EXT-X-NEXT-SEMANTICLEVEL:0
#EXTINF:2.0,
s1.ts
#EXT-X-SEMANTICLEVEL:0
#EXT-X-NEXT-SEMANTICLEVEL:2
#EXTINF:2.0,
s2.ts
#EXT-X-SEMANTICTYPE:1
#EXT-X-SEMANTICLEVEL:2
#EXT-X-NEXT-SEMANTICLEVEL:2
#EXTINF:2.0,
s3.ts
#EXT-X-ENDLIST
";

/// Fast link throughout.
const TRACE: &str = "# t_ms kbps\n0 20000\n";

fn run(policy: Policy) -> Vec<dass_replay::FetchRecord> {
    let segments = playlist::parse(PLAYLIST).unwrap();
    let trace = BandwidthTrace::parse(TRACE).unwrap();
    let cfg = ReplayConfig {
        options: AbrOptions::default().with_policy(policy),
        latency_ms: 20.0,
    };
    let mut sim = Simulation::new(cfg, ladder::default_ladder("_privacy"), trace).unwrap();
    sim.run(&segments)
}

#[test]
fn privacy_policy_switches_groups_on_announced_risk() {
    let records = run(Policy::PrivacyPreferring);
    let privacy: Vec<bool> = records.iter().map(|r| r.privacy).collect();

    // s0 starts on the seeded privacy level, s3 follows the accident hint.
    assert_eq!(privacy, vec![true, true, true, false]);
    assert_eq!(records[3].tags.risk_label(), RiskLabel::Accident);
}

#[rstest]
#[case(Policy::Baseline)]
#[case(Policy::RiskCeiling)]
fn clear_policies_never_fetch_privacy_levels_on_a_clear_first_ladder(#[case] policy: Policy) {
    let records = run(policy);
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| !r.privacy));
    // Calm hints cap both policies at index 0; the accident hint opens index 2.
    assert_eq!(records[1].level, 0);
    assert_eq!(records[3].level, 2);
}

#[test]
fn trace_drop_slows_later_fetches() {
    let trace = BandwidthTrace::parse("0 20000\n200 500\n").unwrap();
    let segments = playlist::parse(PLAYLIST).unwrap();
    let mut sim = Simulation::new(
        ReplayConfig::default(),
        ladder::default_ladder("_privacy"),
        trace,
    )
    .unwrap();
    let records = sim.run(&segments);
    let summary = sim.summarize(&records);

    assert!(records.last().unwrap().total_ms > records[0].total_ms);
    assert!(summary.elapsed_ms > 0.0);
    assert_eq!(summary.per_level.iter().sum::<usize>(), records.len());
}
