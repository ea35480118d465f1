//! Controllers driven through the shared event bus.

use std::sync::Arc;

use dass_abr::{AbrController, AbrOptions, EventBus, PlaybackEvent, Policy, RiskTier, StartLevel};
use dass_test_utils::{frag_with_hint, mirrored_ladder, stats};
use rstest::rstest;

fn frag_event(sn: u64, next: Option<f64>) -> PlaybackEvent {
    PlaybackEvent::FragBuffered {
        frag: frag_with_hint(sn, next),
        stats: stats(100.0, 500_000),
    }
}

#[rstest]
#[case(Policy::Baseline, 0)]
#[case(Policy::RiskCeiling, 0)]
#[case(Policy::PrivacyPreferring, 5)]
#[case(Policy::PrivacyRiskCeiling, 3)]
fn bus_events_drive_every_policy(#[case] policy: Policy, #[case] expected: usize) {
    let bus = EventBus::new(16);
    let mut controller = AbrController::attached(AbrOptions::default().with_policy(policy), &bus);

    bus.publish(PlaybackEvent::ManifestParsed {
        levels: mirrored_ladder(),
    });
    bus.publish(frag_event(0, Some(0.0)));
    assert_eq!(controller.poll_events(), 2);

    assert_eq!(controller.hint(), Some(RiskTier(0)));
    assert_eq!(controller.next_auto_level(), Some(expected));
}

#[test]
fn two_sessions_on_one_bus_stay_independent() {
    let bus = EventBus::new(16);
    let start = StartLevel::new();
    let mut privacy = AbrController::attached(
        AbrOptions::default().with_policy(Policy::PrivacyPreferring),
        &bus,
    )
    .with_start_level(start.clone());
    let mut baseline = AbrController::attached(AbrOptions::default(), &bus);

    bus.publish(PlaybackEvent::ManifestParsed {
        levels: mirrored_ladder(),
    });
    bus.publish(frag_event(0, Some(1.0)));
    privacy.poll_events();
    baseline.poll_events();

    assert_eq!(start.get(), Some(3));
    assert_eq!(privacy.next_auto_level(), Some(5));
    // Baseline caps the table index at the tier.
    assert_eq!(baseline.next_auto_level(), Some(1));
}

#[test]
fn second_manifest_does_not_reseed_start_level() {
    let bus = EventBus::new(16);
    let start = StartLevel::new();
    let mut controller = AbrController::attached(
        AbrOptions::default().with_policy(Policy::PrivacyRiskCeiling),
        &bus,
    )
    .with_start_level(start.clone());

    bus.publish(PlaybackEvent::ManifestParsed {
        levels: mirrored_ladder(),
    });
    controller.poll_events();
    assert_eq!(start.get(), Some(3));

    start.set(0);
    bus.publish(PlaybackEvent::ManifestParsed {
        levels: mirrored_ladder(),
    });
    controller.poll_events();
    assert_eq!(start.get(), Some(0));
}

#[test]
fn destroy_releases_every_session_handle() {
    let bus = EventBus::new(4);
    let start = StartLevel::new();
    let levels = mirrored_ladder();
    let mut controller = AbrController::attached(AbrOptions::default(), &bus)
        .with_start_level(start.clone());

    bus.publish(PlaybackEvent::ManifestParsed {
        levels: Arc::clone(&levels),
    });
    controller.poll_events();
    assert_eq!(bus.subscriber_count(), 1);
    assert_eq!(start.handle_count(), 2);
    assert!(Arc::strong_count(&levels) >= 2);
    assert!(controller.next_auto_level().is_some());

    controller.destroy();
    controller.destroy();

    assert_eq!(bus.subscriber_count(), 0);
    assert_eq!(start.handle_count(), 1);
    assert!(!controller.is_attached());
    assert_eq!(controller.next_auto_level(), None);
    bus.publish(frag_event(0, None));
    assert_eq!(controller.poll_events(), 0);

    // The channel buffer may still hold the published manifest.
    drop(bus);
    assert_eq!(Arc::strong_count(&levels), 1);
}

#[tokio::test]
async fn async_subscriber_observes_the_same_stream() {
    let bus = EventBus::new(8);
    let mut observer = bus.subscribe();
    let levels = mirrored_ladder();

    bus.publish(PlaybackEvent::ManifestParsed {
        levels: Arc::clone(&levels),
    });
    bus.publish(frag_event(7, Some(2.0)));

    let first = observer.recv().await.unwrap();
    assert!(matches!(
        first,
        PlaybackEvent::ManifestParsed { levels: got } if got.len() == levels.len()
    ));
    let second = observer.recv().await.unwrap();
    assert!(matches!(
        second,
        PlaybackEvent::FragBuffered { frag, .. }
            if frag.sn == 7 && frag.tags.hint() == Some(RiskTier(2))
    ));

    drop(bus);
    assert!(observer.recv().await.is_none());
}
