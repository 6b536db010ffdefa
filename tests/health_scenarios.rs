// tests/health_scenarios.rs
use std::collections::HashMap;
use std::sync::Arc;

use spawn_sentinel::feed::fixture::{Scripted, StaticFeed};
use spawn_sentinel::feed::FeedSnapshot;
use spawn_sentinel::filter::FilterSettings;
use spawn_sentinel::geo::Coordinate;
use spawn_sentinel::health::HealthState;
use spawn_sentinel::notify::RecordingNotifier;
use spawn_sentinel::sighting::SpeciesTable;
use spawn_sentinel::{HealthEvent, HealthSignal, Monitor, ScanCycle, SourceHealthMonitor};

fn monitor(script: Vec<Scripted>, threshold: u32) -> (Monitor, Arc<RecordingNotifier>) {
    let scan = ScanCycle::new(
        Coordinate::new(0.0, 0.0),
        FilterSettings::default(),
        Box::new(SpeciesTable::new(HashMap::new())),
    );
    let rec = Arc::new(RecordingNotifier::new());
    let m = Monitor::new(
        scan,
        SourceHealthMonitor::new(threshold),
        Arc::new(StaticFeed::new(script)),
        rec.clone(),
    );
    (m, rec)
}

#[tokio::test]
async fn ffffs_emits_down_once_then_up() {
    let fail = || Scripted::Snapshot(FeedSnapshot::failed());
    let script = vec![
        fail(),
        Scripted::TransportError("connection reset".into()),
        fail(),
        fail(),
        Scripted::Snapshot(FeedSnapshot::ok(vec![])),
    ];
    let (mut m, rec) = monitor(script, 3);

    let mut events = Vec::new();
    for _ in 0..5 {
        let out = m.scan_tick().await;
        events.push(out.health_event);
        for d in out.deliveries {
            d.await.unwrap();
        }
    }

    assert_eq!(
        events,
        vec![
            None,
            None,
            Some(HealthEvent::Down { consecutive_failures: 3 }),
            None,
            Some(HealthEvent::Recovered),
        ]
    );
    assert_eq!(m.health(), HealthState::default());

    let msgs = rec.messages();
    assert_eq!(msgs.len(), 2);
    assert!(msgs[0].contains("down"));
    assert!(msgs[1].contains("recovered"));
}

#[tokio::test]
async fn refresh_requests_count_toward_health() {
    let feed = StaticFeed::new(vec![Scripted::Snapshot(FeedSnapshot::failed())])
        .with_refresh_signal(HealthSignal::Failure);
    let scan = ScanCycle::new(
        Coordinate::new(0.0, 0.0),
        FilterSettings::default(),
        Box::new(SpeciesTable::default()),
    );
    let rec = Arc::new(RecordingNotifier::new());
    let mut m = Monitor::new(scan, SourceHealthMonitor::new(2), Arc::new(feed), rec.clone());

    let (ev, _) = m.refresh_tick().await;
    assert!(ev.is_none());
    let out = m.scan_tick().await;
    assert_eq!(
        out.health_event,
        Some(HealthEvent::Down { consecutive_failures: 2 })
    );
    for d in out.deliveries {
        d.await.unwrap();
    }
    // further failures stay silent
    let (ev, d) = m.refresh_tick().await;
    assert!(ev.is_none() && d.is_empty());
    assert_eq!(rec.messages().len(), 1);
}

#[tokio::test]
async fn success_while_up_never_announces() {
    let (mut m, rec) = monitor(vec![Scripted::Snapshot(FeedSnapshot::ok(vec![]))], 1);
    for _ in 0..3 {
        let out = m.scan_tick().await;
        assert!(out.health_event.is_none());
        assert!(out.deliveries.is_empty());
    }
    assert!(rec.messages().is_empty());
}
