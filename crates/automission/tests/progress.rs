use automission::{ProgressMonitor, ProgressReport, SessionState};
use mission_core::{MissionProgressEvent, TelemetryRecord};
use std::time::Duration;
use tokio::sync::mpsc;

fn event(seq: u16, secs: u64) -> MissionProgressEvent {
    MissionProgressEvent::new(seq, Duration::from_secs(secs))
}

fn feed_all(events: &[(u16, u64)]) -> (ProgressMonitor, Vec<Option<ProgressReport>>) {
    let mut monitor = ProgressMonitor::new();
    let reports = events
        .iter()
        .map(|&(seq, secs)| monitor.observe(event(seq, secs)))
        .collect();
    (monitor, reports)
}

/// Small deterministic generator so the property checks are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn single_event_starts_mission() {
    let (monitor, reports) = feed_all(&[(0, 100)]);

    assert_eq!(
        reports,
        vec![Some(ProgressReport::MissionStarted {
            first_sequence: 0,
            at: Duration::from_secs(100)
        })]
    );
    assert_eq!(
        monitor.state(),
        &SessionState {
            mission_started: true,
            last_waypoint_seen: Some(0),
            mission_start_time: Some(Duration::from_secs(100)),
        }
    );
}

#[test]
fn intermediate_waypoints_report_elapsed_time() {
    let (_, reports) = feed_all(&[(0, 100), (1, 110), (2, 125)]);

    assert_eq!(
        reports,
        vec![
            Some(ProgressReport::MissionStarted {
                first_sequence: 0,
                at: Duration::from_secs(100)
            }),
            Some(ProgressReport::WaypointReached {
                sequence: 1,
                elapsed: Duration::from_secs(10)
            }),
            Some(ProgressReport::WaypointReached {
                sequence: 2,
                elapsed: Duration::from_secs(25)
            }),
        ]
    );
}

#[test]
fn duplicate_suppressed_and_return_to_zero_completes() {
    let (monitor, reports) = feed_all(&[(0, 100), (1, 110), (1, 110), (0, 250)]);

    assert_eq!(
        reports,
        vec![
            Some(ProgressReport::MissionStarted {
                first_sequence: 0,
                at: Duration::from_secs(100)
            }),
            Some(ProgressReport::WaypointReached {
                sequence: 1,
                elapsed: Duration::from_secs(10)
            }),
            None,
            Some(ProgressReport::MissionCompleted {
                elapsed: Duration::from_secs(150)
            }),
        ]
    );
    assert_eq!(monitor.state().last_waypoint_seen, Some(0));
}

#[test]
fn first_event_starts_mission_whatever_its_sequence() {
    let (monitor, reports) = feed_all(&[(3, 40), (4, 55)]);

    assert_eq!(
        reports[0],
        Some(ProgressReport::MissionStarted {
            first_sequence: 3,
            at: Duration::from_secs(40)
        })
    );
    assert_eq!(
        reports[1],
        Some(ProgressReport::WaypointReached {
            sequence: 4,
            elapsed: Duration::from_secs(15)
        })
    );
    assert_eq!(monitor.state().mission_start_time, Some(Duration::from_secs(40)));
}

#[test]
fn repeated_zero_after_start_is_not_a_completion() {
    let (_, reports) = feed_all(&[(0, 100), (0, 101), (0, 102)]);
    assert_eq!(reports[1], None);
    assert_eq!(reports[2], None);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn last_seen_tracks_most_recent_event() {
    let mut rng = Lcg(7);
    for _ in 0..200 {
        let mut monitor = ProgressMonitor::new();
        let len = 1 + rng.next() % 20;
        for _ in 0..len {
            let seq = (rng.next() % 4) as u16;
            monitor.observe(event(seq, rng.next() % 1000));
            assert_eq!(monitor.state().last_waypoint_seen, Some(seq));
        }
    }
}

#[test]
fn mission_started_reported_exactly_once() {
    let mut rng = Lcg(11);
    for _ in 0..200 {
        let mut monitor = ProgressMonitor::new();
        let len = 1 + rng.next() % 30;
        let starts = (0..len)
            .filter_map(|_| monitor.observe(event((rng.next() % 5) as u16, rng.next() % 1000)))
            .filter(|report| matches!(report, ProgressReport::MissionStarted { .. }))
            .count();
        assert_eq!(starts, 1);
    }
}

#[test]
fn repeats_of_previous_sequence_never_report() {
    for repeats in 1..=10u64 {
        let mut monitor = ProgressMonitor::new();
        monitor.observe(event(0, 100));
        assert!(monitor.observe(event(2, 120)).is_some());
        for i in 0..repeats {
            assert_eq!(monitor.observe(event(2, 121 + i)), None);
        }
        assert_eq!(monitor.state().last_waypoint_seen, Some(2));
    }
}

#[test]
fn elapsed_matches_offset_from_start_for_monotonic_stamps() {
    let mut rng = Lcg(23);
    for _ in 0..100 {
        let mut monitor = ProgressMonitor::new();
        let start = rng.next() % 10_000;
        let mut now = start;
        monitor.observe(event(0, start));
        for _ in 0..20 {
            now += rng.next() % 30;
            let seq = (rng.next() % 6) as u16;
            match monitor.observe(event(seq, now)) {
                Some(ProgressReport::WaypointReached { elapsed, .. })
                | Some(ProgressReport::MissionCompleted { elapsed }) => {
                    assert_eq!(elapsed, Duration::from_secs(now - start));
                }
                Some(ProgressReport::MissionStarted { .. }) => panic!("second start report"),
                None => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Feed handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_drops_malformed_records_and_returns_final_state() {
    let (tx, rx) = mpsc::channel(16);
    let records = [
        TelemetryRecord { waypoint_seq: 0, stamp_secs: 100.0 },
        TelemetryRecord { waypoint_seq: 1, stamp_secs: 110.0 },
        TelemetryRecord { waypoint_seq: -4, stamp_secs: 111.0 },
        TelemetryRecord { waypoint_seq: 2, stamp_secs: f64::NAN },
        TelemetryRecord { waypoint_seq: 90_000, stamp_secs: 112.0 },
    ];
    for record in records {
        tx.send(record).await.unwrap();
    }
    drop(tx);

    let mut monitor = ProgressMonitor::new();
    let state = monitor.run(rx).await;

    assert_eq!(
        state,
        SessionState {
            mission_started: true,
            last_waypoint_seen: Some(1),
            mission_start_time: Some(Duration::from_secs(100)),
        }
    );
}

#[tokio::test]
async fn run_on_closed_empty_feed_leaves_session_untouched() {
    let (tx, rx) = mpsc::channel::<TelemetryRecord>(1);
    drop(tx);

    let mut monitor = ProgressMonitor::new();
    assert_eq!(monitor.run(rx).await, SessionState::default());
}

#[tokio::test]
async fn run_processes_records_as_they_arrive() {
    let (tx, rx) = mpsc::channel(4);
    let producer = tokio::spawn(async move {
        for (seq, secs) in [(0i64, 5.0), (1, 9.5), (1, 9.5), (0, 30.0)] {
            tx.send(TelemetryRecord { waypoint_seq: seq, stamp_secs: secs })
                .await
                .unwrap();
            tokio::task::yield_now().await;
        }
    });

    let mut monitor = ProgressMonitor::new();
    let state = monitor.run(rx).await;
    producer.await.unwrap();

    assert_eq!(state.last_waypoint_seen, Some(0));
    assert_eq!(state.mission_start_time, Some(Duration::from_secs(5)));
}
