//! Mission progress tracking over a stream of "waypoint reached" reports.
//!
//! The feed gives no ordering or exactly-once guarantee. The monitor treats
//! the first event it ever sees as the mission start, suppresses a report
//! that repeats the previous waypoint, and reads a return to waypoint 0 as
//! the end of the mission.

use async_trait::async_trait;
use mission_core::{MissionProgressEvent, TelemetryRecord};
use px4_link::MissionReachedFeed;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Source of raw progress records. `None` means the feed is closed.
#[async_trait]
pub trait TelemetryFeed: Send {
    async fn next_record(&mut self) -> Option<TelemetryRecord>;
}

#[async_trait]
impl TelemetryFeed for mpsc::Receiver<TelemetryRecord> {
    async fn next_record(&mut self) -> Option<TelemetryRecord> {
        self.recv().await
    }
}

#[async_trait]
impl TelemetryFeed for MissionReachedFeed {
    async fn next_record(&mut self) -> Option<TelemetryRecord> {
        self.next().await.map(|reached| TelemetryRecord {
            waypoint_seq: i64::from(reached.seq),
            stamp_secs: reached.received_at.as_secs_f64(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub mission_started: bool,
    pub last_waypoint_seen: Option<u16>,
    /// Set by the first event and never overwritten.
    pub mission_start_time: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressReport {
    MissionStarted { first_sequence: u16, at: Duration },
    WaypointReached { sequence: u16, elapsed: Duration },
    MissionCompleted { elapsed: Duration },
}

#[derive(Debug, Default)]
pub struct ProgressMonitor {
    state: SessionState,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn observe(&mut self, event: MissionProgressEvent) -> Option<ProgressReport> {
        let seq = event.waypoint_sequence;

        let report = if !self.state.mission_started {
            self.state.mission_started = true;
            self.state.mission_start_time = Some(event.timestamp);
            Some(ProgressReport::MissionStarted {
                first_sequence: seq,
                at: event.timestamp,
            })
        } else if self.state.last_waypoint_seen == Some(seq) {
            None
        } else {
            let elapsed = self.elapsed_at(event.timestamp);
            if seq == 0 {
                Some(ProgressReport::MissionCompleted { elapsed })
            } else {
                Some(ProgressReport::WaypointReached {
                    sequence: seq,
                    elapsed,
                })
            }
        };

        self.state.last_waypoint_seen = Some(seq);

        if let Some(report) = &report {
            log_report(report);
        }
        report
    }

    /// Consumes `feed` until it closes, then returns the final session state.
    /// Records that fail to decode are dropped without touching the state.
    pub async fn run<F: TelemetryFeed>(&mut self, mut feed: F) -> SessionState {
        while let Some(record) = feed.next_record().await {
            match MissionProgressEvent::try_from(record) {
                Ok(event) => {
                    self.observe(event);
                }
                Err(err) => warn!(%err, "dropping malformed progress record"),
            }
        }
        info!("mission progress feed closed");
        self.state.clone()
    }

    fn elapsed_at(&self, timestamp: Duration) -> Duration {
        self.state
            .mission_start_time
            .map(|start| timestamp.saturating_sub(start))
            .unwrap_or_default()
    }
}

impl ProgressReport {
    /// Operator-facing lines for this report, in the order they are logged.
    pub fn messages(&self) -> Vec<String> {
        match *self {
            ProgressReport::MissionStarted { .. } => {
                vec![String::from("starting mission: waypoint #0 reached")]
            }
            ProgressReport::WaypointReached { sequence, elapsed } => vec![format!(
                "mission waypoint #{sequence} reached, elapsed time: {} s",
                elapsed.as_secs()
            )],
            ProgressReport::MissionCompleted { elapsed } => vec![
                format!("mission waypoint #0 reached, elapsed time: {} s", elapsed.as_secs()),
                format!("ending mission: total time {} s", elapsed.as_secs()),
            ],
        }
    }
}

fn log_report(report: &ProgressReport) {
    for message in report.messages() {
        match *report {
            ProgressReport::MissionStarted { first_sequence, .. } => info!(first_sequence, "{message}"),
            _ => info!("{message}"),
        }
    }
}
