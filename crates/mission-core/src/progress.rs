use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw "waypoint reached" record as delivered by a telemetry feed, before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub waypoint_seq: i64,
    pub stamp_secs: f64,
}

/// Decoded progress event. `timestamp` is monotonic time since the feed epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionProgressEvent {
    pub waypoint_sequence: u16,
    pub timestamp: Duration,
}

impl MissionProgressEvent {
    pub fn new(waypoint_sequence: u16, timestamp: Duration) -> Self {
        Self {
            waypoint_sequence,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TelemetryDecodeError {
    #[error("waypoint sequence {0} is outside 0..=65535")]
    SequenceOutOfRange(i64),
    #[error("invalid timestamp {0}")]
    InvalidTimestamp(f64),
}

impl TryFrom<TelemetryRecord> for MissionProgressEvent {
    type Error = TelemetryDecodeError;

    fn try_from(record: TelemetryRecord) -> Result<Self, Self::Error> {
        let waypoint_sequence = u16::try_from(record.waypoint_seq)
            .map_err(|_| TelemetryDecodeError::SequenceOutOfRange(record.waypoint_seq))?;
        let timestamp = Duration::try_from_secs_f64(record.stamp_secs)
            .map_err(|_| TelemetryDecodeError::InvalidTimestamp(record.stamp_secs))?;
        Ok(MissionProgressEvent {
            waypoint_sequence,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_record() {
        let event = MissionProgressEvent::try_from(TelemetryRecord {
            waypoint_seq: 3,
            stamp_secs: 125.5,
        })
        .unwrap();
        assert_eq!(event.waypoint_sequence, 3);
        assert_eq!(event.timestamp, Duration::from_millis(125_500));
    }

    #[test]
    fn rejects_negative_sequence() {
        let err = MissionProgressEvent::try_from(TelemetryRecord {
            waypoint_seq: -1,
            stamp_secs: 1.0,
        })
        .unwrap_err();
        assert_eq!(err, TelemetryDecodeError::SequenceOutOfRange(-1));
    }

    #[test]
    fn rejects_sequence_past_u16() {
        assert!(MissionProgressEvent::try_from(TelemetryRecord {
            waypoint_seq: 70_000,
            stamp_secs: 1.0,
        })
        .is_err());
    }

    #[test]
    fn rejects_bad_timestamps() {
        for stamp in [-1.0, f64::NAN, f64::INFINITY, 1e30] {
            let result = MissionProgressEvent::try_from(TelemetryRecord {
                waypoint_seq: 0,
                stamp_secs: stamp,
            });
            assert!(matches!(result, Err(TelemetryDecodeError::InvalidTimestamp(_))));
        }
    }
}
