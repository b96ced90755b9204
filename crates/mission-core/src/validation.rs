use super::types::{IssueSeverity, Mission, MissionIssue};

pub const MAX_MISSION_ITEMS: usize = 4096;

pub fn validate_mission(mission: &Mission) -> Vec<MissionIssue> {
    let mut issues = Vec::new();

    if mission.waypoints.is_empty() {
        issues.push(MissionIssue {
            code: "mission.empty".to_string(),
            message: "Mission has no waypoints".to_string(),
            seq: None,
            severity: IssueSeverity::Error,
        });
        return issues;
    }

    if mission.waypoints.len() > MAX_MISSION_ITEMS {
        issues.push(MissionIssue {
            code: "mission.too_many_items".to_string(),
            message: format!("Mission exceeds maximum supported item count ({MAX_MISSION_ITEMS})"),
            seq: None,
            severity: IssueSeverity::Error,
        });
    }

    if usize::from(mission.start_index) >= mission.waypoints.len() {
        issues.push(MissionIssue {
            code: "mission.start_index_out_of_range".to_string(),
            message: format!(
                "Start index {} is outside a mission of {} items",
                mission.start_index,
                mission.waypoints.len()
            ),
            seq: None,
            severity: IssueSeverity::Error,
        });
    }

    let current_count = mission.waypoints.iter().filter(|wp| wp.current).count();
    if current_count > 1 {
        issues.push(MissionIssue {
            code: "mission.multiple_current".to_string(),
            message: format!("{current_count} waypoints are marked current, at most one allowed"),
            seq: None,
            severity: IssueSeverity::Error,
        });
    }

    for (expected, wp) in mission.waypoints.iter().enumerate() {
        if usize::from(wp.seq) != expected {
            issues.push(MissionIssue {
                code: "mission.non_contiguous_sequence".to_string(),
                message: format!("Expected sequence {} but found {}", expected, wp.seq),
                seq: Some(wp.seq),
                severity: IssueSeverity::Error,
            });
        }

        if !wp.altitude_m.is_finite() {
            issues.push(MissionIssue {
                code: "item.non_finite_value".to_string(),
                message: "altitude must be finite".to_string(),
                seq: Some(wp.seq),
                severity: IssueSeverity::Error,
            });
        }

        // NaN is the "use the autopilot default" marker, only infinities are invalid.
        for (name, value) in [
            ("param1", wp.param1),
            ("param2", wp.param2),
            ("param3", wp.param3),
            ("param4", wp.param4),
        ] {
            if value.is_infinite() {
                issues.push(MissionIssue {
                    code: "item.infinite_param".to_string(),
                    message: format!("{name} must not be infinite"),
                    seq: Some(wp.seq),
                    severity: IssueSeverity::Error,
                });
            }
        }

        if wp.frame.is_global_position() {
            if !(-90.0..=90.0).contains(&wp.latitude_deg) {
                issues.push(MissionIssue {
                    code: "item.latitude_out_of_range".to_string(),
                    message: format!("Latitude {} is outside [-90, 90]", wp.latitude_deg),
                    seq: Some(wp.seq),
                    severity: IssueSeverity::Error,
                });
            }

            if !(-180.0..=180.0).contains(&wp.longitude_deg) {
                issues.push(MissionIssue {
                    code: "item.longitude_out_of_range".to_string(),
                    message: format!("Longitude {} is outside [-180, 180]", wp.longitude_deg),
                    seq: Some(wp.seq),
                    severity: IssueSeverity::Error,
                });
            }
        }
    }

    if let Some(last) = mission.waypoints.last() {
        if !last.command.ends_flight() {
            issues.push(MissionIssue {
                code: "mission.no_terminal_item".to_string(),
                message: "Last item is neither LAND nor RETURN_TO_LAUNCH".to_string(),
                seq: Some(last.seq),
                severity: IssueSeverity::Warning,
            });
        }
    }

    issues
}
