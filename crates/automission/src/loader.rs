use crate::error::LoadError;
use crate::gateway::{CommandGateway, FlightController};
use mission_core::{validate_mission, IssueSeverity, Mission, MissionIssue, UploadReceipt};
use tracing::{debug, error, info, warn};

/// Validates a mission and uploads it in one request.
///
/// The upload replaces the controller's whole mission, so loading the same
/// mission twice leaves the controller in the same state.
pub struct MissionLoader<C> {
    gateway: CommandGateway<C>,
}

impl<C: FlightController> MissionLoader<C> {
    pub fn new(gateway: CommandGateway<C>) -> Self {
        Self { gateway }
    }

    /// Consumes the mission. On success only the receipt remains; the
    /// controller holds the authoritative copy.
    pub async fn load(&self, mission: Mission) -> Result<UploadReceipt, LoadError> {
        let (errors, warnings): (Vec<MissionIssue>, Vec<MissionIssue>) = validate_mission(&mission)
            .into_iter()
            .partition(|issue| issue.severity == IssueSeverity::Error);

        for issue in &warnings {
            warn!(code = %issue.code, seq = ?issue.seq, "{}", issue.message);
        }
        if !errors.is_empty() {
            for issue in &errors {
                error!(code = %issue.code, seq = ?issue.seq, "{}", issue.message);
            }
            return Err(LoadError::Invalid(errors));
        }

        log_summary(&mission);
        self.gateway
            .push_mission(mission.start_index, &mission.waypoints)
            .await?;

        // validate_mission caps the item count well below u16::MAX.
        let receipt = UploadReceipt {
            item_count: mission.waypoints.len() as u16,
            start_index: mission.start_index,
        };
        info!(
            items = receipt.item_count,
            start_index = receipt.start_index,
            "mission waypoints loaded"
        );
        Ok(receipt)
    }
}

fn log_summary(mission: &Mission) {
    debug!("#  cur cmd  frame  lat          lon           alt    p1     p2     p3     p4");
    for wp in &mission.waypoints {
        debug!(
            "{:<2} {:<3} {:<4} {:<6} {:<12.6} {:<13.6} {:<6.1} {:<6.1} {:<6.1} {:<6.1} {:.1}",
            wp.seq,
            if wp.current { "*" } else { "" },
            wp.command.value(),
            wp.frame.value(),
            wp.latitude_deg,
            wp.longitude_deg,
            wp.altitude_m,
            wp.param1,
            wp.param2,
            wp.param3,
            wp.param4,
        );
    }
}
