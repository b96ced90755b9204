use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub armed: bool,
    pub custom_mode: u32,
    pub mode_name: String,
    pub system_status: SystemStatus,
    pub autopilot: AutopilotType,
}

/// A MISSION_ITEM_REACHED report. `received_at` is measured on the link's
/// monotonic clock, starting when the connection was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionItemReached {
    pub seq: u16,
    pub received_at: Duration,
}

/// Lifecycle of the event loop. Once it leaves `Connected` the link is gone
/// for good and every subscription ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdentity {
    pub system_id: u8,
    pub component_id: u8,
    pub autopilot: AutopilotType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightMode {
    pub custom_mode: u32,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    #[default]
    Unknown,
    Boot,
    Calibrating,
    Standby,
    Active,
    Critical,
    Emergency,
    Poweroff,
}

impl SystemStatus {
    pub(crate) fn from_mav(status: mavlink::common::MavState) -> Self {
        use mavlink::common::MavState;
        match status {
            MavState::MAV_STATE_BOOT => SystemStatus::Boot,
            MavState::MAV_STATE_CALIBRATING => SystemStatus::Calibrating,
            MavState::MAV_STATE_STANDBY => SystemStatus::Standby,
            MavState::MAV_STATE_ACTIVE => SystemStatus::Active,
            MavState::MAV_STATE_CRITICAL => SystemStatus::Critical,
            MavState::MAV_STATE_EMERGENCY => SystemStatus::Emergency,
            MavState::MAV_STATE_POWEROFF => SystemStatus::Poweroff,
            _ => SystemStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutopilotType {
    #[default]
    Unknown,
    Generic,
    ArduPilotMega,
    Px4,
}

impl AutopilotType {
    pub(crate) fn from_mav(autopilot: mavlink::common::MavAutopilot) -> Self {
        use mavlink::common::MavAutopilot;
        match autopilot {
            MavAutopilot::MAV_AUTOPILOT_GENERIC => AutopilotType::Generic,
            MavAutopilot::MAV_AUTOPILOT_ARDUPILOTMEGA => AutopilotType::ArduPilotMega,
            MavAutopilot::MAV_AUTOPILOT_PX4 => AutopilotType::Px4,
            _ => AutopilotType::Unknown,
        }
    }
}

/// Writer side, owned by the event loop.
pub(crate) struct StateWriters {
    pub vehicle_state: watch::Sender<VehicleState>,
    pub identity: watch::Sender<Option<VehicleIdentity>>,
    pub link_state: watch::Sender<LinkState>,
    pub mission_reached: broadcast::Sender<MissionItemReached>,
}

/// Reader side, shared by every `Vehicle` clone. The broadcast receiver is
/// only a template for `resubscribe`; it is never read itself, so the feed
/// closes once the event loop drops its sender.
pub(crate) struct StateChannels {
    pub vehicle_state: watch::Receiver<VehicleState>,
    pub identity: watch::Receiver<Option<VehicleIdentity>>,
    pub link_state: watch::Receiver<LinkState>,
    pub mission_reached: broadcast::Receiver<MissionItemReached>,
}

pub(crate) fn create_channels(reached_buffer_size: usize) -> (StateWriters, StateChannels) {
    let (vs_tx, vs_rx) = watch::channel(VehicleState::default());
    let (id_tx, id_rx) = watch::channel(None);
    let (ls_tx, ls_rx) = watch::channel(LinkState::Connecting);
    let (reached_tx, reached_rx) = broadcast::channel(reached_buffer_size.max(1));

    let writers = StateWriters {
        vehicle_state: vs_tx,
        identity: id_tx,
        link_state: ls_tx,
        mission_reached: reached_tx,
    };

    let channels = StateChannels {
        vehicle_state: vs_rx,
        identity: id_rx,
        link_state: ls_rx,
        mission_reached: reached_rx,
    };

    (writers, channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_start_connecting_without_identity() {
        let (_writers, channels) = create_channels(4);
        assert_eq!(*channels.link_state.borrow(), LinkState::Connecting);
        assert!(channels.identity.borrow().is_none());
    }

    #[test]
    fn link_error_is_visible_to_readers() {
        let (writers, channels) = create_channels(4);
        writers
            .link_state
            .send(LinkState::Error(String::from("socket closed")))
            .unwrap();
        assert_eq!(
            *channels.link_state.borrow(),
            LinkState::Error(String::from("socket closed"))
        );
    }

    #[tokio::test]
    async fn reached_subscription_ends_with_writer() {
        let (writers, channels) = create_channels(4);
        let mut rx = channels.mission_reached.resubscribe();
        drop(writers);
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
