use serde::{Deserialize, Serialize};

/// MAV_CMD values used by the supervisor. Anything else is carried through as `Other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandCode {
    Waypoint,
    LoiterUnlimited,
    ReturnToLaunch,
    Land,
    Takeoff,
    Other(u16),
}

impl CommandCode {
    pub fn value(self) -> u16 {
        match self {
            CommandCode::Waypoint => 16,
            CommandCode::LoiterUnlimited => 17,
            CommandCode::ReturnToLaunch => 20,
            CommandCode::Land => 21,
            CommandCode::Takeoff => 22,
            CommandCode::Other(value) => value,
        }
    }

    /// True for commands after which the vehicle is expected to be on the ground or heading home.
    pub fn ends_flight(self) -> bool {
        matches!(self, CommandCode::Land | CommandCode::ReturnToLaunch)
    }
}

impl From<u16> for CommandCode {
    fn from(value: u16) -> Self {
        match value {
            16 => CommandCode::Waypoint,
            17 => CommandCode::LoiterUnlimited,
            20 => CommandCode::ReturnToLaunch,
            21 => CommandCode::Land,
            22 => CommandCode::Takeoff,
            other => CommandCode::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissionFrame {
    Global,
    LocalNed,
    Mission,
    GlobalRelativeAlt,
    GlobalTerrainAlt,
}

impl MissionFrame {
    pub fn value(self) -> u8 {
        match self {
            MissionFrame::Global => 0,
            MissionFrame::LocalNed => 1,
            MissionFrame::Mission => 2,
            MissionFrame::GlobalRelativeAlt => 3,
            MissionFrame::GlobalTerrainAlt => 10,
        }
    }

    pub fn is_global_position(self) -> bool {
        matches!(
            self,
            MissionFrame::Global | MissionFrame::GlobalRelativeAlt | MissionFrame::GlobalTerrainAlt
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Waypoint {
    pub seq: u16,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f32,
    pub command: CommandCode,
    pub frame: MissionFrame,
    pub autocontinue: bool,
    pub param1: f32,
    pub param2: f32,
    pub param3: f32,
    pub param4: f32,
    pub current: bool,
}

impl Waypoint {
    /// A waypoint with the defaults PX4 expects for plain navigation items:
    /// relative altitude, autocontinue, zero params and an unset (NaN) yaw.
    pub fn new(
        seq: u16,
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_m: f32,
        command: CommandCode,
    ) -> Self {
        Self {
            seq,
            latitude_deg,
            longitude_deg,
            altitude_m,
            command,
            frame: MissionFrame::GlobalRelativeAlt,
            autocontinue: true,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: f32::NAN,
            current: false,
        }
    }
}

/// Ordered waypoints plus the index the vehicle should start from.
///
/// A `Mission` is moved into the loader; once uploaded the flight controller
/// holds the authoritative copy and callers only keep an [`UploadReceipt`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mission {
    pub start_index: u16,
    pub waypoints: Vec<Waypoint>,
}

impl Mission {
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadReceipt {
    pub item_count: u16,
    pub start_index: u16,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissionIssue {
    pub code: String,
    pub message: String,
    pub seq: Option<u16>,
    pub severity: IssueSeverity,
}

impl std::fmt::Display for MissionIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.seq {
            Some(seq) => write!(f, "{} (item {seq}): {}", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}
