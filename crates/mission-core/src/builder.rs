use crate::types::{CommandCode, Mission, Waypoint};

/// Builds a [`Mission`] with contiguous sequence numbers. The first item is
/// marked current unless [`MissionBuilder::start_at`] picks another one.
#[derive(Debug, Clone, Default)]
pub struct MissionBuilder {
    start_index: u16,
    waypoints: Vec<Waypoint>,
}

impl MissionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_at(mut self, index: u16) -> Self {
        self.start_index = index;
        self
    }

    /// Appends `waypoint`, overwriting its sequence number and current flag.
    pub fn push(mut self, mut waypoint: Waypoint) -> Self {
        waypoint.seq = self.waypoints.len() as u16;
        waypoint.current = false;
        self.waypoints.push(waypoint);
        self
    }

    /// Takeoff item; `pitch_deg` is the minimum climb pitch (param1) for fixed wing.
    pub fn takeoff(self, latitude_deg: f64, longitude_deg: f64, altitude_m: f32, pitch_deg: f32) -> Self {
        let mut wp = Waypoint::new(0, latitude_deg, longitude_deg, altitude_m, CommandCode::Takeoff);
        wp.param1 = pitch_deg;
        self.push(wp)
    }

    /// Navigation item; `hold_s` is the time spent at the waypoint (param1).
    pub fn waypoint(self, latitude_deg: f64, longitude_deg: f64, altitude_m: f32, hold_s: f32) -> Self {
        let mut wp = Waypoint::new(0, latitude_deg, longitude_deg, altitude_m, CommandCode::Waypoint);
        wp.param1 = hold_s;
        self.push(wp)
    }

    pub fn land(self, latitude_deg: f64, longitude_deg: f64) -> Self {
        self.push(Waypoint::new(0, latitude_deg, longitude_deg, 0.0, CommandCode::Land))
    }

    pub fn return_to_launch(self) -> Self {
        self.push(Waypoint::new(0, 0.0, 0.0, 0.0, CommandCode::ReturnToLaunch))
    }

    pub fn build(mut self) -> Mission {
        if let Some(wp) = self.waypoints.get_mut(usize::from(self.start_index)) {
            wp.current = true;
        }
        Mission {
            start_index: self.start_index,
            waypoints: self.waypoints,
        }
    }
}

/// Short survey flight over the test field used by the SITL setup:
/// takeoff to 30 m, three navigation legs descending to 10 m, then land.
pub fn builtin_survey_mission() -> Mission {
    MissionBuilder::new()
        .takeoff(40.092141, -3.692452, 30.0, 15.0)
        .waypoint(40.093716, -3.692720, 30.0, 0.0)
        .waypoint(40.093051, -3.699953, 20.0, 10.0)
        .waypoint(40.091560, -3.699741, 10.0, 5.0)
        .land(40.091738, -3.695878)
        .build()
}
