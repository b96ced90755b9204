use super::FlightController;
use async_trait::async_trait;
use mission_core::{ParamValue, Waypoint};
use px4_link::{LinkError, Vehicle};

#[async_trait]
impl FlightController for Vehicle {
    type Error = LinkError;

    async fn wait_available(&self) -> Result<(), LinkError> {
        self.wait_ready().await.map(|_| ())
    }

    async fn get_param(&self, id: &str) -> Result<ParamValue, LinkError> {
        self.param_read(id).await
    }

    async fn set_param(&self, id: &str, value: ParamValue) -> Result<ParamValue, LinkError> {
        self.param_write(id, value).await
    }

    async fn set_mode(&self, mode: &str) -> Result<(), LinkError> {
        self.set_mode_by_name(mode).await
    }

    async fn current_mode(&self) -> Result<String, LinkError> {
        Ok(self.mode_name())
    }

    async fn arm(&self, arm: bool) -> Result<(), LinkError> {
        if arm {
            Vehicle::arm(self, false).await
        } else {
            self.disarm(false).await
        }
    }

    async fn takeoff(&self, altitude_m: f32) -> Result<(), LinkError> {
        Vehicle::takeoff(self, altitude_m).await
    }

    async fn push_mission(&self, start_index: u16, waypoints: &[Waypoint]) -> Result<(), LinkError> {
        self.upload_mission(start_index, waypoints.to_vec()).await
    }
}
