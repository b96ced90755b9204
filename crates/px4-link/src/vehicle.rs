use crate::command::Command;
use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::event_loop::run_event_loop;
use crate::feed::MissionReachedFeed;
use crate::state::{
    create_channels, FlightMode, LinkState, MissionItemReached, StateChannels,
    VehicleIdentity, VehicleState,
};
use mavlink::common::{self, MavCmd};
use mission_core::{ParamValue, Waypoint};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Async handle to a PX4 autopilot over MAVLink.
///
/// `Vehicle` is `Clone + Send + Sync`. Clones share the same connection.
/// When the last clone is dropped, the event loop is cancelled.
#[derive(Clone)]
pub struct Vehicle {
    pub(crate) inner: Arc<VehicleInner>,
}

pub(crate) struct VehicleInner {
    pub(crate) command_tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
    channels: StateChannels,
}

impl Drop for VehicleInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Vehicle {
    /// Connect using a mavlink address string (e.g. `udpin:0.0.0.0:14540`).
    /// Waits for the first autopilot HEARTBEAT before returning, for as long
    /// as it takes.
    pub async fn connect(address: &str) -> Result<Self, LinkError> {
        Self::connect_with_config(address, LinkConfig::default()).await
    }

    pub async fn connect_with_config(address: &str, config: LinkConfig) -> Result<Self, LinkError> {
        let connection = mavlink::connect_async::<common::MavMessage>(address)
            .await
            .map_err(|err| LinkError::ConnectionFailed(err.to_string()))?;

        let (writers, channels) = create_channels(config.reached_buffer_size);
        let cancel = CancellationToken::new();
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size);
        let connect_timeout = config.connect_timeout;

        tokio::spawn(run_event_loop(
            connection,
            command_rx,
            writers,
            config,
            cancel.clone(),
            Instant::now(),
        ));

        let vehicle = Vehicle {
            inner: Arc::new(VehicleInner {
                command_tx,
                cancel,
                channels,
            }),
        };

        match connect_timeout {
            Some(limit) => tokio::time::timeout(limit, vehicle.wait_ready())
                .await
                .map_err(|_| LinkError::Timeout)??,
            None => vehicle.wait_ready().await?,
        };

        Ok(vehicle)
    }

    /// Resolves once an autopilot heartbeat has been seen. Never times out.
    pub async fn wait_ready(&self) -> Result<VehicleIdentity, LinkError> {
        let mut identity_rx = self.inner.channels.identity.clone();
        let identity = identity_rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| LinkError::Disconnected)?;
        (*identity).ok_or(LinkError::IdentityUnknown)
    }

    // --- Reactive state ---

    pub fn state(&self) -> watch::Receiver<VehicleState> {
        self.inner.channels.vehicle_state.clone()
    }

    /// Current link lifecycle; tells a closed progress feed apart from a
    /// local shutdown or a transport error.
    pub fn link_state(&self) -> watch::Receiver<LinkState> {
        self.inner.channels.link_state.clone()
    }

    pub fn identity(&self) -> Option<VehicleIdentity> {
        *self.inner.channels.identity.borrow()
    }

    /// New subscription to MISSION_ITEM_REACHED reports. Only reports received
    /// after the call are delivered; the stream ends when the link goes down.
    pub fn mission_reached(&self) -> broadcast::Receiver<MissionItemReached> {
        self.inner.channels.mission_reached.resubscribe()
    }

    /// Same as [`Vehicle::mission_reached`], with lagged reports skipped.
    pub fn mission_reached_feed(&self) -> MissionReachedFeed {
        MissionReachedFeed::new(self.mission_reached())
    }

    // --- Vehicle commands ---

    pub async fn arm(&self, force: bool) -> Result<(), LinkError> {
        self.send_command(|reply| Command::Arm { force, reply }).await
    }

    pub async fn disarm(&self, force: bool) -> Result<(), LinkError> {
        self.send_command(|reply| Command::Disarm { force, reply }).await
    }

    pub async fn set_mode(&self, custom_mode: u32) -> Result<(), LinkError> {
        self.send_command(|reply| Command::SetMode { custom_mode, reply }).await
    }

    pub async fn set_mode_by_name(&self, name: &str) -> Result<(), LinkError> {
        let autopilot = self.inner.channels.vehicle_state.borrow().autopilot;
        let custom_mode = crate::modes::mode_number(autopilot, name)
            .ok_or_else(|| LinkError::ModeNotAvailable(name.to_string()))?;
        self.set_mode(custom_mode).await
    }

    /// Name of the mode reported by the latest heartbeat.
    pub fn mode_name(&self) -> String {
        self.inner.channels.vehicle_state.borrow().mode_name.clone()
    }

    pub fn available_modes(&self) -> Vec<FlightMode> {
        let autopilot = self.inner.channels.vehicle_state.borrow().autopilot;
        crate::modes::available_modes(autopilot)
    }

    /// Take off from the current position to `altitude_m`.
    pub async fn takeoff(&self, altitude_m: f32) -> Result<(), LinkError> {
        // NaN yaw/lat/lon tell PX4 to keep the current heading and position.
        self.command_long(
            MavCmd::MAV_CMD_NAV_TAKEOFF,
            [0.0, 0.0, 0.0, f32::NAN, f32::NAN, f32::NAN, altitude_m],
        )
        .await
    }

    pub async fn command_long(&self, cmd: MavCmd, params: [f32; 7]) -> Result<(), LinkError> {
        self.send_command(|reply| Command::CommandLong {
            command: cmd,
            params,
            reply,
        })
        .await
    }

    // --- Parameters ---

    pub async fn param_read(&self, name: &str) -> Result<ParamValue, LinkError> {
        let name = name.to_string();
        self.send_command(|reply| Command::ParamRead { name, reply }).await
    }

    /// Write a parameter and return the value the autopilot reports back.
    pub async fn param_write(&self, name: &str, value: ParamValue) -> Result<ParamValue, LinkError> {
        let name = name.to_string();
        self.send_command(|reply| Command::ParamWrite { name, value, reply })
            .await
    }

    // --- Mission ---

    /// Replace the autopilot's mission with `waypoints`, then make
    /// `start_index` the current item.
    pub async fn upload_mission(&self, start_index: u16, waypoints: Vec<Waypoint>) -> Result<(), LinkError> {
        self.send_command(|reply| Command::MissionUpload {
            start_index,
            waypoints,
            reply,
        })
        .await
    }

    /// Gracefully disconnect from the vehicle. A loop that already stopped
    /// has nothing left to shut down.
    pub async fn disconnect(self) {
        if self.inner.command_tx.send(Command::Shutdown).await.is_err() {
            debug!("event loop already stopped");
        }
    }

    // --- Internal helper ---

    pub(crate) async fn send_command<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, LinkError>>) -> Command,
    ) -> Result<T, LinkError> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(make(tx))
            .await
            .map_err(|_| LinkError::Disconnected)?;
        rx.await.map_err(|_| LinkError::Disconnected)?
    }
}
