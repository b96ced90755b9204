use crate::command::Command;
use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::state::{
    AutopilotType, LinkState, MissionItemReached, StateWriters, SystemStatus,
    VehicleIdentity, VehicleState,
};
use crate::wire;
use mavlink::common::{self, MavCmd, MavModeFlag};
use mavlink::{AsyncMavConnection, MavHeader};
use mission_core::{ParamValue, Waypoint};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

const MAGIC_FORCE_ARM_VALUE: f32 = 2989.0;
const MAGIC_FORCE_DISARM_VALUE: f32 = 21196.0;
const MODE_CONFIRM_TIMEOUT: Duration = Duration::from_secs(2);

type Connection = dyn AsyncMavConnection<common::MavMessage> + Sync + Send;

/// Remote autopilot identity, learned from its heartbeats.
#[derive(Debug, Clone, Copy)]
struct VehicleTarget {
    system_id: u8,
    component_id: u8,
    autopilot: common::MavAutopilot,
}

/// Everything a request handler needs: the connection, the state writers and
/// the vehicle target that every inbound frame may update.
struct Link<'a> {
    connection: &'a Connection,
    writers: &'a StateWriters,
    config: &'a LinkConfig,
    cancel: &'a CancellationToken,
    epoch: Instant,
    target: Option<VehicleTarget>,
}

pub(crate) async fn run_event_loop(
    connection: Box<Connection>,
    mut command_rx: mpsc::Receiver<Command>,
    writers: StateWriters,
    config: LinkConfig,
    cancel: CancellationToken,
    epoch: Instant,
) {
    let mut link = Link {
        connection: &*connection,
        writers: &writers,
        config: &config,
        cancel: &cancel,
        epoch,
        target: None,
    };
    let conn = link.connection;

    let _ = writers.link_state.send(LinkState::Connected);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("event loop cancelled");
                let _ = writers.link_state.send(LinkState::Disconnected);
                break;
            }
            Some(cmd) = command_rx.recv() => {
                match cmd {
                    Command::Shutdown => {
                        debug!("event loop shutdown requested");
                        let _ = writers.link_state.send(LinkState::Disconnected);
                        break;
                    }
                    cmd => link.handle_command(cmd).await,
                }
            }
            result = conn.recv() => {
                match result {
                    Ok((header, msg)) => link.ingest(&header, &msg),
                    Err(err) => {
                        warn!("MAVLink recv error: {err}");
                        let _ = writers.link_state.send(LinkState::Error(err.to_string()));
                        break;
                    }
                }
            }
        }
    }
}

impl Link<'_> {
    // -----------------------------------------------------------------------
    // Inbound traffic
    // -----------------------------------------------------------------------

    /// Apply one inbound frame to the target and the published state.
    fn ingest(&mut self, header: &MavHeader, message: &common::MavMessage) {
        self.update_target(header, message);

        match message {
            common::MavMessage::HEARTBEAT(hb) => {
                let Some(target) = self.target else { return };
                if header.system_id != target.system_id || header.component_id != target.component_id {
                    return;
                }
                let autopilot = AutopilotType::from_mav(target.autopilot);
                let armed = hb.base_mode.contains(MavModeFlag::MAV_MODE_FLAG_SAFETY_ARMED);
                let _ = self.writers.vehicle_state.send(VehicleState {
                    armed,
                    custom_mode: hb.custom_mode,
                    mode_name: crate::modes::mode_name(autopilot, hb.custom_mode),
                    system_status: SystemStatus::from_mav(hb.system_status),
                    autopilot,
                });
            }
            common::MavMessage::MISSION_ITEM_REACHED(data) => {
                let reached = MissionItemReached {
                    seq: data.seq,
                    received_at: self.epoch.elapsed(),
                };
                trace!(seq = reached.seq, "mission item reached");
                let _ = self.writers.mission_reached.send(reached);
            }
            common::MavMessage::STATUSTEXT(data) => {
                let text = wire::decode_param_id(&data.text[..]);
                info!(severity = ?data.severity, "autopilot: {text}");
            }
            _ => {
                trace!("unhandled message type");
            }
        }
    }

    fn update_target(&mut self, header: &MavHeader, message: &common::MavMessage) {
        if header.system_id == 0 {
            return;
        }
        let common::MavMessage::HEARTBEAT(hb) = message else {
            return;
        };
        // Other ground stations and companions also emit heartbeats.
        if hb.mavtype == common::MavType::MAV_TYPE_GCS
            || hb.autopilot == common::MavAutopilot::MAV_AUTOPILOT_INVALID
        {
            return;
        }

        let target = VehicleTarget {
            system_id: header.system_id,
            component_id: header.component_id,
            autopilot: hb.autopilot,
        };
        if self.target.is_none() {
            info!(
                system_id = target.system_id,
                component_id = target.component_id,
                "autopilot heartbeat received"
            );
        }
        self.target = Some(target);
        let identity = VehicleIdentity {
            system_id: target.system_id,
            component_id: target.component_id,
            autopilot: AutopilotType::from_mav(target.autopilot),
        };
        self.writers.identity.send_if_modified(|current| {
            if *current == Some(identity) {
                false
            } else {
                *current = Some(identity);
                true
            }
        });
    }

    // -----------------------------------------------------------------------
    // Helpers: send message, wait for response
    // -----------------------------------------------------------------------

    async fn send(&self, message: common::MavMessage) -> Result<(), LinkError> {
        self.connection
            .send(
                &MavHeader {
                    system_id: self.config.gcs_system_id,
                    component_id: self.config.gcs_component_id,
                    sequence: 0,
                },
                &message,
            )
            .await
            .map(|_| ())
            .map_err(LinkError::io)
    }

    /// Wait up to `timeout` for a frame matching `predicate`, ingesting every
    /// frame received in the meantime. `Ok(None)` means the deadline passed.
    async fn wait_for<F, T>(&mut self, timeout: Duration, mut predicate: F) -> Result<Option<T>, LinkError>
    where
        F: FnMut(&MavHeader, &common::MavMessage) -> Option<Result<T, LinkError>>,
    {
        let conn = self.connection;
        let cancel = self.cancel;
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LinkError::Cancelled),
                _ = &mut deadline => return Ok(None),
                result = conn.recv() => {
                    let (header, msg) = result.map_err(LinkError::io)?;
                    self.ingest(&header, &msg);
                    if let Some(outcome) = predicate(&header, &msg) {
                        return outcome.map(Some);
                    }
                }
            }
        }
    }

    fn target(&self) -> Result<VehicleTarget, LinkError> {
        self.target.ok_or(LinkError::IdentityUnknown)
    }

    // -----------------------------------------------------------------------
    // Command dispatch
    // -----------------------------------------------------------------------

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Arm { force, reply } => {
                let _ = reply.send(self.arm_disarm(true, force).await);
            }
            Command::Disarm { force, reply } => {
                let _ = reply.send(self.arm_disarm(false, force).await);
            }
            Command::SetMode { custom_mode, reply } => {
                let _ = reply.send(self.set_mode(custom_mode).await);
            }
            Command::CommandLong { command, params, reply } => {
                let _ = reply.send(self.command_long(command, params).await);
            }
            Command::ParamRead { name, reply } => {
                let _ = reply.send(self.param_read(&name).await);
            }
            Command::ParamWrite { name, value, reply } => {
                let _ = reply.send(self.param_write(&name, value).await);
            }
            Command::MissionUpload { start_index, waypoints, reply } => {
                let _ = reply.send(self.mission_upload(start_index, &waypoints).await);
            }
            Command::Shutdown => {
                // Handled in the main loop
            }
        }
    }

    // -----------------------------------------------------------------------
    // COMMAND_LONG
    // -----------------------------------------------------------------------

    async fn arm_disarm(&mut self, arm: bool, force: bool) -> Result<(), LinkError> {
        let param1 = if arm { 1.0 } else { 0.0 };
        let param2 = match (force, arm) {
            (false, _) => 0.0,
            (true, true) => MAGIC_FORCE_ARM_VALUE,
            (true, false) => MAGIC_FORCE_DISARM_VALUE,
        };
        self.command_long(
            MavCmd::MAV_CMD_COMPONENT_ARM_DISARM,
            [param1, param2, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
        .await
    }

    async fn command_long(&mut self, command: MavCmd, params: [f32; 7]) -> Result<(), LinkError> {
        let target = self.target()?;
        let retry_policy = self.config.retry_policy;

        for attempt in 0..=retry_policy.max_retries {
            if attempt > 0 {
                debug!(?command, attempt, "no COMMAND_ACK, resending");
            }
            self.send(common::MavMessage::COMMAND_LONG(common::COMMAND_LONG_DATA {
                target_system: target.system_id,
                target_component: target.component_id,
                command,
                confirmation: attempt,
                param1: params[0],
                param2: params[1],
                param3: params[2],
                param4: params[3],
                param5: params[4],
                param6: params[5],
                param7: params[6],
            }))
            .await?;

            let ack = self
                .wait_for(retry_policy.request_timeout(), |_, msg| match msg {
                    common::MavMessage::COMMAND_ACK(ack) if ack.command == command => {
                        match ack.result {
                            common::MavResult::MAV_RESULT_ACCEPTED => Some(Ok(())),
                            common::MavResult::MAV_RESULT_IN_PROGRESS => None,
                            result => Some(Err(LinkError::CommandRejected {
                                command: format!("{command:?}"),
                                result: format!("{result:?}"),
                            })),
                        }
                    }
                    _ => None,
                })
                .await?;

            if let Some(()) = ack {
                return Ok(());
            }
        }

        Err(LinkError::Timeout)
    }

    // -----------------------------------------------------------------------
    // Set mode
    // -----------------------------------------------------------------------

    async fn set_mode(&mut self, custom_mode: u32) -> Result<(), LinkError> {
        let (main_mode, sub_mode) = crate::modes::decode_custom_mode(custom_mode);
        let base_mode = MavModeFlag::MAV_MODE_FLAG_CUSTOM_MODE_ENABLED.bits() as f32;

        let ack = self
            .command_long(
                MavCmd::MAV_CMD_DO_SET_MODE,
                [base_mode, f32::from(main_mode), f32::from(sub_mode), 0.0, 0.0, 0.0, 0.0],
            )
            .await;

        match ack {
            Ok(()) => Ok(()),
            Err(LinkError::Timeout) => {
                // Older firmware switches without acking; accept a confirming heartbeat.
                let confirmed = self
                    .wait_for(MODE_CONFIRM_TIMEOUT, |_, msg| match msg {
                        common::MavMessage::HEARTBEAT(hb) if hb.custom_mode == custom_mode => {
                            Some(Ok(()))
                        }
                        _ => None,
                    })
                    .await?;
                confirmed.ok_or_else(|| LinkError::CommandRejected {
                    command: format!("DO_SET_MODE({main_mode}.{sub_mode})"),
                    result: "no confirming HEARTBEAT".to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }

    // -----------------------------------------------------------------------
    // Parameters
    // -----------------------------------------------------------------------

    async fn param_read(&mut self, name: &str) -> Result<ParamValue, LinkError> {
        let target = self.target()?;
        let retry_policy = self.config.retry_policy;

        for _attempt in 0..=retry_policy.max_retries {
            self.send(common::MavMessage::PARAM_REQUEST_READ(
                common::PARAM_REQUEST_READ_DATA {
                    param_index: -1,
                    target_system: target.system_id,
                    target_component: target.component_id,
                    param_id: wire::encode_param_id(name).into(),
                },
            ))
            .await?;

            let value = self
                .wait_for(retry_policy.request_timeout(), |_, msg| match msg {
                    common::MavMessage::PARAM_VALUE(data)
                        if wire::decode_param_id(&data.param_id[..]) == name =>
                    {
                        Some(Ok(wire::decode_param_value(data.param_value, data.param_type)))
                    }
                    _ => None,
                })
                .await?;

            if let Some(value) = value {
                debug!(param = name, %value, "parameter read");
                return Ok(value);
            }
        }

        Err(LinkError::Timeout)
    }

    async fn param_write(&mut self, name: &str, value: ParamValue) -> Result<ParamValue, LinkError> {
        let target = self.target()?;
        let retry_policy = self.config.retry_policy;
        let (raw, param_type) = wire::encode_param_value(value);

        for _attempt in 0..=retry_policy.max_retries {
            self.send(common::MavMessage::PARAM_SET(common::PARAM_SET_DATA {
                param_value: raw,
                target_system: target.system_id,
                target_component: target.component_id,
                param_id: wire::encode_param_id(name).into(),
                param_type,
            }))
            .await?;

            // The autopilot answers a PARAM_SET with the value it now holds.
            let echoed = self
                .wait_for(retry_policy.request_timeout(), |_, msg| match msg {
                    common::MavMessage::PARAM_VALUE(data)
                        if wire::decode_param_id(&data.param_id[..]) == name =>
                    {
                        Some(Ok(wire::decode_param_value(data.param_value, data.param_type)))
                    }
                    _ => None,
                })
                .await?;

            if let Some(reported) = echoed {
                if reported.as_real() == value.as_real() {
                    return Ok(reported);
                }
                return Err(LinkError::ParamRejected {
                    name: name.to_string(),
                    reported: reported.to_string(),
                });
            }
        }

        Err(LinkError::Timeout)
    }

    // -----------------------------------------------------------------------
    // Mission upload
    // -----------------------------------------------------------------------

    #[allow(deprecated)]
    async fn mission_upload(&mut self, start_index: u16, waypoints: &[Waypoint]) -> Result<(), LinkError> {
        let target = self.target()?;
        let retry_policy = self.config.retry_policy;
        let mission_type = common::MavMissionType::MAV_MISSION_TYPE_MISSION;
        let total = u16::try_from(waypoints.len()).map_err(|_| LinkError::MissionTransfer {
            code: "too_many_items".to_string(),
            message: format!("{} items do not fit a mission count", waypoints.len()),
        })?;

        let count_msg = common::MavMessage::MISSION_COUNT(common::MISSION_COUNT_DATA {
            count: total,
            target_system: target.system_id,
            target_component: target.component_id,
            mission_type,
            opaque_id: 0,
        });
        self.send(count_msg.clone()).await?;

        let mut transferred = HashSet::<u16>::new();
        let mut retries_used = 0u8;

        loop {
            // First request may take a while (the autopilot clears its store);
            // later ones follow quickly.
            let timeout = if transferred.is_empty() {
                retry_policy.request_timeout()
            } else {
                retry_policy.item_timeout()
            };

            enum Step {
                Request(u16),
                Accepted,
            }

            let step = self
                .wait_for(timeout, |_, msg| match msg {
                    common::MavMessage::MISSION_REQUEST_INT(data) if data.mission_type == mission_type => {
                        Some(Ok(Step::Request(data.seq)))
                    }
                    common::MavMessage::MISSION_REQUEST(data) if data.mission_type == mission_type => {
                        Some(Ok(Step::Request(data.seq)))
                    }
                    common::MavMessage::MISSION_ACK(data) if data.mission_type == mission_type => {
                        if data.mavtype == common::MavMissionResult::MAV_MISSION_ACCEPTED {
                            Some(Ok(Step::Accepted))
                        } else {
                            Some(Err(LinkError::MissionTransfer {
                                code: "transfer.ack_error".to_string(),
                                message: format!("MISSION_ACK error: {:?}", data.mavtype),
                            }))
                        }
                    }
                    _ => None,
                })
                .await?;

            match step {
                Some(Step::Accepted) => {
                    if usize::from(total) != transferred.len() {
                        warn!(
                            sent = transferred.len(),
                            total, "mission accepted before every item was requested"
                        );
                    }
                    break;
                }
                Some(Step::Request(seq)) => {
                    let waypoint = waypoints.get(usize::from(seq)).ok_or_else(|| {
                        LinkError::MissionTransfer {
                            code: "item_out_of_range".to_string(),
                            message: format!("requested item {seq} out of range"),
                        }
                    })?;
                    let item = wire::mission_item_int(waypoint, target.system_id, target.component_id)?;
                    self.send(item).await?;
                    if transferred.insert(seq) {
                        trace!(seq, total, "mission item sent");
                    }
                }
                None => {
                    if retries_used >= retry_policy.max_retries {
                        return Err(LinkError::MissionTransfer {
                            code: "transfer.timeout".to_string(),
                            message: format!(
                                "no response after {} retries ({} of {total} items sent)",
                                retries_used,
                                transferred.len()
                            ),
                        });
                    }
                    retries_used += 1;
                    if transferred.is_empty() {
                        self.send(count_msg.clone()).await?;
                    }
                }
            }
        }

        if start_index != 0 {
            self.command_long(
                MavCmd::MAV_CMD_DO_SET_MISSION_CURRENT,
                [f32::from(start_index), 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            )
            .await?;
        }

        Ok(())
    }
}
