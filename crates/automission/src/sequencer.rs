use crate::config::{ArmPolicy, SequencerConfig};
use crate::error::{PreconditionError, SequenceError};
use crate::gateway::{CommandGateway, FlightController};
use mission_core::{ParamValue, RTL_TYPE};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

pub const LAND_MODE: &str = "AUTO.LAND";
pub const DEFAULT_TAKEOFF_ALTITUDE_M: f32 = 2.5;

/// Vehicle mode as this sequencer last understood it. Only advanced on a
/// successful request; nothing here is read back from the vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerState {
    #[default]
    Unknown,
    ReturnPolicySet,
    MissionModeActive,
    Armed,
    Landed,
}

pub struct ModeSequencer<C> {
    gateway: CommandGateway<C>,
    config: SequencerConfig,
    state: SequencerState,
    return_policy_attempted: bool,
    mission_mode_requested: bool,
}

impl<C: FlightController> ModeSequencer<C> {
    pub fn new(gateway: CommandGateway<C>, config: SequencerConfig) -> Self {
        Self {
            gateway,
            config,
            state: SequencerState::Unknown,
            return_policy_attempted: false,
            mission_mode_requested: false,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn mission_mode_requested(&self) -> bool {
        self.mission_mode_requested
    }

    /// Writes `RTL_TYPE`. Only one attempt is allowed per sequencer.
    pub async fn set_return_policy(&mut self, value: i64) -> Result<(), SequenceError> {
        if self.return_policy_attempted {
            return Err(PreconditionError::ReturnPolicyAlreadyAttempted.into());
        }
        self.return_policy_attempted = true;

        self.gateway
            .set_param(RTL_TYPE, ParamValue::Integer(value))
            .await?;
        info!("{RTL_TYPE} set to {value}");
        self.state = SequencerState::ReturnPolicySet;
        Ok(())
    }

    pub async fn set_mission_mode(&mut self) -> Result<(), SequenceError> {
        if !self.return_policy_attempted {
            warn!("mission mode requested before the return policy");
            return Err(PreconditionError::ReturnPolicyNotAttempted.into());
        }

        // Counts as requested even if the request fails; fire-and-forget
        // arming relies on that.
        self.mission_mode_requested = true;
        self.gateway.set_mode(&self.config.mission_mode).await?;
        info!(mode = %self.config.mission_mode, "entering mission mode");
        self.state = SequencerState::MissionModeActive;
        Ok(())
    }

    pub async fn arm(&mut self) -> Result<(), SequenceError> {
        if !self.mission_mode_requested {
            warn!("arm requested before mission mode");
            return Err(PreconditionError::MissionModeNotRequested.into());
        }
        if self.config.arm_policy == ArmPolicy::ConfirmMode {
            self.confirm_mission_mode().await?;
        }

        self.gateway.arm(true).await?;
        info!("arming motors OK");
        self.state = SequencerState::Armed;
        Ok(())
    }

    /// Out-of-band takeoff to `altitude_m` above home.
    pub async fn takeoff(&mut self, altitude_m: f32) -> Result<(), SequenceError> {
        self.gateway.takeoff(altitude_m).await?;
        info!(altitude_m, "taking off");
        Ok(())
    }

    /// Out-of-band switch to `AUTO.LAND`.
    pub async fn land(&mut self) -> Result<(), SequenceError> {
        self.gateway.set_mode(LAND_MODE).await?;
        info!("landing");
        self.state = SequencerState::Landed;
        Ok(())
    }

    async fn confirm_mission_mode(&self) -> Result<(), PreconditionError> {
        let expected = &self.config.mission_mode;
        let deadline = Instant::now() + self.config.mode_confirm_timeout;
        loop {
            let observed = self.gateway.current_mode().await?;
            if observed.eq_ignore_ascii_case(expected) {
                info!(mode = %observed, "mission mode confirmed");
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!(%expected, %observed, "mission mode not confirmed, refusing to arm");
                return Err(PreconditionError::ModeNotConfirmed {
                    expected: expected.clone(),
                    observed,
                });
            }
            tokio::time::sleep(self.config.mode_poll_interval).await;
        }
    }
}
