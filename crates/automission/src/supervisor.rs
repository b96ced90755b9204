use crate::config::{LoadFailurePolicy, SupervisorConfig};
use crate::error::{Step, SupervisorError};
use crate::failsafe::FailsafeConfigurator;
use crate::gateway::{CommandGateway, FlightController};
use crate::loader::MissionLoader;
use crate::monitor::{ProgressMonitor, SessionState, TelemetryFeed};
use crate::sequencer::ModeSequencer;
use mission_core::{Mission, UploadReceipt};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    Failed(String),
    Skipped,
}

impl StepOutcome {
    fn from_result<E: std::fmt::Display>(result: &Result<(), E>) -> Self {
        match result {
            Ok(()) => StepOutcome::Succeeded,
            Err(err) => StepOutcome::Failed(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum FailsafeOutcome {
    AlreadyDisabled,
    Disabled,
    PartiallyDisabled,
    /// The status could not be read; nothing was changed.
    ReadFailed(String),
}

/// What happened at each step of [`MissionSupervisor::prepare`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub return_policy: StepOutcome,
    pub failsafe: FailsafeOutcome,
    pub load: StepOutcome,
    pub receipt: Option<UploadReceipt>,
    pub mission_mode: StepOutcome,
    pub arm: StepOutcome,
}

/// Runs the fixed pipeline: return policy, failsafes, mission load, mission
/// mode, arm. Then hands the telemetry feed to the progress monitor.
pub struct MissionSupervisor<C> {
    config: SupervisorConfig,
    gateway: CommandGateway<C>,
    failsafe: FailsafeConfigurator<C>,
    loader: MissionLoader<C>,
    sequencer: ModeSequencer<C>,
    progress: ProgressMonitor,
}

impl<C: FlightController> MissionSupervisor<C> {
    pub fn new(gateway: CommandGateway<C>, config: SupervisorConfig) -> Self {
        Self {
            failsafe: FailsafeConfigurator::new(gateway.clone()),
            loader: MissionLoader::new(gateway.clone()),
            sequencer: ModeSequencer::new(gateway.clone(), config.sequencer.clone()),
            progress: ProgressMonitor::new(),
            gateway,
            config,
        }
    }

    pub fn gateway(&self) -> &CommandGateway<C> {
        &self.gateway
    }

    pub fn sequencer(&self) -> &ModeSequencer<C> {
        &self.sequencer
    }

    /// Takeoff and landing are reachable through here for manual flows.
    pub fn sequencer_mut(&mut self) -> &mut ModeSequencer<C> {
        &mut self.sequencer
    }

    pub fn progress(&self) -> &ProgressMonitor {
        &self.progress
    }

    pub async fn prepare(&mut self, mission: Mission) -> Result<PipelineReport, SupervisorError> {
        let mut report = PipelineReport {
            return_policy: StepOutcome::Skipped,
            failsafe: FailsafeOutcome::AlreadyDisabled,
            load: StepOutcome::Skipped,
            receipt: None,
            mission_mode: StepOutcome::Skipped,
            arm: StepOutcome::Skipped,
        };

        let rtl = self.sequencer.set_return_policy(self.config.return_policy).await;
        if let Err(err) = &rtl {
            warn!(%err, "could not set return policy, continuing");
        }
        report.return_policy = StepOutcome::from_result(&rtl);

        report.failsafe = self.check_failsafes().await;

        match self.loader.load(mission).await {
            Ok(receipt) => {
                report.load = StepOutcome::Succeeded;
                report.receipt = Some(receipt);
            }
            Err(err) => {
                report.load = StepOutcome::Failed(err.to_string());
                match self.config.on_load_failure {
                    LoadFailurePolicy::Abort => {
                        error!(%err, "mission load failed, not switching mode or arming");
                        return Err(SupervisorError::Aborted {
                            step: Step::LoadMission,
                            reason: err.to_string(),
                        });
                    }
                    LoadFailurePolicy::Continue => {
                        warn!(%err, "mission load failed, continuing as configured");
                    }
                }
            }
        }

        let mode = self.sequencer.set_mission_mode().await;
        if let Err(err) = &mode {
            warn!(%err, "mission mode request failed");
        }
        report.mission_mode = StepOutcome::from_result(&mode);

        let arm = self.sequencer.arm().await;
        report.arm = StepOutcome::from_result(&arm);
        if let Err(err) = arm {
            if self.config.abort_on_arm_failure {
                error!(%err, "arming failed");
                return Err(SupervisorError::Aborted {
                    step: Step::Arm,
                    reason: err.to_string(),
                });
            }
            warn!(%err, "arming failed, continuing as configured");
        }

        info!("automatic sequence complete, monitoring mission progress");
        Ok(report)
    }

    /// Watches mission progress until `feed` closes.
    pub async fn monitor<F: TelemetryFeed>(&mut self, feed: F) -> SessionState {
        self.progress.run(feed).await
    }

    pub async fn run<F: TelemetryFeed>(&mut self, mission: Mission, feed: F) -> Result<SessionState, SupervisorError> {
        self.prepare(mission).await?;
        Ok(self.monitor(feed).await)
    }

    async fn check_failsafes(&self) -> FailsafeOutcome {
        let status = match self.failsafe.read_status().await {
            Ok(status) => status,
            Err(err) => {
                // Leaves whatever failsafes are configured in place.
                warn!(%err, "failsafe status unknown, skipping failsafe removal");
                return FailsafeOutcome::ReadFailed(err.to_string());
            }
        };
        if !status.any_enabled() {
            return FailsafeOutcome::AlreadyDisabled;
        }
        if self.failsafe.disable().await.is_complete() {
            FailsafeOutcome::Disabled
        } else {
            FailsafeOutcome::PartiallyDisabled
        }
    }
}
