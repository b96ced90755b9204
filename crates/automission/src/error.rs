use mission_core::MissionIssue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote operation issued through the command gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GetParam,
    SetParam,
    SetMode,
    CurrentMode,
    Arm,
    Disarm,
    Takeoff,
    PushMission,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::GetParam => "get_param",
            Operation::SetParam => "set_param",
            Operation::SetMode => "set_mode",
            Operation::CurrentMode => "current_mode",
            Operation::Arm => "arm",
            Operation::Disarm => "disarm",
            Operation::Takeoff => "takeoff",
            Operation::PushMission => "push_mission",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed: {reason}")]
pub struct GatewayError {
    pub operation: Operation,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("return-to-launch policy has not been attempted yet")]
    ReturnPolicyNotAttempted,
    #[error("return-to-launch policy may only be attempted once")]
    ReturnPolicyAlreadyAttempted,
    #[error("mission mode has not been requested")]
    MissionModeNotRequested,
    #[error("vehicle did not confirm mode {expected} (last reported {observed})")]
    ModeNotConfirmed { expected: String, observed: String },
    #[error("could not read back vehicle mode: {0}")]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("mission failed validation with {} error(s)", .0.len())]
    Invalid(Vec<MissionIssue>),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Pipeline step, as named in reports and abort errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ReturnPolicy,
    Failsafe,
    LoadMission,
    MissionMode,
    Arm,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ReturnPolicy => "return policy",
            Step::Failsafe => "failsafe check",
            Step::LoadMission => "mission load",
            Step::MissionMode => "mission mode",
            Step::Arm => "arm",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("automatic sequence aborted at {step}: {reason}")]
    Aborted { step: Step, reason: String },
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error("link: {0}")]
    Link(#[from] px4_link::LinkError),
}
