use crate::gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CONNECTION: &str = "udpin:0.0.0.0:14540";
pub const DEFAULT_MISSION_MODE: &str = "AUTO.MISSION";

/// What the supervisor does when the mission upload fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadFailurePolicy {
    /// Stop before any mode change or arming.
    #[default]
    Abort,
    /// Log the failure and carry on with mode change and arming.
    Continue,
}

impl FromStr for LoadFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            _ => Err("expected `abort` or `continue`".to_string()),
        }
    }
}

/// Whether arming waits for the vehicle to report the mission mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArmPolicy {
    #[default]
    ConfirmMode,
    FireAndForget,
}

impl FromStr for ArmPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirm" | "confirm-mode" => Ok(Self::ConfirmMode),
            "fire-and-forget" => Ok(Self::FireAndForget),
            _ => Err("expected `confirm` or `fire-and-forget`".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Mode sequencing knobs, split out so the sequencer does not need the
/// whole supervisor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerConfig {
    pub mission_mode: String,
    pub arm_policy: ArmPolicy,
    pub mode_confirm_timeout: Duration,
    pub mode_poll_interval: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            mission_mode: DEFAULT_MISSION_MODE.to_string(),
            arm_policy: ArmPolicy::ConfirmMode,
            mode_confirm_timeout: Duration::from_millis(5000),
            mode_poll_interval: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// MAVLink address handed to `px4_link::Vehicle::connect`.
    pub connection: String,
    /// Value written to `RTL_TYPE` before anything else.
    pub return_policy: i64,
    pub on_load_failure: LoadFailurePolicy,
    pub abort_on_arm_failure: bool,
    pub sequencer: SequencerConfig,
    pub gateway: GatewayConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            connection: DEFAULT_CONNECTION.to_string(),
            return_policy: 0,
            on_load_failure: LoadFailurePolicy::Abort,
            abort_on_arm_failure: true,
            sequencer: SequencerConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl SupervisorConfig {
    /// Defaults overridden by `AUTOMISSION_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(connection) = lookup("AUTOMISSION_CONNECTION") {
            config.connection = connection;
        }
        if let Some(value) = parse(&lookup, "AUTOMISSION_RTL_TYPE")? {
            config.return_policy = value;
        }
        if let Some(mode) = lookup("AUTOMISSION_MISSION_MODE") {
            config.sequencer.mission_mode = mode.trim().to_uppercase();
        }
        if let Some(policy) = parse(&lookup, "AUTOMISSION_ON_LOAD_FAILURE")? {
            config.on_load_failure = policy;
        }
        if let Some(policy) = parse(&lookup, "AUTOMISSION_ARM_POLICY")? {
            config.sequencer.arm_policy = policy;
        }
        if let Some(ms) = parse::<u64>(&lookup, "AUTOMISSION_MODE_CONFIRM_TIMEOUT_MS")? {
            config.sequencer.mode_confirm_timeout = Duration::from_millis(ms);
        }
        if let Some(abort) = parse(&lookup, "AUTOMISSION_ABORT_ON_ARM_FAILURE")? {
            config.abort_on_arm_failure = abort;
        }
        if let Some(ms) = parse::<u64>(&lookup, "AUTOMISSION_CALL_TIMEOUT_MS")? {
            config.gateway.call_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        Ok(config)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim().parse().map(Some).map_err(|err: T::Err| ConfigError {
        key,
        value: raw.clone(),
        reason: err.to_string(),
    })
}
