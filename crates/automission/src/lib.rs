//! Supervisor for one autonomous PX4 flight.
//!
//! The pipeline sets the return-to-launch policy, clears the datalink and RC
//! failsafes when they are active, uploads a mission, switches to mission
//! mode, arms, and then follows mission progress from the vehicle's
//! "waypoint reached" reports. Every remote call goes through a
//! [`CommandGateway`] over a [`FlightController`], which `px4_link::Vehicle`
//! implements.

pub mod config;
pub mod error;
pub mod failsafe;
pub mod gateway;
pub mod loader;
pub mod monitor;
pub mod sequencer;
pub mod supervisor;

pub use config::{
    ArmPolicy, ConfigError, LoadFailurePolicy, SequencerConfig, SupervisorConfig,
};
pub use error::{
    GatewayError, LoadError, Operation, PreconditionError, SequenceError, Step, SupervisorError,
};
pub use failsafe::{DisableReport, FailsafeConfigurator, FailsafeStatus};
pub use gateway::{CommandGateway, FlightController, GatewayConfig};
pub use loader::MissionLoader;
pub use monitor::{ProgressMonitor, ProgressReport, SessionState, TelemetryFeed};
pub use sequencer::{ModeSequencer, SequencerState, DEFAULT_TAKEOFF_ALTITUDE_M, LAND_MODE};
pub use supervisor::{FailsafeOutcome, MissionSupervisor, PipelineReport, StepOutcome};
