//! MAVLink link to a PX4 autopilot: parameters, modes, arming, mission
//! upload and mission progress reports behind one async [`Vehicle`] handle.

pub mod config;
pub mod error;
pub mod feed;
pub mod modes;
pub mod state;
pub mod vehicle;

mod command;
mod event_loop;
mod wire;

pub use config::{LinkConfig, RetryPolicy};
pub use error::LinkError;
pub use feed::MissionReachedFeed;
pub use vehicle::Vehicle;

pub use state::{
    AutopilotType, FlightMode, LinkState, MissionItemReached, SystemStatus,
    VehicleIdentity, VehicleState,
};
