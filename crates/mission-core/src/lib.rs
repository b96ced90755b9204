pub mod builder;
pub mod params;
pub mod progress;
pub mod types;
pub mod validation;

pub use builder::{builtin_survey_mission, MissionBuilder};
pub use params::{
    FailsafeParameter, ParamKind, ParamValue, DATALINK_LOSS_ACTION, RC_LOSS_ACTION,
    RTL_TYPE,
};
pub use progress::{MissionProgressEvent, TelemetryDecodeError, TelemetryRecord};
pub use types::{
    CommandCode, IssueSeverity, Mission, MissionFrame, MissionIssue, UploadReceipt, Waypoint,
};
pub use validation::{validate_mission, MAX_MISSION_ITEMS};
