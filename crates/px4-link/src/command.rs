use crate::error::LinkError;
use mavlink::common::MavCmd;
use mission_core::{ParamValue, Waypoint};
use tokio::sync::oneshot;

pub(crate) enum Command {
    Arm {
        force: bool,
        reply: oneshot::Sender<Result<(), LinkError>>,
    },
    Disarm {
        force: bool,
        reply: oneshot::Sender<Result<(), LinkError>>,
    },
    SetMode {
        custom_mode: u32,
        reply: oneshot::Sender<Result<(), LinkError>>,
    },
    CommandLong {
        command: MavCmd,
        params: [f32; 7],
        reply: oneshot::Sender<Result<(), LinkError>>,
    },
    ParamRead {
        name: String,
        reply: oneshot::Sender<Result<ParamValue, LinkError>>,
    },
    ParamWrite {
        name: String,
        value: ParamValue,
        reply: oneshot::Sender<Result<ParamValue, LinkError>>,
    },
    MissionUpload {
        start_index: u16,
        waypoints: Vec<Waypoint>,
        reply: oneshot::Sender<Result<(), LinkError>>,
    },
    Shutdown,
}
