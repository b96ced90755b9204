//! Conversions between the mission/parameter model and MAVLink payloads.

use crate::error::LinkError;
use mavlink::common::{self, MavParamType};
use mission_core::{MissionFrame, ParamValue, Waypoint};

pub(crate) const PARAM_ID_LEN: usize = 16;

/// Parameter names are NUL padded, and not NUL terminated when exactly 16 bytes long.
pub(crate) fn encode_param_id(name: &str) -> [u8; PARAM_ID_LEN] {
    let mut id = [0u8; PARAM_ID_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(PARAM_ID_LEN);
    id[..len].copy_from_slice(&bytes[..len]);
    id
}

pub(crate) fn decode_param_id(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// PX4 packs integer parameters bytewise: the integer's bits are carried in
/// the f32 field of PARAM_VALUE / PARAM_SET unchanged.
pub(crate) fn encode_param_value(value: ParamValue) -> (f32, MavParamType) {
    match value {
        ParamValue::Integer(v) => {
            let v = v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
            (f32::from_bits(v as u32), MavParamType::MAV_PARAM_TYPE_INT32)
        }
        ParamValue::Real(v) => (v as f32, MavParamType::MAV_PARAM_TYPE_REAL32),
    }
}

pub(crate) fn decode_param_value(raw: f32, param_type: MavParamType) -> ParamValue {
    let bits = raw.to_bits();
    match param_type {
        MavParamType::MAV_PARAM_TYPE_REAL32 | MavParamType::MAV_PARAM_TYPE_REAL64 => {
            ParamValue::Real(f64::from(raw))
        }
        MavParamType::MAV_PARAM_TYPE_UINT8 => ParamValue::Integer(i64::from(bits as u8)),
        MavParamType::MAV_PARAM_TYPE_INT8 => ParamValue::Integer(i64::from(bits as u8 as i8)),
        MavParamType::MAV_PARAM_TYPE_UINT16 => ParamValue::Integer(i64::from(bits as u16)),
        MavParamType::MAV_PARAM_TYPE_INT16 => ParamValue::Integer(i64::from(bits as u16 as i16)),
        MavParamType::MAV_PARAM_TYPE_UINT32 => ParamValue::Integer(i64::from(bits)),
        MavParamType::MAV_PARAM_TYPE_INT32 => ParamValue::Integer(i64::from(bits as i32)),
        // 64-bit types do not fit the f32 field; take the numeric value.
        _ => ParamValue::Integer(raw as i64),
    }
}

fn to_mav_frame(frame: MissionFrame) -> common::MavFrame {
    match frame {
        MissionFrame::Global => common::MavFrame::MAV_FRAME_GLOBAL,
        MissionFrame::LocalNed => common::MavFrame::MAV_FRAME_LOCAL_NED,
        MissionFrame::Mission => common::MavFrame::MAV_FRAME_MISSION,
        MissionFrame::GlobalRelativeAlt => common::MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT,
        MissionFrame::GlobalTerrainAlt => common::MavFrame::MAV_FRAME_GLOBAL_TERRAIN_ALT,
    }
}

fn degrees_to_e7(degrees: f64) -> i32 {
    (degrees * 1e7).round() as i32
}

pub(crate) fn mission_item_int(
    waypoint: &Waypoint,
    target_system: u8,
    target_component: u8,
) -> Result<common::MavMessage, LinkError> {
    let command_value = waypoint.command.value();
    let command = num_traits::FromPrimitive::from_u16(command_value).ok_or_else(|| {
        LinkError::MissionTransfer {
            code: "unsupported_command".to_string(),
            message: format!("unsupported MAV_CMD value {command_value}"),
        }
    })?;

    let (x, y) = if waypoint.frame.is_global_position() {
        (
            degrees_to_e7(waypoint.latitude_deg),
            degrees_to_e7(waypoint.longitude_deg),
        )
    } else {
        // Local frames carry metres in x/y, scaled by 1e4 in the INT variant.
        (
            (waypoint.latitude_deg * 1e4).round() as i32,
            (waypoint.longitude_deg * 1e4).round() as i32,
        )
    };

    Ok(common::MavMessage::MISSION_ITEM_INT(common::MISSION_ITEM_INT_DATA {
        param1: waypoint.param1,
        param2: waypoint.param2,
        param3: waypoint.param3,
        param4: waypoint.param4,
        x,
        y,
        z: waypoint.altitude_m,
        seq: waypoint.seq,
        command,
        target_system,
        target_component,
        frame: to_mav_frame(waypoint.frame),
        current: u8::from(waypoint.current),
        autocontinue: u8::from(waypoint.autocontinue),
        mission_type: common::MavMissionType::MAV_MISSION_TYPE_MISSION,
    }))
}
