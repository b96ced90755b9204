use crate::state::{AutopilotType, FlightMode};

// PX4 packs its mode into HEARTBEAT.custom_mode as
// `reserved: u16 | main_mode: u8 | sub_mode: u8` (little endian).
const MAIN_MODE_SHIFT: u32 = 16;
const SUB_MODE_SHIFT: u32 = 24;
const MAIN_MODE_AUTO: u8 = 4;

const PX4_MODES: &[(u8, u8, &str)] = &[
    (1, 0, "MANUAL"),
    (2, 0, "ALTCTL"),
    (3, 0, "POSCTL"),
    (4, 1, "AUTO.READY"),
    (4, 2, "AUTO.TAKEOFF"),
    (4, 3, "AUTO.LOITER"),
    (4, 4, "AUTO.MISSION"),
    (4, 5, "AUTO.RTL"),
    (4, 6, "AUTO.LAND"),
    (4, 8, "AUTO.FOLLOW_TARGET"),
    (4, 9, "AUTO.PRECLAND"),
    (5, 0, "ACRO"),
    (6, 0, "OFFBOARD"),
    (7, 0, "STABILIZED"),
];

/// Split a PX4 custom mode into `(main_mode, sub_mode)`.
pub fn decode_custom_mode(custom_mode: u32) -> (u8, u8) {
    let main = ((custom_mode >> MAIN_MODE_SHIFT) & 0xFF) as u8;
    let sub = ((custom_mode >> SUB_MODE_SHIFT) & 0xFF) as u8;
    (main, sub)
}

pub fn encode_custom_mode(main_mode: u8, sub_mode: u8) -> u32 {
    (u32::from(main_mode) << MAIN_MODE_SHIFT) | (u32::from(sub_mode) << SUB_MODE_SHIFT)
}

fn supports_px4_modes(autopilot: AutopilotType) -> bool {
    // Some SITL bridges report GENERIC; the PX4 table is still the right one for them.
    matches!(autopilot, AutopilotType::Px4 | AutopilotType::Generic)
}

pub(crate) fn mode_name(autopilot: AutopilotType, custom_mode: u32) -> String {
    if !supports_px4_modes(autopilot) {
        return format!("MODE({custom_mode})");
    }
    let (main, sub) = decode_custom_mode(custom_mode);
    // Sub mode only carries meaning inside AUTO.
    let sub = if main == MAIN_MODE_AUTO { sub } else { 0 };
    PX4_MODES
        .iter()
        .find(|&&(m, s, _)| m == main && s == sub)
        .map(|&(_, _, name)| name.to_string())
        .unwrap_or_else(|| format!("UNKNOWN({main}.{sub})"))
}

pub(crate) fn mode_number(autopilot: AutopilotType, name: &str) -> Option<u32> {
    if !supports_px4_modes(autopilot) {
        return None;
    }
    let upper = name.to_uppercase();
    PX4_MODES
        .iter()
        .find(|&&(_, _, mode_name)| mode_name == upper)
        .map(|&(main, sub, _)| encode_custom_mode(main, sub))
}

pub(crate) fn available_modes(autopilot: AutopilotType) -> Vec<FlightMode> {
    if !supports_px4_modes(autopilot) {
        return Vec::new();
    }
    PX4_MODES
        .iter()
        .map(|&(main, sub, name)| FlightMode {
            custom_mode: encode_custom_mode(main, sub),
            name: name.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_mission_encoding() {
        assert_eq!(encode_custom_mode(4, 4), 0x0404_0000);
        assert_eq!(decode_custom_mode(0x0404_0000), (4, 4));
    }

    #[test]
    fn auto_mission_name() {
        assert_eq!(mode_name(AutopilotType::Px4, 0x0404_0000), "AUTO.MISSION");
    }

    #[test]
    fn auto_land_number_case_insensitive() {
        assert_eq!(
            mode_number(AutopilotType::Px4, "auto.land"),
            Some(encode_custom_mode(4, 6))
        );
    }

    #[test]
    fn posctl_ignores_sub_mode_noise() {
        let noisy = encode_custom_mode(3, 7);
        assert_eq!(mode_name(AutopilotType::Px4, noisy), "POSCTL");
    }

    #[test]
    fn unknown_auto_sub_mode() {
        assert_eq!(
            mode_name(AutopilotType::Px4, encode_custom_mode(4, 42)),
            "UNKNOWN(4.42)"
        );
    }

    #[test]
    fn ardupilot_has_no_px4_modes() {
        assert_eq!(mode_name(AutopilotType::ArduPilotMega, 3), "MODE(3)");
        assert_eq!(mode_number(AutopilotType::ArduPilotMega, "AUTO.MISSION"), None);
        assert!(available_modes(AutopilotType::ArduPilotMega).is_empty());
    }

    #[test]
    fn available_modes_roundtrip_through_names() {
        for mode in available_modes(AutopilotType::Px4) {
            assert_eq!(mode_name(AutopilotType::Px4, mode.custom_mode), mode.name);
        }
    }
}
