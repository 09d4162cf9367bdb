//! Built-in dialect tables.
//!
//! These cover every message of the MAVLink `common` and `ardupilotmega`
//! definitions that fits a MAVLink 1.0 id (0-255). `ardupilotmega` holds only
//! the ArduPilot extensions and is meant to be registered after `common`.

use crate::dialect::Dialect;

pub const COMMON: &str = "common";
pub const ARDUPILOTMEGA: &str = "ardupilotmega";

const COMMON_MESSAGES: &[(u8, &str, u8)] = &[
    (0, "HEARTBEAT", 50),
    (1, "SYS_STATUS", 124),
    (2, "SYSTEM_TIME", 137),
    (4, "PING", 237),
    (5, "CHANGE_OPERATOR_CONTROL", 217),
    (6, "CHANGE_OPERATOR_CONTROL_ACK", 104),
    (7, "AUTH_KEY", 119),
    (11, "SET_MODE", 89),
    (20, "PARAM_REQUEST_READ", 214),
    (21, "PARAM_REQUEST_LIST", 159),
    (22, "PARAM_VALUE", 220),
    (23, "PARAM_SET", 168),
    (24, "GPS_RAW_INT", 24),
    (25, "GPS_STATUS", 23),
    (26, "SCALED_IMU", 170),
    (27, "RAW_IMU", 144),
    (28, "RAW_PRESSURE", 67),
    (29, "SCALED_PRESSURE", 115),
    (30, "ATTITUDE", 39),
    (31, "ATTITUDE_QUATERNION", 246),
    (32, "LOCAL_POSITION_NED", 185),
    (33, "GLOBAL_POSITION_INT", 104),
    (34, "RC_CHANNELS_SCALED", 237),
    (35, "RC_CHANNELS_RAW", 244),
    (36, "SERVO_OUTPUT_RAW", 222),
    (37, "MISSION_REQUEST_PARTIAL_LIST", 212),
    (38, "MISSION_WRITE_PARTIAL_LIST", 9),
    (39, "MISSION_ITEM", 254),
    (40, "MISSION_REQUEST", 230),
    (41, "MISSION_SET_CURRENT", 28),
    (42, "MISSION_CURRENT", 28),
    (43, "MISSION_REQUEST_LIST", 132),
    (44, "MISSION_COUNT", 221),
    (45, "MISSION_CLEAR_ALL", 232),
    (46, "MISSION_ITEM_REACHED", 11),
    (47, "MISSION_ACK", 153),
    (48, "SET_GPS_GLOBAL_ORIGIN", 41),
    (49, "GPS_GLOBAL_ORIGIN", 39),
    (50, "PARAM_MAP_RC", 78),
    (51, "MISSION_REQUEST_INT", 196),
    (54, "SAFETY_SET_ALLOWED_AREA", 15),
    (55, "SAFETY_ALLOWED_AREA", 3),
    (61, "ATTITUDE_QUATERNION_COV", 167),
    (62, "NAV_CONTROLLER_OUTPUT", 183),
    (63, "GLOBAL_POSITION_INT_COV", 119),
    (64, "LOCAL_POSITION_NED_COV", 191),
    (65, "RC_CHANNELS", 118),
    (66, "REQUEST_DATA_STREAM", 148),
    (67, "DATA_STREAM", 21),
    (69, "MANUAL_CONTROL", 243),
    (70, "RC_CHANNELS_OVERRIDE", 124),
    (73, "MISSION_ITEM_INT", 38),
    (74, "VFR_HUD", 20),
    (75, "COMMAND_INT", 158),
    (76, "COMMAND_LONG", 152),
    (77, "COMMAND_ACK", 143),
    (81, "MANUAL_SETPOINT", 106),
    (82, "SET_ATTITUDE_TARGET", 49),
    (83, "ATTITUDE_TARGET", 22),
    (84, "SET_POSITION_TARGET_LOCAL_NED", 143),
    (85, "POSITION_TARGET_LOCAL_NED", 140),
    (86, "SET_POSITION_TARGET_GLOBAL_INT", 5),
    (87, "POSITION_TARGET_GLOBAL_INT", 150),
    (89, "LOCAL_POSITION_NED_SYSTEM_GLOBAL_OFFSET", 231),
    (90, "HIL_STATE", 183),
    (91, "HIL_CONTROLS", 63),
    (92, "HIL_RC_INPUTS_RAW", 54),
    (93, "HIL_ACTUATOR_CONTROLS", 47),
    (100, "OPTICAL_FLOW", 175),
    (101, "GLOBAL_VISION_POSITION_ESTIMATE", 102),
    (102, "VISION_POSITION_ESTIMATE", 158),
    (103, "VISION_SPEED_ESTIMATE", 208),
    (104, "VICON_POSITION_ESTIMATE", 56),
    (105, "HIGHRES_IMU", 93),
    (106, "OPTICAL_FLOW_RAD", 138),
    (107, "HIL_SENSOR", 108),
    (108, "SIM_STATE", 32),
    (109, "RADIO_STATUS", 185),
    (110, "FILE_TRANSFER_PROTOCOL", 84),
    (111, "TIMESYNC", 34),
    (112, "CAMERA_TRIGGER", 174),
    (113, "HIL_GPS", 124),
    (114, "HIL_OPTICAL_FLOW", 237),
    (115, "HIL_STATE_QUATERNION", 4),
    (116, "SCALED_IMU2", 76),
    (117, "LOG_REQUEST_LIST", 128),
    (118, "LOG_ENTRY", 56),
    (119, "LOG_REQUEST_DATA", 116),
    (120, "LOG_DATA", 134),
    (121, "LOG_ERASE", 237),
    (122, "LOG_REQUEST_END", 203),
    (123, "GPS_INJECT_DATA", 250),
    (124, "GPS2_RAW", 87),
    (125, "POWER_STATUS", 203),
    (126, "SERIAL_CONTROL", 220),
    (127, "GPS_RTK", 25),
    (128, "GPS2_RTK", 226),
    (129, "SCALED_IMU3", 46),
    (130, "DATA_TRANSMISSION_HANDSHAKE", 29),
    (131, "ENCAPSULATED_DATA", 223),
    (132, "DISTANCE_SENSOR", 85),
    (133, "TERRAIN_REQUEST", 6),
    (134, "TERRAIN_DATA", 229),
    (135, "TERRAIN_CHECK", 203),
    (136, "TERRAIN_REPORT", 1),
    (137, "SCALED_PRESSURE2", 195),
    (138, "ATT_POS_MOCAP", 109),
    (139, "SET_ACTUATOR_CONTROL_TARGET", 168),
    (140, "ACTUATOR_CONTROL_TARGET", 181),
    (141, "ALTITUDE", 47),
    (142, "RESOURCE_REQUEST", 72),
    (143, "SCALED_PRESSURE3", 131),
    (144, "FOLLOW_TARGET", 127),
    (146, "CONTROL_SYSTEM_STATE", 103),
    (147, "BATTERY_STATUS", 154),
    (148, "AUTOPILOT_VERSION", 178),
    (149, "LANDING_TARGET", 200),
    (230, "ESTIMATOR_STATUS", 163),
    (231, "WIND_COV", 105),
    (232, "GPS_INPUT", 151),
    (233, "GPS_RTCM_DATA", 35),
    (234, "HIGH_LATENCY", 150),
    (235, "HIGH_LATENCY2", 179),
    (241, "VIBRATION", 90),
    (242, "HOME_POSITION", 104),
    (243, "SET_HOME_POSITION", 85),
    (244, "MESSAGE_INTERVAL", 95),
    (245, "EXTENDED_SYS_STATE", 130),
    (246, "ADSB_VEHICLE", 184),
    (247, "COLLISION", 81),
    (248, "V2_EXTENSION", 8),
    (249, "MEMORY_VECT", 204),
    (250, "DEBUG_VECT", 49),
    (251, "NAMED_VALUE_FLOAT", 170),
    (252, "NAMED_VALUE_INT", 44),
    (253, "STATUSTEXT", 83),
    (254, "DEBUG", 46),
];

const ARDUPILOTMEGA_MESSAGES: &[(u8, &str, u8)] = &[
    (150, "SENSOR_OFFSETS", 134),
    (151, "SET_MAG_OFFSETS", 219),
    (152, "MEMINFO", 208),
    (153, "AP_ADC", 188),
    (154, "DIGICAM_CONFIGURE", 84),
    (155, "DIGICAM_CONTROL", 22),
    (156, "MOUNT_CONFIGURE", 19),
    (157, "MOUNT_CONTROL", 21),
    (158, "MOUNT_STATUS", 134),
    (160, "FENCE_POINT", 78),
    (161, "FENCE_FETCH_POINT", 68),
    (162, "FENCE_STATUS", 189),
    (163, "AHRS", 127),
    (164, "SIMSTATE", 154),
    (165, "HWSTATUS", 21),
    (166, "RADIO", 21),
    (167, "LIMITS_STATUS", 144),
    (168, "WIND", 1),
    (169, "DATA16", 234),
    (170, "DATA32", 73),
    (171, "DATA64", 181),
    (172, "DATA96", 22),
    (173, "RANGEFINDER", 83),
    (174, "AIRSPEED_AUTOCAL", 167),
    (175, "RALLY_POINT", 138),
    (176, "RALLY_FETCH_POINT", 234),
    (177, "COMPASSMOT_STATUS", 240),
    (178, "AHRS2", 47),
    (179, "CAMERA_STATUS", 189),
    (180, "CAMERA_FEEDBACK", 52),
    (181, "BATTERY2", 174),
    (182, "AHRS3", 229),
    (183, "AUTOPILOT_VERSION_REQUEST", 85),
    (184, "REMOTE_LOG_DATA_BLOCK", 159),
    (185, "REMOTE_LOG_BLOCK_STATUS", 186),
    (186, "LED_CONTROL", 72),
    (191, "MAG_CAL_PROGRESS", 92),
    (192, "MAG_CAL_REPORT", 36),
    (193, "EKF_STATUS_REPORT", 71),
    (194, "PID_TUNING", 98),
    (195, "DEEPSTALL", 120),
    (200, "GIMBAL_REPORT", 134),
    (201, "GIMBAL_CONTROL", 205),
    (214, "GIMBAL_TORQUE_CMD_REPORT", 69),
    (215, "GOPRO_HEARTBEAT", 101),
    (216, "GOPRO_GET_REQUEST", 50),
    (217, "GOPRO_GET_RESPONSE", 202),
    (218, "GOPRO_SET_REQUEST", 17),
    (219, "GOPRO_SET_RESPONSE", 162),
    (226, "RPM", 207),
];

/// The `common` message set.
pub fn common() -> Dialect {
    Dialect::from_static(COMMON, COMMON_MESSAGES)
}

/// ArduPilot-specific messages.
pub fn ardupilotmega() -> Dialect {
    Dialect::from_static(ARDUPILOTMEGA, ARDUPILOTMEGA_MESSAGES)
}

/// Look up a built-in dialect by name (case-insensitive).
pub fn by_name(name: &str) -> Option<Dialect> {
    match name.to_ascii_lowercase().as_str() {
        COMMON => Some(common()),
        ARDUPILOTMEGA => Some(ardupilotmega()),
        _ => None,
    }
}

/// Names accepted by [`by_name`].
pub fn names() -> &'static [&'static str] {
    &[COMMON, ARDUPILOTMEGA]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_have_unique_ids() {
        assert_eq!(common().len(), COMMON_MESSAGES.len());
        assert_eq!(ardupilotmega().len(), ARDUPILOTMEGA_MESSAGES.len());
    }

    #[test]
    fn ardupilotmega_does_not_shadow_common() {
        let common = common();
        let apm = ardupilotmega();
        assert!(apm.messages().all(|m| !common.contains(m.id)));
    }

    #[test]
    fn well_known_seeds() {
        let common = common();
        let expected: &[(u8, &str, u8)] = &[
            (0, "HEARTBEAT", 50),
            (33, "GLOBAL_POSITION_INT", 104),
            (74, "VFR_HUD", 20),
            (101, "GLOBAL_VISION_POSITION_ESTIMATE", 102),
            (102, "VISION_POSITION_ESTIMATE", 158),
            (113, "HIL_GPS", 124),
            (115, "HIL_STATE_QUATERNION", 4),
            (116, "SCALED_IMU2", 76),
            (125, "POWER_STATUS", 203),
            (126, "SERIAL_CONTROL", 220),
            (129, "SCALED_IMU3", 46),
            (132, "DISTANCE_SENSOR", 85),
            (136, "TERRAIN_REPORT", 1),
            (137, "SCALED_PRESSURE2", 195),
            (244, "MESSAGE_INTERVAL", 95),
            (246, "ADSB_VEHICLE", 184),
            (250, "DEBUG_VECT", 49),
            (251, "NAMED_VALUE_FLOAT", 170),
            (252, "NAMED_VALUE_INT", 44),
        ];
        for &(id, name, crc_extra) in expected {
            let info = common.get(id).unwrap_or_else(|| panic!("{name} ({id}) missing"));
            assert_eq!(info.name, name);
            assert_eq!(info.crc_extra, crc_extra, "{name}");
        }

        let apm = ardupilotmega();
        assert_eq!(apm.crc_extra(163), Some(127));
        assert_eq!(apm.crc_extra(184), Some(159));
        assert_eq!(apm.crc_extra(185), Some(186));
    }

    #[test]
    fn unassigned_ids_stay_unknown() {
        let common = common();
        for id in [3, 150, 199] {
            assert!(!common.contains(id), "id {id}");
        }
        assert!(!ardupilotmega().contains(199));
    }

    #[test]
    fn by_name_is_case_insensitive() {
        assert_eq!(by_name("Common").unwrap().name(), COMMON);
        assert_eq!(by_name("ARDUPILOTMEGA").unwrap().name(), ARDUPILOTMEGA);
        assert!(by_name("minimal").is_none());
        assert_eq!(names().len(), 2);
    }
}
