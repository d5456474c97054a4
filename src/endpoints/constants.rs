//! Tinymovr endpoint table. This is the wire contract with the device firmware: IDs, field order and field widths must match exactly.
use semver::Version;

use super::{Direction, Endpoint};
use crate::codec::DataType::{Float, Int16, UInt16, UInt32, UInt8};
use crate::codec::Unit;

/// Number of low bits of the arbitration ID reserved for the endpoint ID. The node ID occupies the bits above.
pub const ENDPOINT_ID_BITS: u32 = 6;
/// Largest node ID that still yields an 11 bit identifier
pub const MAX_NODE_ID: u8 = 0x1f;
/// Largest standard (11 bit) identifier
pub const MAX_STANDARD_ID: u32 = 0x7ff;

const TICK: Option<Unit> = Some(Unit::Tick);
const TICK_PER_SECOND: Option<Unit> = Some(Unit::TickPerSecond);
const AMPERE: Option<Unit> = Some(Unit::Ampere);
const VELOCITY_GAIN: Option<Unit> = Some(Unit::AmpereSecondPerTick);

const fn command(name: &'static str, description: &'static str, ep_id: u16) -> Endpoint {
    Endpoint {
        name,
        description,
        ep_id,
        direction: Direction::Write,
        types: &[],
        labels: &[],
        units: None,
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    }
}

pub static ENDPOINTS: &[Endpoint] = &[
    command("nmt", "CANOpen NMT Message", 0x000),
    command("heartbeat", "CANOpen Heartbeat Message", 0x700),
    command("estop", "Tinymovr Estop Message", 0x002),
    Endpoint {
        name: "state",
        description: "Get Tinymovr State, Control Mode and Error Code",
        ep_id: 0x003,
        direction: Direction::Read,
        types: &[UInt8; 8],
        labels: &["error", "state", "mode", "error0", "error1", "error2", "error3", "error4"],
        units: None,
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "min_studio_version",
        description: "Get the minimum Studio Version required by the Firmware",
        ep_id: 0x004,
        direction: Direction::Read,
        types: &[UInt8, UInt8, UInt8],
        labels: &["fw_major", "fw_minor", "fw_patch"],
        units: None,
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "can_config",
        description: "Get CAN Config",
        ep_id: 0x005,
        direction: Direction::Read,
        types: &[UInt8, UInt16],
        labels: &["id", "baud_rate"],
        units: None,
        defaults: &[],
        ser_map: &[("can", &["id", "baud_rate"])],
        min_firmware: None,
    },
    Endpoint {
        name: "set_can_config",
        description: "Set CAN Config",
        ep_id: 0x006,
        direction: Direction::Write,
        types: &[UInt8, UInt16],
        labels: &["id", "baud_rate"],
        units: None,
        defaults: &[("baud_rate", 0.0)],
        ser_map: &[("can", &["id", "baud_rate"])],
        min_firmware: None,
    },
    Endpoint {
        name: "set_state",
        description: "Set Tinymovr State and optionally Control Mode",
        ep_id: 0x007,
        direction: Direction::Write,
        types: &[UInt8, UInt8],
        labels: &["state", "mode"],
        units: None,
        defaults: &[("mode", 0.0)],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "encoder_estimates",
        description: "Get Encoder Estimates (Position, Velocity)",
        ep_id: 0x009,
        direction: Direction::Read,
        types: &[Float, Float],
        labels: &["position", "velocity"],
        units: Some(&[TICK, TICK_PER_SECOND]),
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "setpoints",
        description: "Get Setpoints (Position, Velocity)",
        ep_id: 0x00a,
        direction: Direction::Read,
        types: &[Float, Float],
        labels: &["position", "velocity"],
        units: Some(&[TICK, TICK_PER_SECOND]),
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "set_pos_setpoint",
        description: "Set Position Setpoint",
        ep_id: 0x00c,
        direction: Direction::Write,
        types: &[Float, Int16, Int16],
        labels: &["position", "velocity_ff", "current_ff"],
        units: Some(&[TICK, Some(Unit::DecatickPerSecond), Some(Unit::Centiampere)]),
        defaults: &[("velocity_ff", 0.0), ("current_ff", 0.0)],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "set_vel_setpoint",
        description: "Set Velocity Setpoint",
        ep_id: 0x00d,
        direction: Direction::Write,
        types: &[Float, Float],
        labels: &["velocity", "current_ff"],
        units: Some(&[TICK_PER_SECOND, AMPERE]),
        defaults: &[("current_ff", 0.0)],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "set_cur_setpoint",
        description: "Set Current (Iq) Setpoint",
        ep_id: 0x00e,
        direction: Direction::Write,
        types: &[Float],
        labels: &["current"],
        units: Some(&[AMPERE]),
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "set_limits",
        description: "Set Limits (Velocity, Current)",
        ep_id: 0x00f,
        direction: Direction::Write,
        types: &[Float, Float],
        labels: &["velocity", "current"],
        units: Some(&[TICK_PER_SECOND, AMPERE]),
        defaults: &[],
        ser_map: &[("limits", &["velocity", "current"])],
        min_firmware: None,
    },
    Endpoint {
        name: "Iphase",
        description: "Get measured phase currents",
        ep_id: 0x010,
        direction: Direction::Read,
        types: &[Int16, Int16, Int16],
        labels: &["I_A", "I_B", "I_C"],
        units: Some(&[Some(Unit::Milliampere); 3]),
        defaults: &[],
        ser_map: &[],
        min_firmware: Some(Version::new(0, 7, 1)),
    },
    Endpoint {
        name: "integrator_gains",
        description: "Get Integrator Gains (Velocity)",
        ep_id: 0x012,
        direction: Direction::Read,
        types: &[Float],
        labels: &["velocity"],
        units: Some(&[VELOCITY_GAIN]),
        defaults: &[],
        ser_map: &[("integrator_gains", &["velocity"])],
        min_firmware: None,
    },
    Endpoint {
        name: "set_integrator_gains",
        description: "Set Integrator Gains (Velocity)",
        ep_id: 0x013,
        direction: Direction::Write,
        types: &[Float],
        labels: &["velocity"],
        units: Some(&[VELOCITY_GAIN]),
        defaults: &[],
        ser_map: &[("integrator_gains", &["velocity"])],
        min_firmware: None,
    },
    Endpoint {
        name: "Iq",
        description: "Get quadrature current setpoint and estimate",
        ep_id: 0x014,
        direction: Direction::Read,
        types: &[Float, Float],
        labels: &["setpoint", "estimate"],
        units: Some(&[AMPERE, AMPERE]),
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "limits",
        description: "Get velocity and current limits",
        ep_id: 0x015,
        direction: Direction::Read,
        types: &[Float, Float],
        labels: &["velocity", "current"],
        units: Some(&[TICK_PER_SECOND, AMPERE]),
        defaults: &[],
        ser_map: &[("limits", &["velocity", "current"])],
        min_firmware: None,
    },
    command("reset", "Tinymovr Reset Message", 0x016),
    Endpoint {
        name: "Vbus",
        description: "Get Bus Voltage",
        ep_id: 0x017,
        direction: Direction::Read,
        types: &[Float],
        labels: &["voltage"],
        units: Some(&[Some(Unit::Volt)]),
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "gains",
        description: "Get Gains (Position, Velocity)",
        ep_id: 0x018,
        direction: Direction::Read,
        types: &[Float, Float],
        labels: &["position", "velocity"],
        units: Some(&[Some(Unit::PerSecond), VELOCITY_GAIN]),
        defaults: &[],
        ser_map: &[("gains", &["position", "velocity"])],
        min_firmware: None,
    },
    Endpoint {
        name: "set_gains",
        description: "Set Gains (Position, Velocity)",
        ep_id: 0x019,
        direction: Direction::Write,
        types: &[Float, Float],
        labels: &["position", "velocity"],
        units: Some(&[Some(Unit::PerSecond), VELOCITY_GAIN]),
        defaults: &[],
        ser_map: &[("gains", &["position", "velocity"])],
        min_firmware: None,
    },
    Endpoint {
        name: "device_info",
        description: "Get Device Info",
        ep_id: 0x01a,
        direction: Direction::Read,
        types: &[UInt32, UInt8, UInt8, UInt8, UInt8],
        labels: &["device_id", "fw_major", "fw_minor", "fw_patch", "temp"],
        units: None,
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    },
    Endpoint {
        name: "timings",
        description: "Get Processor Timings (Total Cycles/PWM, Busy Cycles/PWM)",
        ep_id: 0x01b,
        direction: Direction::Read,
        types: &[UInt32, UInt32],
        labels: &["total", "busy"],
        units: None,
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    },
    command("save_config", "Save Configuration", 0x01c),
    command("erase_config", "Erase Configuration", 0x01d),
    Endpoint {
        name: "motor_config",
        description: "Get Motor Configuration (Flags (calibrated, is_gimbal), Resistance, Pole Pairs, Inductance, Calibration Current)",
        ep_id: 0x01e,
        direction: Direction::Read,
        types: &[UInt8, UInt16, UInt8, UInt16, UInt16],
        labels: &["flags", "R", "pole_pairs", "L", "I_cal"],
        units: Some(&[
            None,
            Some(Unit::Milliohm),
            None,
            Some(Unit::Microhenry),
            Some(Unit::Milliampere),
        ]),
        defaults: &[],
        ser_map: &[("motor", &["R", "L", "pole_pairs", "I_cal"])],
        min_firmware: None,
    },
    Endpoint {
        name: "set_motor_config",
        description: "Set Motor Configuration (Flags (is_gimbal), Resistance, Inductance, Calibration Current)",
        ep_id: 0x01f,
        direction: Direction::Write,
        types: &[UInt8, UInt16, UInt16, UInt16],
        labels: &["flags", "R", "L", "I_cal"],
        units: Some(&[None, Some(Unit::Milliohm), Some(Unit::Microhenry), Some(Unit::Milliampere)]),
        defaults: &[],
        ser_map: &[("motor", &["R", "L"])],
        min_firmware: None,
    },
];
