//! Simulated Tinymovr implementing [`CanAdapter`].
//!
//! The simulated device sits directly behind the adapter: every frame sent is delivered to the device, and its answers are returned by the next [`CanAdapter::recv`]. Payloads go through the same codec as the client, so the simulation checks both sides of the wire format.
//! ## Example
//! ```rust
//! use tinymovr::can::AsyncCanAdapter;
//! use tinymovr::client::Tinymovr;
//! use tinymovr::sim::SimulatedDevice;
//!
//! async fn sim_example() {
//!     let adapter = AsyncCanAdapter::new(SimulatedDevice::new(1));
//!     let tm = Tinymovr::from_node_id(&adapter, 1);
//!
//!     tm.calibrate().await.unwrap();
//!     tm.velocity_control().await.unwrap();
//!     assert!(tm.state().await.unwrap().errors.is_empty());
//! }
//! ```

mod model;

use std::collections::VecDeque;

use semver::Version;
use tracing::{debug, info, warn};

use crate::can::{CanAdapter, Frame};
use crate::codec::{self, Quantity, Record};
use crate::endpoints::{self, Endpoint};
use crate::Result;
use model::Model;

const DEFAULT_DEVICE_ID: u32 = 0x0001_e240;
const DEFAULT_FIRMWARE: Version = Version::new(0, 8, 4);

/// A Tinymovr on a simulated bus.
pub struct SimulatedDevice {
    node_id: u8,
    device_id: u32,
    firmware: Version,
    model: Model,
    pending: Vec<Frame>,
}

impl SimulatedDevice {
    pub fn new(node_id: u8) -> Self {
        info!("Simulating Tinymovr on node {}", node_id);
        Self {
            node_id,
            device_id: DEFAULT_DEVICE_ID,
            firmware: DEFAULT_FIRMWARE,
            model: Model::new(node_id),
            pending: vec![],
        }
    }

    /// Simulate a device running `firmware`. Endpoints newer than the firmware are ignored by the device.
    pub fn with_firmware(mut self, firmware: Version) -> Self {
        self.firmware = firmware;
        self
    }

    pub fn with_device_id(mut self, device_id: u32) -> Self {
        self.device_id = device_id;
        self
    }

    fn handle(&mut self, frame: &Frame) {
        if frame.id.is_extended() {
            return;
        }

        let (node_id, ep_id) = endpoints::split_id(frame.id);
        if node_id != self.node_id {
            return;
        }

        let endpoint = match endpoints::table().by_ep_id(ep_id) {
            Some(endpoint) => endpoint,
            None => {
                warn!("Node {}: unknown endpoint 0x{:03x}", self.node_id, ep_id);
                return;
            }
        };

        if endpoint.check_firmware(Some(&self.firmware)).is_err() {
            debug!("Node {}: {} not implemented by firmware {}", self.node_id, endpoint.name, self.firmware);
            return;
        }

        match (frame.rtr, endpoint.is_read()) {
            (true, true) => self.respond(endpoint, frame),
            (false, false) => match codec::decode(endpoint, &frame.data) {
                Ok(record) => self.apply(&record),
                Err(e) => warn!("Node {}: dropping {}: {}", self.node_id, endpoint.name, e),
            },
            _ => warn!("Node {}: {} used in the wrong direction", self.node_id, endpoint.name),
        }
    }

    fn respond(&mut self, endpoint: &Endpoint, request: &Frame) {
        let values = self.values(endpoint.name);
        let payload = match codec::encode(endpoint, &values) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Node {}: cannot answer {}: {}", self.node_id, endpoint.name, e);
                return;
            }
        };

        match Frame::new(request.bus, request.id, &payload) {
            Ok(frame) => self.pending.push(frame),
            Err(e) => warn!("Node {}: cannot answer {}: {}", self.node_id, endpoint.name, e),
        }
    }

    /// Current values of a read endpoint, in the endpoint's canonical units
    fn values(&self, name: &str) -> Vec<(&'static str, Quantity)> {
        let m = &self.model;
        let bare = |values: &[(&'static str, f64)]| -> Vec<(&'static str, Quantity)> {
            values.iter().map(|&(label, value)| (label, Quantity::bare(value))).collect()
        };

        match name {
            "state" => {
                let mut errors = [0u8; 5];
                for (slot, error) in errors.iter_mut().zip(&m.errors) {
                    *slot = (*error).into();
                }
                bare(&[
                    ("error", errors[0] as f64),
                    ("state", m.state as u8 as f64),
                    ("mode", m.mode as u8 as f64),
                    ("error0", errors[0] as f64),
                    ("error1", errors[1] as f64),
                    ("error2", errors[2] as f64),
                    ("error3", errors[3] as f64),
                    ("error4", errors[4] as f64),
                ])
            }
            "min_studio_version" => bare(&[("fw_major", 0.0), ("fw_minor", 7.0), ("fw_patch", 0.0)]),
            "can_config" => bare(&[
                ("id", m.config.can_id as f64),
                ("baud_rate", m.config.baud_rate as f64),
            ]),
            "encoder_estimates" => bare(&[("position", m.position), ("velocity", m.velocity)]),
            "setpoints" => bare(&[("position", m.pos_setpoint), ("velocity", m.vel_setpoint)]),
            "Iphase" => {
                // Balanced three phase currents for the present Iq
                let ma = m.iq_estimate * 1000.0;
                bare(&[("I_A", ma), ("I_B", -ma / 2.0), ("I_C", -ma / 2.0)])
            }
            "integrator_gains" => bare(&[("velocity", m.config.vel_integrator_gain)]),
            "Iq" => bare(&[("setpoint", m.iq_setpoint), ("estimate", m.iq_estimate)]),
            "limits" => bare(&[("velocity", m.config.vel_limit), ("current", m.config.cur_limit)]),
            "Vbus" => bare(&[("voltage", m.vbus)]),
            "gains" => bare(&[("position", m.config.pos_gain), ("velocity", m.config.vel_gain)]),
            "device_info" => bare(&[
                ("device_id", self.device_id as f64),
                ("fw_major", self.firmware.major as f64),
                ("fw_minor", self.firmware.minor as f64),
                ("fw_patch", self.firmware.patch as f64),
                ("temp", m.temperature),
            ]),
            "timings" => bare(&[("total", 3000.0), ("busy", 1250.0)]),
            "motor_config" => {
                let motor = &m.config.motor;
                let flags = (m.config.calibrated as u8) | ((motor.is_gimbal as u8) << 1);
                bare(&[
                    ("flags", flags as f64),
                    ("R", motor.resistance),
                    ("pole_pairs", motor.pole_pairs as f64),
                    ("L", motor.inductance),
                    ("I_cal", motor.calibration_current),
                ])
            }
            _ => vec![],
        }
    }

    fn apply(&mut self, record: &Record) {
        let node_id = self.node_id;
        let value = |label: &str| record.value(label).unwrap_or_default();

        match record.endpoint() {
            "nmt" | "heartbeat" => {}
            "estop" => self.model.estop(),
            "set_state" => {
                if let Err(e) = self.model.request_state(value("state") as u8, value("mode") as u8) {
                    warn!("Node {}: state request rejected: {:?}", node_id, e);
                }
            }
            "set_can_config" => {
                let can_id = value("id") as u8;
                if can_id > endpoints::MAX_NODE_ID {
                    warn!("Node {}: ignoring out of range node ID {}", node_id, can_id);
                    return;
                }

                // A zero baud rate keeps the present one
                let baud_rate = value("baud_rate") as u16;
                if baud_rate != 0 {
                    self.model.config.baud_rate = baud_rate;
                }
                self.model.config.can_id = can_id;
                self.node_id = self.model.config.can_id;
                info!("Node {} moved to node {}", node_id, self.node_id);
            }
            "set_pos_setpoint" => {
                // Feed forwards arrive in decatick/second and centiampere
                self.model.set_position(
                    value("position"),
                    value("velocity_ff") * 10.0,
                    value("current_ff") / 100.0,
                );
            }
            "set_vel_setpoint" => self.model.set_velocity(value("velocity"), value("current_ff")),
            "set_cur_setpoint" => self.model.set_current(value("current")),
            "set_limits" => {
                self.model.config.vel_limit = value("velocity");
                self.model.config.cur_limit = value("current");
            }
            "set_integrator_gains" => self.model.config.vel_integrator_gain = value("velocity"),
            "set_gains" => {
                self.model.config.pos_gain = value("position");
                self.model.config.vel_gain = value("velocity");
            }
            "set_motor_config" => {
                let motor = &mut self.model.config.motor;
                motor.is_gimbal = value("flags") as u8 & 0x1 != 0;
                motor.resistance = value("R");
                motor.inductance = value("L");
                motor.calibration_current = value("I_cal");
            }
            "reset" => {
                self.model.reset();
                self.node_id = self.model.config.can_id;
            }
            "save_config" => self.model.save(),
            "erase_config" => self.model.erase(),
            other => warn!("Node {}: unhandled write {}", node_id, other),
        }
    }
}

impl CanAdapter for SimulatedDevice {
    fn send(&mut self, frames: &mut VecDeque<Frame>) -> Result<()> {
        while let Some(frame) = frames.pop_front() {
            self.handle(&frame);
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<Vec<Frame>> {
        Ok(std::mem::take(&mut self.pending))
    }
}
