//! Tinymovr client. Performs endpoint calls against a single device on the bus.
//! ## Example
//! ```rust
//! use tinymovr::client::{ControlMode, DeviceConfig, Tinymovr};
//! use tinymovr::codec::{Quantity, Unit};
//!
//! async fn position_example() {
//!     let adapter = tinymovr::can::get_adapter().unwrap();
//!     let mut tm = Tinymovr::new(&adapter, DeviceConfig::new(1));
//!
//!     // Gate endpoints on the firmware the device actually runs
//!     tm.detect_firmware().await.unwrap();
//!
//!     tm.calibrate().await.unwrap();
//!     tm.position_control().await.unwrap();
//!     tm.write("set_pos_setpoint", &[("position", Quantity::new(8192.0, Unit::Tick))])
//!         .await
//!         .unwrap();
//!
//!     let state = tm.state().await.unwrap();
//!     assert_eq!(state.mode, ControlMode::Position);
//! }
//! ```

mod types;

use std::time::Duration;

use semver::Version;
use tracing::{debug, info};

use crate::can::{AsyncCanAdapter, Frame, Identifier};
use crate::codec::{self, Quantity, Record};
use crate::endpoints::{self, Direction, Endpoint};
use crate::Result;
use crate::StreamExt;
pub use types::*;

const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Configuration passed to the [`Tinymovr`] client.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Bus index for adapters supporting multiple CAN busses
    pub bus: u8,
    /// Node ID of the device
    pub node_id: u8,
    /// Max time to wait for the answer to a read
    pub timeout: Duration,
    /// Firmware version of the device, used to refuse endpoints the device does not implement. Unknown until set or detected.
    pub firmware: Option<Version>,
}

impl DeviceConfig {
    pub fn new(node_id: u8) -> Self {
        Self {
            bus: 0,
            node_id,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            firmware: None,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Client for one Tinymovr. Wraps an [`AsyncCanAdapter`] to read and write endpoints by name.
pub struct Tinymovr<'a> {
    adapter: &'a AsyncCanAdapter,
    config: DeviceConfig,
}

impl<'a> Tinymovr<'a> {
    /// Convenience method for creating a client with the default configuration for a node ID.
    pub fn from_node_id(adapter: &'a AsyncCanAdapter, node_id: u8) -> Self {
        Self::new(adapter, DeviceConfig::new(node_id))
    }

    pub fn new(adapter: &'a AsyncCanAdapter, config: DeviceConfig) -> Self {
        Self { adapter, config }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn node_id(&self) -> u8 {
        self.config.node_id
    }

    /// Resolve an endpoint and check it can be used in `direction` on this device. Nothing is sent when this fails.
    fn prepare(&self, name: &str, direction: Direction) -> Result<(&'static Endpoint, Identifier)> {
        let endpoint = endpoints::resolve(name)?;
        if endpoint.direction != direction {
            return Err(endpoints::Error::WrongDirection(endpoint.name).into());
        }

        endpoint.check_firmware(self.config.firmware.as_ref())?;
        let id = endpoint.arbitration_id(self.config.node_id)?;

        Ok((endpoint, id))
    }

    /// Read an endpoint. Sends a remote frame and waits for the device to answer on the same ID. Returns [`crate::Error::Timeout`] if the request can't be sent and answered within the configured timeout.
    pub async fn read(&self, name: &str) -> Result<Record> {
        let (endpoint, id) = self.prepare(name, Direction::Read)?;
        let bus = self.config.bus;

        // Subscribe before sending so the answer can't be missed
        let stream = self
            .adapter
            .recv_filter(move |frame| frame.bus == bus && frame.id == id && !frame.rtr && !frame.loopback);
        tokio::pin!(stream);

        let request = Frame::remote(bus, id)?;
        let frame = tokio::time::timeout(self.config.timeout, async {
            debug!("TX {} RTR {:?}", endpoint.name, id);
            self.adapter.send(&request).await?;
            stream.next().await.ok_or(crate::Error::Disconnected)
        })
        .await??;
        debug!("RX {} {}", endpoint.name, hex::encode(&frame.data));

        Ok(codec::decode(endpoint, &frame.data)?)
    }

    /// Read an endpoint and present only the fields of one of its serialization groups.
    pub async fn read_group(&self, name: &str, group: &str) -> Result<Record> {
        Ok(self.read(name).await?.group(group)?)
    }

    /// Write an endpoint. Omitted fields take the endpoint's defaults, values with a unit are converted to the field's unit. Resolves once the frame was handed to the adapter, or with [`crate::Error::Timeout`] if the adapter doesn't take it within the configured timeout.
    pub async fn write(&self, name: &str, values: &[(&str, Quantity)]) -> Result<()> {
        let (endpoint, id) = self.prepare(name, Direction::Write)?;
        let payload = codec::encode(endpoint, values)?;

        let frame = Frame::new(self.config.bus, id, &payload)?;

        debug!("TX {} {}", endpoint.name, hex::encode(&payload));
        tokio::time::timeout(self.config.timeout, self.adapter.send(&frame)).await?
    }

    /// Read the device info and remember the firmware version for endpoint gating.
    pub async fn detect_firmware(&mut self) -> Result<Version> {
        let firmware = self.device_info().await?.firmware();
        info!("Node {} runs firmware {}", self.config.node_id, firmware);

        self.config.firmware = Some(firmware.clone());
        Ok(firmware)
    }

    pub async fn device_info(&self) -> Result<DeviceInfo> {
        DeviceInfo::try_from(&self.read("device_info").await?)
    }

    pub async fn state(&self) -> Result<DeviceState> {
        DeviceState::try_from(&self.read("state").await?)
    }

    /// Request a state change. Without a mode the device keeps its default mode (current control).
    pub async fn set_state(&self, state: State, mode: Option<ControlMode>) -> Result<()> {
        let mut values = vec![("state", Quantity::bare(state as u8 as f64))];
        if let Some(mode) = mode {
            values.push(("mode", Quantity::bare(mode as u8 as f64)));
        }
        self.write("set_state", &values).await
    }

    pub async fn calibrate(&self) -> Result<()> {
        self.set_state(State::Calibrate, None).await
    }

    pub async fn idle(&self) -> Result<()> {
        self.set_state(State::Idle, None).await
    }

    pub async fn position_control(&self) -> Result<()> {
        self.set_state(State::ClosedLoopControl, Some(ControlMode::Position))
            .await
    }

    pub async fn velocity_control(&self) -> Result<()> {
        self.set_state(State::ClosedLoopControl, Some(ControlMode::Velocity))
            .await
    }

    pub async fn current_control(&self) -> Result<()> {
        self.set_state(State::ClosedLoopControl, Some(ControlMode::Current))
            .await
    }

    /// Reboot the device. Unsaved configuration is lost.
    pub async fn reset(&self) -> Result<()> {
        self.write("reset", &[]).await
    }

    pub async fn estop(&self) -> Result<()> {
        self.write("estop", &[]).await
    }
}
