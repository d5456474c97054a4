//! # The Tinymovr Crate
//! Client library for Tinymovr motor controllers on a CAN bus. The crate describes every device endpoint (its CAN id, field layout, physical units and defaults), encodes and decodes endpoint payloads, and talks to the device through an async CAN adapter.
//!
//! ## Endpoint Example
//!
//! Endpoints are looked up by name. The codec turns labeled values into the exact payload the firmware expects.
//!
//! ```rust
//! use tinymovr::codec::{self, Quantity, Unit};
//!
//! let endpoint = tinymovr::endpoints::resolve("set_cur_setpoint").unwrap();
//! let payload = codec::encode(endpoint, &[("current", Quantity::new(2.5, Unit::Ampere))]).unwrap();
//! assert_eq!(payload, 2.5f32.to_le_bytes());
//!
//! let record = codec::decode(endpoint, &payload).unwrap();
//! assert_eq!(record.value("current"), Some(2.5));
//! ```
//!
//! ## Client Example
//!
//! The client wraps an [`can::AsyncCanAdapter`] and a node id. Reads send a remote frame and wait for the device's answer, writes are fire and forget.
//!
//! ```rust
//! async fn client_example() {
//!     let adapter = tinymovr::can::get_adapter().unwrap();
//!     let tm = tinymovr::client::Tinymovr::from_node_id(&adapter, 1);
//!
//!     let info = tm.device_info().await.unwrap();
//!     println!("Tinymovr {} running firmware {}", info.device_id, info.firmware());
//!
//!     tm.write("set_vel_setpoint", &[("velocity", 20000.0.into())]).await.unwrap();
//!     let estimates = tm.read("encoder_estimates").await.unwrap();
//!     println!("{}", estimates);
//! }
//! ```
//!
//! ## Simulated device
//! [`sim::SimulatedDevice`] implements [`can::CanAdapter`] and behaves like a Tinymovr on the bus, which makes the whole stack testable without hardware.
//!
//! ## Suported adapters
//!  - SocketCAN (Linux only, `socketcan` feature)
//!  - Simulated device (all platforms)
//!

pub mod can;
pub mod client;
pub mod codec;
pub mod endpoints;
mod error;
pub mod sim;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use tokio_stream::{Stream, StreamExt, Timeout};

#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub mod socketcan;
