//! Generic CAN types and traits

pub mod adapter;
pub mod async_can;

use std::collections::VecDeque;
use std::fmt;

pub use adapter::get_adapter;
pub use async_can::AsyncCanAdapter;

/// Maximum payload length of a classic CAN frame
pub const CAN_MAX_DLEN: usize = 8;

/// Identifier for a CAN frame
#[derive(Copy, Clone, PartialOrd, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Identifier {
    Standard(u32),
    Extended(u32),
}

impl Identifier {
    pub fn is_standard(&self) -> bool {
        match self {
            Identifier::Standard(_) => true,
            Identifier::Extended(_) => false,
        }
    }
    pub fn is_extended(&self) -> bool {
        !self.is_standard()
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Extended(id) => write!(f, "0x{:08x}", id),
            Identifier::Standard(id) => write!(f, "0x{:03x}", id),
        }
    }
}

impl From<u32> for Identifier {
    fn from(id: u32) -> Identifier {
        if id <= 0x7ff {
            Identifier::Standard(id)
        } else {
            Identifier::Extended(id)
        }
    }
}

impl From<Identifier> for u32 {
    fn from(val: Identifier) -> u32 {
        match val {
            Identifier::Standard(id) => id,
            Identifier::Extended(id) => id,
        }
    }
}

/// A classic CAN frame
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// The bus index for adapters supporting multiple CAN busses
    pub bus: u8,
    /// Arbitration ID
    pub id: Identifier,
    /// Frame Data
    pub data: Vec<u8>,
    /// Remote transmission request. Tinymovr answers a remote frame with a data frame on the same ID.
    pub rtr: bool,
    /// Wheter the frame was sent out by the adapter
    pub loopback: bool,
}
impl Unpin for Frame {}

impl Frame {
    pub fn new(bus: u8, id: Identifier, data: &[u8]) -> Result<Frame, crate::error::Error> {
        if data.len() > CAN_MAX_DLEN {
            return Err(crate::error::Error::MalformedFrame);
        }

        // Check if the ID makes sense
        match id {
            Identifier::Standard(id) if id > 0x7ff => return Err(crate::error::Error::MalformedFrame),
            Identifier::Extended(id) if id > 0x1fffffff => return Err(crate::error::Error::MalformedFrame),
            _ => {}
        };

        Ok(Frame {
            bus,
            id,
            data: data.to_vec(),
            rtr: false,
            loopback: false,
        })
    }

    /// Remote frame without payload, used to request the value of a read endpoint.
    pub fn remote(bus: u8, id: Identifier) -> Result<Frame, crate::error::Error> {
        let mut frame = Frame::new(bus, id, &[])?;
        frame.rtr = true;
        Ok(frame)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("bus", &self.bus)
            .field("id", &self.id)
            .field("data", &hex::encode(&self.data))
            .field("rtr", &self.rtr)
            .field("loopback", &self.loopback)
            .finish()
    }
}

/// Trait for a Blocking CAN Adapter
pub trait CanAdapter {
    /// Hand frames to the adapter. Frames that were accepted are removed from the front of the queue, frames that could not be sent yet stay queued.
    fn send(&mut self, frames: &mut VecDeque<Frame>) -> Result<(), crate::error::Error>;
    /// Return all frames received since the last call. Must not block.
    fn recv(&mut self) -> Result<Vec<Frame>, crate::error::Error>;
}
