//! Static description of every Tinymovr endpoint.
//!
//! An endpoint is a named register or command of the device. Its descriptor fixes the CAN endpoint ID, the direction, and the layout of the payload. The table is validated once on first use and is read-only afterwards.
//! ## Example
//! ```rust
//! let endpoint = tinymovr::endpoints::resolve("set_vel_setpoint").unwrap();
//! let id: u32 = endpoint.arbitration_id(1).unwrap().into();
//! assert_eq!(id, 0x00d + (1 << tinymovr::endpoints::ENDPOINT_ID_BITS));
//!
//! for (name, endpoint) in tinymovr::endpoints::all_endpoints() {
//!     println!("{:<20} 0x{:03x} {}", name, endpoint.ep_id, endpoint.description);
//! }
//! ```

mod constants;
mod error;

use std::collections::HashMap;
use std::sync::OnceLock;

use semver::Version;
use strum_macros::Display;

use crate::can::{Identifier, CAN_MAX_DLEN};
use crate::codec::{DataType, Unit};
pub use constants::*;
pub use error::Error;

/// Serialization groups: alternate names presenting an ordered subset of an endpoint's fields.
pub type SerMap = &'static [(&'static str, &'static [&'static str])];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Requested with a remote frame, the device answers with the payload
    Read,
    /// Sent with the payload, the device does not answer
    Write,
}

/// Descriptor of a single endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub name: &'static str,
    pub description: &'static str,
    pub ep_id: u16,
    pub direction: Direction,
    /// Field types in wire order
    pub types: &'static [DataType],
    /// Field labels, parallel to `types`
    pub labels: &'static [&'static str],
    /// Canonical field units, parallel to `types` when present
    pub units: Option<&'static [Option<Unit>]>,
    /// Values used when a write omits a field
    pub defaults: &'static [(&'static str, f64)],
    pub ser_map: SerMap,
    /// Oldest firmware implementing this endpoint
    pub min_firmware: Option<Version>,
}

impl Endpoint {
    /// Payload length in bytes
    pub fn payload_size(&self) -> usize {
        self.types.iter().map(DataType::size).sum()
    }

    /// Canonical unit of the field at `idx`
    pub fn unit(&self, idx: usize) -> Option<Unit> {
        self.units.and_then(|units| units.get(idx).copied().flatten())
    }

    pub fn default(&self, label: &str) -> Option<f64> {
        self.defaults
            .iter()
            .find(|(default, _)| *default == label)
            .map(|(_, value)| *value)
    }

    /// Labels of serialization group `name`
    pub fn group(&self, name: &str) -> Option<&'static [&'static str]> {
        self.ser_map
            .iter()
            .find(|(group, _)| *group == name)
            .map(|(_, labels)| *labels)
    }

    pub fn is_read(&self) -> bool {
        self.direction == Direction::Read
    }

    pub fn is_write(&self) -> bool {
        self.direction == Direction::Write
    }

    /// Arbitration ID of this endpoint on node `node_id`: the endpoint ID plus the node ID shifted above [`ENDPOINT_ID_BITS`].
    pub fn arbitration_id(&self, node_id: u8) -> Result<Identifier, Error> {
        compose_id(self.ep_id, node_id)
    }

    /// Refuse the endpoint when the device firmware is known and older than the endpoint. Without a known firmware version every endpoint is allowed.
    pub fn check_firmware(&self, firmware: Option<&Version>) -> Result<(), Error> {
        match (&self.min_firmware, firmware) {
            (Some(required), Some(actual)) if actual < required => Err(Error::UnsupportedFirmwareVersion {
                endpoint: self.name,
                required: required.clone(),
                actual: actual.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Check the descriptor's internal consistency.
    pub fn validate(&self) -> Result<(), Error> {
        let malformed = |reason: String| Error::MalformedEndpoint {
            endpoint: self.name,
            reason,
        };

        if self.labels.len() != self.types.len() {
            return Err(malformed(format!(
                "{} labels for {} fields",
                self.labels.len(),
                self.types.len()
            )));
        }

        if let Some(units) = self.units {
            if units.len() != self.types.len() {
                return Err(malformed(format!("{} units for {} fields", units.len(), self.types.len())));
            }
        }

        for (idx, label) in self.labels.iter().enumerate() {
            if self.labels[..idx].contains(label) {
                return Err(malformed(format!("label {} is repeated", label)));
            }
        }

        for (label, _) in self.defaults {
            if !self.labels.contains(label) {
                return Err(malformed(format!("default for unknown field {}", label)));
            }
        }

        for (group, labels) in self.ser_map {
            if let Some(label) = labels.iter().find(|label| !self.labels.contains(*label)) {
                return Err(malformed(format!("group {} names unknown field {}", group, label)));
            }
        }

        if self.payload_size() > CAN_MAX_DLEN {
            return Err(malformed(format!("payload of {} bytes", self.payload_size())));
        }

        if self.ep_id as u32 > MAX_STANDARD_ID {
            return Err(malformed(format!("endpoint ID 0x{:x}", self.ep_id)));
        }

        Ok(())
    }
}

/// Combine an endpoint ID with a node ID into the arbitration ID.
pub fn compose_id(ep_id: u16, node_id: u8) -> Result<Identifier, Error> {
    let out_of_range = Error::NodeIdOutOfRange { node_id, ep_id };
    if node_id > MAX_NODE_ID {
        return Err(out_of_range);
    }

    let id = ep_id as u32 + ((node_id as u32) << ENDPOINT_ID_BITS);
    if id > MAX_STANDARD_ID {
        return Err(out_of_range);
    }

    Ok(Identifier::Standard(id))
}

/// Split an arbitration ID into node ID and endpoint ID. Only meaningful for endpoint IDs below `1 << ENDPOINT_ID_BITS`.
pub fn split_id(id: Identifier) -> (u8, u16) {
    let id: u32 = id.into();
    let ep_mask = (1 << ENDPOINT_ID_BITS) - 1;
    ((id >> ENDPOINT_ID_BITS) as u8, (id & ep_mask) as u16)
}

/// Validated index over a static list of endpoints.
#[derive(Debug)]
pub struct EndpointTable {
    entries: &'static [Endpoint],
    by_name: HashMap<&'static str, usize>,
}

impl EndpointTable {
    /// Index `entries`, checking every descriptor and the uniqueness of names.
    pub fn new(entries: &'static [Endpoint]) -> Result<Self, Error> {
        let mut by_name = HashMap::with_capacity(entries.len());

        for (idx, endpoint) in entries.iter().enumerate() {
            endpoint.validate()?;
            if by_name.insert(endpoint.name, idx).is_some() {
                return Err(Error::DuplicateEndpoint(endpoint.name));
            }
        }

        Ok(Self { entries, by_name })
    }

    pub fn resolve(&self, name: &str) -> Result<&'static Endpoint, Error> {
        let entries = self.entries;
        self.by_name
            .get(name)
            .map(|&idx| &entries[idx])
            .ok_or_else(|| Error::UnknownEndpoint(name.to_string()))
    }

    /// Endpoint with endpoint ID `ep_id`
    pub fn by_ep_id(&self, ep_id: u16) -> Option<&'static Endpoint> {
        self.entries.iter().find(|endpoint| endpoint.ep_id == ep_id)
    }

    /// All endpoints in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static Endpoint)> {
        self.entries.iter().map(|endpoint| (endpoint.name, endpoint))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static TABLE: OnceLock<EndpointTable> = OnceLock::new();

/// The built-in Tinymovr endpoint table. Validated on first access, an invalid built-in table is a programming error and panics.
pub fn table() -> &'static EndpointTable {
    TABLE.get_or_init(|| match EndpointTable::new(ENDPOINTS) {
        Ok(table) => table,
        Err(e) => panic!("Invalid built-in endpoint table: {}", e),
    })
}

/// Look up an endpoint of the built-in table by name.
pub fn resolve(name: &str) -> Result<&'static Endpoint, Error> {
    table().resolve(name)
}

/// All endpoints of the built-in table, in declaration order.
pub fn all_endpoints() -> impl Iterator<Item = (&'static str, &'static Endpoint)> {
    table().iter()
}
