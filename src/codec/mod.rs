//! Payload codec for Tinymovr endpoints.
//!
//! Fields are packed contiguously in declaration order, little-endian, without padding. A payload therefore is exactly as long as the sum of its field widths and never longer than a classic CAN frame.
//! ## Example
//! ```rust
//! use tinymovr::codec::{self, Quantity, Unit};
//!
//! let endpoint = tinymovr::endpoints::resolve("set_pos_setpoint").unwrap();
//!
//! // Omitted fields take their default, velocity_ff and current_ff are 0
//! let payload = codec::encode(endpoint, &[("position", 1000.into())]).unwrap();
//! assert_eq!(payload.len(), 8);
//! assert_eq!(&payload[4..], &[0, 0, 0, 0]);
//!
//! // Values with a unit are scaled to the field's unit, here centiampere
//! let payload = codec::encode(
//!     endpoint,
//!     &[("position", 1000.into()), ("current_ff", Quantity::new(1.5, Unit::Ampere))],
//! )
//! .unwrap();
//! assert_eq!(&payload[6..], &150i16.to_le_bytes());
//! ```

pub mod error;
pub mod units;

use std::fmt;
use std::str::FromStr;

use strum_macros::{Display, EnumIter, EnumString};

use crate::can::CAN_MAX_DLEN;
use crate::endpoints::{Endpoint, SerMap};

pub use error::Error;
pub use units::{Dimension, Quantity, Unit};

/// Primitive wire types. All types are little-endian.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float,
}

impl DataType {
    /// Look up a type by name, e.g. `"uint16"` or `"float"`.
    pub fn parse(name: &str) -> Result<DataType, Error> {
        DataType::from_str(name).map_err(|_| Error::UnsupportedType(name.to_string()))
    }

    /// Width in bytes
    pub const fn size(&self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float => 4,
        }
    }

    /// Append the wire representation of `value` to `buf`. Integers are truncated toward zero and then wrap to the type's width.
    pub fn pack(&self, value: f64, buf: &mut Vec<u8>) {
        match self {
            DataType::UInt8 | DataType::Int8 => buf.push(wrap(value, 8) as u8),
            DataType::UInt16 | DataType::Int16 => buf.extend((wrap(value, 16) as u16).to_le_bytes()),
            DataType::UInt32 | DataType::Int32 => buf.extend((wrap(value, 32) as u32).to_le_bytes()),
            DataType::Float => buf.extend((value as f32).to_le_bytes()),
        }
    }

    /// Read a value from the start of `bytes`, which must hold at least [`DataType::size`] bytes.
    pub fn unpack(&self, bytes: &[u8]) -> Result<Value, Error> {
        Ok(match self {
            DataType::UInt8 => Value::U8(take::<1>(bytes)?[0]),
            DataType::Int8 => Value::I8(take::<1>(bytes)?[0] as i8),
            DataType::UInt16 => Value::U16(u16::from_le_bytes(take(bytes)?)),
            DataType::Int16 => Value::I16(i16::from_le_bytes(take(bytes)?)),
            DataType::UInt32 => Value::U32(u32::from_le_bytes(take(bytes)?)),
            DataType::Int32 => Value::I32(i32::from_le_bytes(take(bytes)?)),
            DataType::Float => Value::F32(f32::from_le_bytes(take(bytes)?)),
        })
    }
}

/// Two's complement bit pattern of the truncated `value`, modulo `2^bits`. Exact for any finite f64, NaN and infinities pack as 0.
fn wrap(value: f64, bits: i32) -> u64 {
    value.trunc().rem_euclid(2f64.powi(bits)) as u64
}

fn take<const N: usize>(bytes: &[u8]) -> Result<[u8; N], Error> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(Error::PayloadTooShort {
            expected: N,
            actual: bytes.len(),
        })
}

/// A decoded field value, typed as on the wire.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::U8(v) => v as f64,
            Value::I8(v) => v as f64,
            Value::U16(v) => v as f64,
            Value::I16(v) => v as f64,
            Value::U32(v) => v as f64,
            Value::I32(v) => v as f64,
            Value::F32(v) => v as f64,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::U8(_) => DataType::UInt8,
            Value::I8(_) => DataType::Int8,
            Value::U16(_) => DataType::UInt16,
            Value::I16(_) => DataType::Int16,
            Value::U32(_) => DataType::UInt32,
            Value::I32(_) => DataType::Int32,
            Value::F32(_) => DataType::Float,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
        }
    }
}

/// One decoded field with its label and canonical unit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Field {
    pub label: &'static str,
    pub value: Value,
    pub unit: Option<Unit>,
}

impl Field {
    pub fn quantity(&self) -> Quantity {
        Quantity {
            value: self.value.as_f64(),
            unit: self.unit,
        }
    }
}

/// Decoded fields of a single endpoint response, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    endpoint: &'static str,
    fields: Vec<Field>,
    ser_map: SerMap,
}

impl Record {
    /// Name of the endpoint this record was decoded from
    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    pub fn get(&self, label: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.label == label)
    }

    /// Numeric value of a field in its canonical unit
    pub fn value(&self, label: &str) -> Option<f64> {
        self.get(label).map(|field| field.value.as_f64())
    }

    pub fn quantity(&self, label: &str) -> Option<Quantity> {
        self.get(label).map(Field::quantity)
    }

    /// Canonical unit string of a field, `None` for unknown or dimensionless fields
    pub fn unit(&self, label: &str) -> Option<&'static str> {
        self.get(label).and_then(|field| field.unit).map(Into::into)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.label)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Present only the fields of a serialization group, in the group's order.
    pub fn group(&self, name: &str) -> Result<Record, Error> {
        let (_, labels) = self
            .ser_map
            .iter()
            .find(|(group, _)| *group == name)
            .ok_or_else(|| Error::UnknownGroup(name.to_string()))?;

        let fields = labels
            .iter()
            .map(|label| self.get(label).copied().ok_or(Error::UnknownField(label.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Record {
            endpoint: self.endpoint,
            fields,
            ser_map: &[],
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.endpoint)?;
        for (idx, field) in self.fields.iter().enumerate() {
            let sep = if idx == 0 { " " } else { ", " };
            write!(f, "{}{}: {}", sep, field.label, field.value)?;
            if let Some(unit) = field.unit {
                write!(f, " {}", unit)?;
            }
        }
        write!(f, " }}")
    }
}

/// Encode field values into an endpoint payload.
///
/// Every label of the endpoint is taken from `values`, or from the endpoint's defaults when omitted. Values carrying a unit are converted to the field's canonical unit, bare numbers are packed as-is.
pub fn encode(endpoint: &Endpoint, values: &[(&str, Quantity)]) -> Result<Vec<u8>, Error> {
    if let Some((label, _)) = values.iter().find(|(label, _)| !endpoint.labels.iter().any(|l| l == label)) {
        return Err(Error::UnknownField(label.to_string()));
    }

    let size = endpoint.payload_size();
    if size > CAN_MAX_DLEN {
        return Err(Error::PayloadTooLarge(size));
    }

    let mut buf = Vec::with_capacity(size);
    for (idx, (label, data_type)) in endpoint.labels.iter().zip(endpoint.types).enumerate() {
        // Later entries win when a label is given twice
        let quantity = match values.iter().rev().find(|(l, _)| l == label) {
            Some((_, quantity)) => *quantity,
            None => endpoint
                .default(label)
                .map(Quantity::bare)
                .ok_or(Error::MissingRequiredField(*label))?,
        };

        let value = match (endpoint.unit(idx), quantity.unit) {
            (Some(unit), Some(_)) => quantity.to(unit)?.value,
            (None, Some(unit)) => {
                return Err(Error::IncompatibleUnits {
                    from: unit.to_string(),
                    to: "dimensionless".to_string(),
                })
            }
            (_, None) => quantity.value,
        };

        data_type.pack(value, &mut buf);
    }

    Ok(buf)
}

/// Decode an endpoint payload. Bytes past the endpoint's fields are ignored.
pub fn decode(endpoint: &Endpoint, payload: &[u8]) -> Result<Record, Error> {
    let expected = endpoint.payload_size();
    if payload.len() < expected {
        return Err(Error::PayloadTooShort {
            expected,
            actual: payload.len(),
        });
    }

    let mut cursor = 0;
    let mut fields = Vec::with_capacity(endpoint.types.len());
    for (idx, (label, data_type)) in endpoint.labels.iter().zip(endpoint.types).enumerate() {
        let value = data_type.unpack(&payload[cursor..])?;
        cursor += data_type.size();

        fields.push(Field {
            label: *label,
            value,
            unit: endpoint.unit(idx),
        });
    }

    Ok(Record {
        endpoint: endpoint.name,
        fields,
        ser_map: endpoint.ser_map,
    })
}

/// Decode a payload and present only the fields of serialization group `group`.
pub fn decode_group(endpoint: &Endpoint, group: &str, payload: &[u8]) -> Result<Record, Error> {
    decode(endpoint, payload)?.group(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::{resolve, Direction};
    use strum::IntoEnumIterator;

    static WIDE: Endpoint = Endpoint {
        name: "wide",
        description: "Too wide for a classic frame",
        ep_id: 0x030,
        direction: Direction::Write,
        types: &[DataType::UInt32, DataType::UInt32, DataType::UInt8],
        labels: &["a", "b", "c"],
        units: None,
        defaults: &[],
        ser_map: &[],
        min_firmware: None,
    };

    #[test]
    fn type_sizes() {
        let sizes: Vec<usize> = DataType::iter().map(|t| t.size()).collect();
        assert_eq!(sizes, vec![1, 1, 2, 2, 4, 4, 4]);
    }

    #[test]
    fn parse_type_names() {
        assert_eq!(DataType::parse("uint16"), Ok(DataType::UInt16));
        assert_eq!(DataType::parse("float"), Ok(DataType::Float));
        assert_eq!(DataType::parse("double"), Err(Error::UnsupportedType("double".into())));
    }

    #[test]
    fn integers_truncate_and_wrap() {
        let mut buf = vec![];
        DataType::UInt8.pack(300.0, &mut buf);
        DataType::Int16.pack(-1.9, &mut buf);
        DataType::UInt16.pack(-1.0, &mut buf);
        assert_eq!(buf, vec![44, 0xff, 0xff, 0xff, 0xff]);

        // Values far outside the width wrap instead of saturating
        let mut buf = vec![];
        DataType::UInt32.pack(1e20, &mut buf);
        DataType::Int16.pack(-70000.0, &mut buf);
        DataType::UInt32.pack(2f64.powi(40) + 5.0, &mut buf);
        DataType::Int8.pack(f64::NAN, &mut buf);
        let mut expected = 0x6310_0000u32.to_le_bytes().to_vec();
        expected.extend(61072u16.to_le_bytes());
        expected.extend(5u32.to_le_bytes());
        expected.push(0);
        assert_eq!(buf, expected);

        assert_eq!(DataType::Int16.unpack(&[0xff, 0xff]), Ok(Value::I16(-1)));
        assert_eq!(DataType::UInt16.unpack(&[0xff, 0xff]), Ok(Value::U16(0xffff)));
    }

    #[test]
    fn unpack_short_slice() {
        assert_eq!(
            DataType::UInt32.unpack(&[1, 2]),
            Err(Error::PayloadTooShort { expected: 4, actual: 2 })
        );
    }

    #[test]
    fn current_setpoint_payload() {
        let endpoint = resolve("set_cur_setpoint").unwrap();
        let payload = encode(endpoint, &[("current", Quantity::new(2.5, Unit::Ampere))]).unwrap();
        assert_eq!(payload, vec![0x00, 0x00, 0x20, 0x40]);

        let record = decode(endpoint, &payload).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.value("current"), Some(2.5));
        assert_eq!(record.unit("current"), Some("ampere"));
        assert_eq!(record.get("current").unwrap().value, Value::F32(2.5));
    }

    #[test]
    fn defaults_fill_omitted_fields() {
        let endpoint = resolve("set_pos_setpoint").unwrap();
        let implicit = encode(endpoint, &[("position", 1000.into())]).unwrap();
        let explicit = encode(
            endpoint,
            &[
                ("position", 1000.into()),
                ("velocity_ff", 0.into()),
                ("current_ff", 0.into()),
            ],
        )
        .unwrap();

        assert_eq!(implicit, explicit);
        assert_eq!(implicit.len(), 8);
        assert_eq!(&implicit[..4], &1000f32.to_le_bytes());
        assert_eq!(&implicit[4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn missing_field_without_default() {
        let endpoint = resolve("set_limits").unwrap();
        assert_eq!(
            encode(endpoint, &[("velocity", 100.0.into())]),
            Err(Error::MissingRequiredField("current"))
        );
    }

    #[test]
    fn unknown_field() {
        let endpoint = resolve("set_cur_setpoint").unwrap();
        assert_eq!(
            encode(endpoint, &[("current", 1.0.into()), ("torque", 1.0.into())]),
            Err(Error::UnknownField("torque".into()))
        );
    }

    #[test]
    fn units_are_converted_to_field_unit() {
        let endpoint = resolve("set_pos_setpoint").unwrap();
        let payload = encode(
            endpoint,
            &[
                ("position", Quantity::new(10.0, Unit::Decatick)),
                ("velocity_ff", Quantity::new(5000.0, Unit::TickPerSecond)),
                ("current_ff", Quantity::new(250.0, Unit::Milliampere)),
            ],
        )
        .unwrap();

        let record = decode(endpoint, &payload).unwrap();
        assert_eq!(record.value("position"), Some(100.0));
        assert_eq!(record.value("velocity_ff"), Some(500.0));
        assert_eq!(record.value("current_ff"), Some(25.0));
        assert_eq!(record.unit("current_ff"), Some("centiampere"));
    }

    #[test]
    fn incompatible_unit_is_rejected() {
        let endpoint = resolve("set_cur_setpoint").unwrap();
        assert!(matches!(
            encode(endpoint, &[("current", Quantity::new(1.0, Unit::Volt))]),
            Err(Error::IncompatibleUnits { .. })
        ));

        // flags carries no unit
        let endpoint = resolve("set_motor_config").unwrap();
        assert!(matches!(
            encode(
                endpoint,
                &[
                    ("flags", Quantity::new(1.0, Unit::Ampere)),
                    ("R", 100.into()),
                    ("L", 10.into()),
                    ("I_cal", 5000.into()),
                ]
            ),
            Err(Error::IncompatibleUnits { .. })
        ));
    }

    #[test]
    fn payload_too_large() {
        assert_eq!(
            encode(&WIDE, &[("a", 1.into()), ("b", 2.into()), ("c", 3.into())]),
            Err(Error::PayloadTooLarge(9))
        );
    }

    #[test]
    fn payload_too_short() {
        let endpoint = resolve("device_info").unwrap();
        assert_eq!(
            decode(endpoint, &[1, 2, 3, 4, 5, 6, 7]),
            Err(Error::PayloadTooShort { expected: 8, actual: 7 })
        );
    }

    #[test]
    fn commands_without_fields() {
        let endpoint = resolve("reset").unwrap();
        assert_eq!(encode(endpoint, &[]), Ok(vec![]));
        assert!(decode(endpoint, &[]).unwrap().is_empty());
    }

    #[test]
    fn device_info_layout() {
        let endpoint = resolve("device_info").unwrap();
        let payload = [0x78, 0x56, 0x34, 0x12, 0, 8, 4, 35];
        let record = decode(endpoint, &payload).unwrap();

        assert_eq!(record.get("device_id").unwrap().value, Value::U32(0x12345678));
        assert_eq!(record.value("fw_minor"), Some(8.0));
        assert_eq!(record.value("temp"), Some(35.0));
        assert_eq!(record.unit("temp"), None);
    }

    #[test]
    fn serialization_group() {
        let endpoint = resolve("motor_config").unwrap();
        let mut payload = vec![1];
        payload.extend(200u16.to_le_bytes());
        payload.push(7);
        payload.extend(50u16.to_le_bytes());
        payload.extend(5000u16.to_le_bytes());

        let motor = decode_group(endpoint, "motor", &payload).unwrap();
        let labels: Vec<&str> = motor.labels().collect();
        assert_eq!(labels, vec!["R", "L", "pole_pairs", "I_cal"]);
        assert_eq!(motor.value("L"), Some(50.0));
        assert_eq!(motor.unit("I_cal"), Some("milliampere"));
        assert!(motor.get("flags").is_none());

        assert_eq!(
            decode_group(endpoint, "gains", &payload),
            Err(Error::UnknownGroup("gains".into()))
        );
    }

    /// Values at the edges of each type, all exactly representable in it
    fn edge_values(data_type: DataType) -> &'static [f64] {
        match data_type {
            DataType::UInt8 => &[0.0, 1.0, 255.0],
            DataType::Int8 => &[-128.0, -1.0, 127.0],
            DataType::UInt16 => &[0.0, 4660.0, 65535.0],
            DataType::Int16 => &[-32768.0, -750.0, 32767.0],
            DataType::UInt32 => &[0.0, 3735928559.0, 4294967295.0],
            DataType::Int32 => &[-2147483648.0, -1.0, 2147483647.0],
            DataType::Float => &[-2.5, 0.15625, 1.0e6],
        }
    }

    #[test]
    fn round_trip_every_endpoint() {
        for (name, endpoint) in crate::endpoints::all_endpoints() {
            for pick in 0..3 {
                let values: Vec<(&str, Quantity)> = endpoint
                    .labels
                    .iter()
                    .zip(endpoint.types)
                    .enumerate()
                    .map(|(idx, (label, data_type))| {
                        let edges = edge_values(*data_type);
                        (*label, Quantity::bare(edges[(pick + idx) % edges.len()]))
                    })
                    .collect();

                let payload = encode(endpoint, &values).unwrap();
                assert_eq!(payload.len(), endpoint.payload_size(), "{}", name);

                let record = decode(endpoint, &payload).unwrap();
                for (label, quantity) in values {
                    assert_eq!(record.value(label), Some(quantity.value), "{}.{}", name, label);
                }
            }
        }
    }

    #[test]
    fn negative_feed_forwards() {
        let endpoint = resolve("set_pos_setpoint").unwrap();
        let payload = encode(
            endpoint,
            &[
                ("position", (-8192.5).into()),
                ("velocity_ff", Quantity::new(-1000.0, Unit::TickPerSecond)),
                ("current_ff", Quantity::new(-1.5, Unit::Ampere)),
            ],
        )
        .unwrap();
        assert_eq!(&payload[4..6], &(-100i16).to_le_bytes());
        assert_eq!(&payload[6..], &(-150i16).to_le_bytes());

        let record = decode(endpoint, &payload).unwrap();
        assert_eq!(record.value("position"), Some(-8192.5));
        assert_eq!(record.value("velocity_ff"), Some(-100.0));
        assert_eq!(record.value("current_ff"), Some(-150.0));
    }

    #[test]
    fn record_display() {
        let endpoint = resolve("encoder_estimates").unwrap();
        let payload = encode(endpoint, &[("position", 10.0.into()), ("velocity", (-2.5).into())]).unwrap();
        let record = decode(endpoint, &payload).unwrap();
        assert_eq!(
            record.to_string(),
            "encoder_estimates { position: 10 tick, velocity: -2.5 tick/second }"
        );
    }
}
