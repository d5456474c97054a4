//! Physical units of endpoint fields.
//!
//! Every field of an endpoint is encoded in a canonical unit. Callers may pass values in any compatible unit, these are scaled to the canonical unit before packing. Units are compatible when they share a [`Dimension`]; all supported units differ from their dimension's base unit by a power of ten.

use std::fmt;
use std::str::FromStr;

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use super::error::Error;

/// Physical dimension of a unit
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dimension {
    /// Encoder position, base unit tick
    Position,
    /// Encoder velocity, base unit tick/second
    Velocity,
    /// Base unit ampere
    Current,
    /// Base unit volt
    Voltage,
    /// Base unit ohm
    Resistance,
    /// Base unit henry
    Inductance,
    /// Base unit 1/second, used by the position gain
    Frequency,
    /// Base unit (A*second)/tick, used by the velocity gains
    VelocityGain,
}

/// Canonical unit strings used by the endpoint table, plus a few compatible units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    #[strum(to_string = "tick", serialize = "ticks")]
    Tick,
    #[strum(to_string = "decatick")]
    Decatick,
    #[strum(to_string = "tick/second")]
    TickPerSecond,
    #[strum(to_string = "decatick/second")]
    DecatickPerSecond,
    #[strum(to_string = "ampere", serialize = "A")]
    Ampere,
    #[strum(to_string = "centiampere")]
    Centiampere,
    #[strum(to_string = "milliampere", serialize = "milliamp", serialize = "mA")]
    Milliampere,
    #[strum(to_string = "volt", serialize = "V")]
    Volt,
    #[strum(to_string = "millivolt", serialize = "mV")]
    Millivolt,
    #[strum(to_string = "ohm")]
    Ohm,
    #[strum(to_string = "milliohm")]
    Milliohm,
    #[strum(to_string = "henry")]
    Henry,
    #[strum(to_string = "microhenry")]
    Microhenry,
    #[strum(to_string = "1/second")]
    PerSecond,
    #[strum(to_string = "(A*second)/tick")]
    AmpereSecondPerTick,
}

impl Unit {
    /// Parse a unit string, e.g. `"tick/second"`.
    pub fn parse(unit: &str) -> Result<Unit, Error> {
        Unit::from_str(unit).map_err(|_| Error::UnknownUnit(unit.to_string()))
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Tick | Unit::Decatick => Dimension::Position,
            Unit::TickPerSecond | Unit::DecatickPerSecond => Dimension::Velocity,
            Unit::Ampere | Unit::Centiampere | Unit::Milliampere => Dimension::Current,
            Unit::Volt | Unit::Millivolt => Dimension::Voltage,
            Unit::Ohm | Unit::Milliohm => Dimension::Resistance,
            Unit::Henry | Unit::Microhenry => Dimension::Inductance,
            Unit::PerSecond => Dimension::Frequency,
            Unit::AmpereSecondPerTick => Dimension::VelocityGain,
        }
    }

    /// Power of ten relative to the base unit of the dimension
    fn exponent(&self) -> i32 {
        match self {
            Unit::Decatick | Unit::DecatickPerSecond => 1,
            Unit::Centiampere => -2,
            Unit::Milliampere | Unit::Millivolt | Unit::Milliohm => -3,
            Unit::Microhenry => -6,
            _ => 0,
        }
    }

    pub fn is_compatible(&self, other: Unit) -> bool {
        self.dimension() == other.dimension()
    }

    /// Scale `value` given in `self` to `to`.
    pub fn convert(&self, value: f64, to: Unit) -> Result<f64, Error> {
        if !self.is_compatible(to) {
            return Err(Error::IncompatibleUnits {
                from: self.to_string(),
                to: to.to_string(),
            });
        }

        // Powers of ten are exact in f64, dividing keeps e.g. 250 centiampere at exactly 2.5 ampere
        let diff = self.exponent() - to.exponent();
        Ok(if diff >= 0 {
            value * 10f64.powi(diff)
        } else {
            value / 10f64.powi(-diff)
        })
    }
}

/// A number with an optional unit. A bare number carries no unit and is packed as-is.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quantity {
    pub value: f64,
    pub unit: Option<Unit>,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self {
            value,
            unit: Some(unit),
        }
    }

    pub fn bare(value: f64) -> Self {
        Self { value, unit: None }
    }

    /// Convert to `unit`. A bare number is taken to already be in `unit`.
    pub fn to(&self, unit: Unit) -> Result<Quantity, Error> {
        let value = match self.unit {
            Some(from) => from.convert(self.value, unit)?,
            None => self.value,
        };
        Ok(Quantity::new(value, unit))
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Quantity::bare(value)
    }
}

impl From<i32> for Quantity {
    fn from(value: i32) -> Self {
        Quantity::bare(value as f64)
    }
}

impl From<(f64, Unit)> for Quantity {
    fn from((value, unit): (f64, Unit)) -> Self {
        Quantity::new(value, unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{} {}", self.value, unit),
            None => write!(f, "{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn parse_table_units() {
        assert_eq!(Unit::parse("tick/second"), Ok(Unit::TickPerSecond));
        assert_eq!(Unit::parse("(A*second)/tick"), Ok(Unit::AmpereSecondPerTick));
        assert_eq!(Unit::parse("milliamp"), Ok(Unit::Milliampere));
        assert_eq!(Unit::parse("1/second"), Ok(Unit::PerSecond));
        assert_eq!(Unit::parse("furlong"), Err(Error::UnknownUnit("furlong".into())));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for unit in Unit::iter() {
            assert_eq!(Unit::parse(&unit.to_string()), Ok(unit));
        }
        assert_eq!(Unit::Milliampere.to_string(), "milliampere");
    }

    #[test]
    fn convert_current() {
        assert_eq!(Unit::Ampere.convert(2.5, Unit::Centiampere), Ok(250.0));
        assert_eq!(Unit::Centiampere.convert(250.0, Unit::Ampere), Ok(2.5));
        assert_eq!(Unit::Milliampere.convert(1500.0, Unit::Centiampere), Ok(150.0));
    }

    #[test]
    fn convert_velocity() {
        assert_eq!(Unit::TickPerSecond.convert(1000.0, Unit::DecatickPerSecond), Ok(100.0));
    }

    #[test]
    fn incompatible() {
        assert_eq!(
            Unit::Volt.convert(1.0, Unit::Ampere),
            Err(Error::IncompatibleUnits {
                from: "volt".into(),
                to: "ampere".into()
            })
        );
    }

    #[test]
    fn bare_quantity_keeps_value() {
        let q = Quantity::from(42.0).to(Unit::Milliohm).unwrap();
        assert_eq!(q, Quantity::new(42.0, Unit::Milliohm));
        assert_eq!(q.to_string(), "42 milliohm");
    }
}
