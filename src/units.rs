//! Conversion between physical quantities and the load's fixed-point wire encoding.
//!
//! Every scaled field on the wire is a 4 byte little-endian unsigned integer counting a
//! fixed sub-unit of the quantity:
//!
//! | Kind       | Wire unit | Scale  |
//! |------------|-----------|--------|
//! | Voltage    | 1 mV      | 1000   |
//! | Current    | 0.1 mA    | 10000  |
//! | Power      | 1 mW      | 1000   |
//! | Resistance | 1 mΩ      | 1000   |

use strum_macros::EnumIter;
use thiserror::Error;

/// Number of bytes used by every scaled field.
pub const SCALED_FIELD_LEN: usize = 4;

/// Relative rounding error of the scaling multiply that is still treated as exact.
const SCALING_ERROR_ULPS: f64 = 4.0;

/// The physical quantity a scaled field carries.
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum UnitKind {
    /// Volts, transmitted in millivolts.
    Voltage,
    /// Amps, transmitted in tenths of a milliamp.
    Current,
    /// Watts, transmitted in milliwatts.
    Power,
    /// Ohms, transmitted in milliohms.
    Resistance,
}

impl UnitKind {
    /// Number of wire units per natural unit.
    #[inline]
    pub const fn scale(&self) -> u32 {
        match self {
            UnitKind::Voltage => 1_000,
            UnitKind::Current => 10_000,
            UnitKind::Power => 1_000,
            UnitKind::Resistance => 1_000,
        }
    }

    /// Symbol of the natural unit, used when printing values.
    pub const fn symbol(&self) -> &'static str {
        match self {
            UnitKind::Voltage => "V",
            UnitKind::Current => "A",
            UnitKind::Power => "W",
            UnitKind::Resistance => "Ω",
        }
    }
}

/// A decoded quantity at natural scale (volts, amps, watts or ohms).
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct PhysicalValue {
    pub kind: UnitKind,
    pub value: f64,
}

impl PhysicalValue {
    pub const fn new(kind: UnitKind, value: f64) -> Self {
        Self { kind, value }
    }
}

impl core::fmt::Display for PhysicalValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.value, self.kind.symbol())
    }
}

/// The value can not be represented in the 32 bit fixed-point encoding.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("{value} is out of range for a {kind:?} field")]
pub struct ValueOutOfRange {
    pub kind: UnitKind,
    pub value: f64,
}

/// Encode a value at natural scale into its 4 wire bytes.
///
/// The scaled value is truncated toward zero. Negative, non-finite and values beyond
/// `u32::MAX` wire units are rejected.
pub fn encode(value: f64, kind: UnitKind) -> Result<[u8; SCALED_FIELD_LEN], ValueOutOfRange> {
    let scaled = value * kind.scale() as f64;
    // NaN fails both comparisons.
    if !(scaled >= 0.0 && scaled <= u32::MAX as f64) {
        return Err(ValueOutOfRange { kind, value });
    }
    // A whole number of wire units may land a few ulps below the integer, e.g.
    // 1.005 * 1000 = 1004.9999999999999. Lift it back before truncating.
    let units = scaled * (1.0 + SCALING_ERROR_ULPS * f64::EPSILON);
    Ok((units as u32).to_le_bytes())
}

/// Decode 4 wire bytes into a value at natural scale.
pub fn decode(bytes: [u8; SCALED_FIELD_LEN], kind: UnitKind) -> f64 {
    u32::from_le_bytes(bytes) as f64 / kind.scale() as f64
}

/// Decode the scaled field starting at `offset` within `frame`.
///
/// Panics if the field does not fit in `frame`, offsets are fixed per frame layout.
pub(crate) fn decode_at(frame: &[u8], offset: usize, kind: UnitKind) -> PhysicalValue {
    let mut bytes = [0u8; SCALED_FIELD_LEN];
    bytes.copy_from_slice(&frame[offset..offset + SCALED_FIELD_LEN]);
    PhysicalValue::new(kind, decode(bytes, kind))
}
