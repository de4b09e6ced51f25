//! This module defines the command set of the programmable DC load.
//!
//! Each supported operation is one [`LoadCommand`] variant. Its opcode, argument shape and
//! response shape are fixed by the variant, see [`LoadCommand::spec`].

use strum_macros::EnumIter;

use crate::units::UnitKind;

/// The four constant-mode regulation modes of the load.
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum OperatingMode {
    /// Constant current.
    Cc = 0x00,
    /// Constant voltage.
    Cv = 0x01,
    /// Constant power.
    Cw = 0x02,
    /// Constant resistance.
    Cr = 0x03,
}

impl From<OperatingMode> for u8 {
    fn from(value: OperatingMode) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for OperatingMode {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(OperatingMode::Cc),
            0x01 => Ok(OperatingMode::Cv),
            0x02 => Ok(OperatingMode::Cw),
            0x03 => Ok(OperatingMode::Cr),
            _ => Err(()),
        }
    }
}

/// How a command's argument is laid out after the opcode byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArgumentEncoding {
    /// No argument bytes.
    None,
    /// One byte, `0x01` for on and `0x00` for off.
    Switch,
    /// Four byte little-endian fixed-point value.
    Scaled(UnitKind),
    /// One byte [`OperatingMode`].
    OperatingMode,
}

impl ArgumentEncoding {
    /// Number of argument bytes this encoding occupies.
    pub const fn byte_len(&self) -> usize {
        match self {
            ArgumentEncoding::None => 0,
            ArgumentEncoding::Switch | ArgumentEncoding::OperatingMode => 1,
            ArgumentEncoding::Scaled(_) => crate::units::SCALED_FIELD_LEN,
        }
    }
}

/// What the device answers with.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ResponseKind {
    /// A status acknowledgment frame.
    StatusAck,
    /// A four byte fixed-point value.
    Scaled(UnitKind),
    /// One [`OperatingMode`] byte.
    OperatingMode,
    /// Measured voltage, current, power and state registers.
    PresentValues,
    /// Model, firmware version and serial number.
    ProductInfo,
}

/// Static description of one command.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CommandSpec {
    pub opcode: u8,
    pub argument: ArgumentEncoding,
    pub response: ResponseKind,
}

/// Every operation supported on the load, carrying its argument where it has one.
///
/// Setters carry values at natural scale (volts, amps, watts, ohms).
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LoadCommand {
    /// __W__ - Remote (`true`) or front panel (`false`) control.
    SetRemoteControl(bool),
    /// __W__ - Turn the load input on or off.
    SetLoadOn(bool),
    /// __W__ - Maximum input voltage.
    SetMaxVoltage(f64),
    /// __R__ - Maximum input voltage.
    GetMaxVoltage,
    /// __W__ - Maximum input current.
    SetMaxCurrent(f64),
    /// __R__ - Maximum input current.
    GetMaxCurrent,
    /// __W__ - Maximum input power.
    SetMaxPower(f64),
    /// __R__ - Maximum input power.
    GetMaxPower,
    /// __W__ - Regulation mode.
    SetMode(OperatingMode),
    /// __R__ - Regulation mode.
    GetMode,
    /// __W__ - Constant current setpoint.
    SetCcCurrent(f64),
    /// __R__ - Constant current setpoint.
    GetCcCurrent,
    /// __W__ - Constant voltage setpoint.
    SetCvVoltage(f64),
    /// __R__ - Constant voltage setpoint.
    GetCvVoltage,
    /// __W__ - Constant power setpoint.
    SetCwPower(f64),
    /// __R__ - Constant power setpoint.
    GetCwPower,
    /// __W__ - Constant resistance setpoint.
    SetCrResistance(f64),
    /// __R__ - Constant resistance setpoint.
    GetCrResistance,
    /// __W__ - Under-voltage lockout, the battery test minimum voltage.
    SetUvloVoltage(f64),
    /// __R__ - Under-voltage lockout, the battery test minimum voltage.
    GetUvloVoltage,
    /// __R__ - Measured voltage, current, power and state registers.
    GetPresentValues,
    /// __R__ - Model, firmware version and serial number.
    GetProductInfo,
}

impl LoadCommand {
    /// Opcode byte sent at position 2 of the request frame.
    pub const fn opcode(&self) -> u8 {
        use LoadCommand as LC;
        match self {
            LC::SetRemoteControl(_) => 0x20,
            LC::SetLoadOn(_) => 0x21,
            LC::SetMaxVoltage(_) => 0x22,
            LC::GetMaxVoltage => 0x23,
            LC::SetMaxCurrent(_) => 0x24,
            LC::GetMaxCurrent => 0x25,
            LC::SetMaxPower(_) => 0x26,
            LC::GetMaxPower => 0x27,
            LC::SetMode(_) => 0x28,
            LC::GetMode => 0x29,
            LC::SetCcCurrent(_) => 0x2A,
            LC::GetCcCurrent => 0x2B,
            LC::SetCvVoltage(_) => 0x2C,
            LC::GetCvVoltage => 0x2D,
            LC::SetCwPower(_) => 0x2E,
            LC::GetCwPower => 0x2F,
            LC::SetCrResistance(_) => 0x30,
            LC::GetCrResistance => 0x31,
            LC::SetUvloVoltage(_) => 0x4E,
            LC::GetUvloVoltage => 0x4F,
            LC::GetPresentValues => 0x5F,
            LC::GetProductInfo => 0x6A,
        }
    }

    /// Argument and response layout of this command.
    pub const fn spec(&self) -> CommandSpec {
        use ArgumentEncoding as AE;
        use LoadCommand as LC;
        use UnitKind as UK;

        let (argument, response) = match self {
            LC::SetRemoteControl(_) | LC::SetLoadOn(_) => (AE::Switch, ResponseKind::StatusAck),
            LC::SetMaxVoltage(_) | LC::SetCvVoltage(_) | LC::SetUvloVoltage(_) => {
                (AE::Scaled(UK::Voltage), ResponseKind::StatusAck)
            }
            LC::SetMaxCurrent(_) | LC::SetCcCurrent(_) => {
                (AE::Scaled(UK::Current), ResponseKind::StatusAck)
            }
            LC::SetMaxPower(_) | LC::SetCwPower(_) => {
                (AE::Scaled(UK::Power), ResponseKind::StatusAck)
            }
            LC::SetCrResistance(_) => (AE::Scaled(UK::Resistance), ResponseKind::StatusAck),
            LC::SetMode(_) => (AE::OperatingMode, ResponseKind::StatusAck),
            LC::GetMaxVoltage | LC::GetCvVoltage | LC::GetUvloVoltage => {
                (AE::None, ResponseKind::Scaled(UK::Voltage))
            }
            LC::GetMaxCurrent | LC::GetCcCurrent => (AE::None, ResponseKind::Scaled(UK::Current)),
            LC::GetMaxPower | LC::GetCwPower => (AE::None, ResponseKind::Scaled(UK::Power)),
            LC::GetCrResistance => (AE::None, ResponseKind::Scaled(UK::Resistance)),
            LC::GetMode => (AE::None, ResponseKind::OperatingMode),
            LC::GetPresentValues => (AE::None, ResponseKind::PresentValues),
            LC::GetProductInfo => (AE::None, ResponseKind::ProductInfo),
        };

        CommandSpec {
            opcode: self.opcode(),
            argument,
            response,
        }
    }
}
