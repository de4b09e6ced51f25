//! Framing of the DC load's fixed-length binary protocol.
//!
//! Every request and response is exactly [`FRAME_LEN`] bytes:
//!
//! ```text
//! [0xAA][address][opcode][argument / payload ...][zero padding ...][checksum]
//! ```
//!
//! The checksum is the sum of the first 25 bytes modulo 256. A frame failing that check is
//! never interpreted. Write-type commands are answered with a status frame, which carries
//! [`STATUS_ACK_OPCODE`] in place of the opcode and a [`StatusCode`] in the first payload
//! byte.

use modular_bitfield::prelude::*;
use strum_macros::EnumIter;

use crate::{
    command::{ArgumentEncoding, CommandSpec, LoadCommand, OperatingMode, ResponseKind},
    error::{Error, Result},
    units::{self, PhysicalValue, SCALED_FIELD_LEN, UnitKind, ValueOutOfRange},
};

/// Length of every frame on the wire.
pub const FRAME_LEN: usize = 26;
/// First byte of every frame.
pub const START_BYTE: u8 = 0xAA;
/// Opcode position value marking a status acknowledgment.
pub const STATUS_ACK_OPCODE: u8 = 0x12;

/// Start byte, address and opcode.
const HEADER_LEN: usize = 3;
const ADDRESS_POS: usize = 1;
const OPCODE_POS: usize = 2;
const PAYLOAD_POS: usize = HEADER_LEN;
const CHECKSUM_POS: usize = FRAME_LEN - 1;

// Present values layout.
const VOLTAGE_POS: usize = PAYLOAD_POS;
const CURRENT_POS: usize = VOLTAGE_POS + SCALED_FIELD_LEN;
const POWER_POS: usize = CURRENT_POS + SCALED_FIELD_LEN;
const OPERATION_STATE_POS: usize = POWER_POS + SCALED_FIELD_LEN;
const DEMAND_STATE_POS: usize = OPERATION_STATE_POS + 1;

// Product information layout.
const MODEL_POS: usize = PAYLOAD_POS;
const MODEL_LEN: usize = 5;
const FIRMWARE_POS: usize = MODEL_POS + MODEL_LEN;
const SERIAL_POS: usize = FIRMWARE_POS + 2;
const SERIAL_LEN: usize = 10;

// The largest argument must leave room for the checksum.
const _: () = assert!(HEADER_LEN + SCALED_FIELD_LEN < CHECKSUM_POS);
const _: () = assert!(DEMAND_STATE_POS + 2 <= CHECKSUM_POS);
const _: () = assert!(SERIAL_POS + SERIAL_LEN <= CHECKSUM_POS);

/// One request or response frame.
pub type Frame = [u8; FRAME_LEN];

/// Result code carried by a status acknowledgment frame.
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum StatusCode {
    /// Command executed.
    Success,
    /// The device computed a different checksum for our request.
    BadChecksum,
    /// An argument was out of range for the device.
    BadParameter,
    /// The opcode is not known to the device.
    UnknownCommand,
    /// The command is not valid in the device's current state.
    BadCommand,
    /// Synthesized locally, the frame did not carry a recognisable status.
    Malformed,
}

impl StatusCode {
    /// Wire value of this status. [`StatusCode::Malformed`] never appears on the wire.
    pub const fn code(&self) -> Option<u8> {
        match self {
            StatusCode::Success => Some(0x80),
            StatusCode::BadChecksum => Some(0x90),
            StatusCode::BadParameter => Some(0xA0),
            StatusCode::UnknownCommand => Some(0xB0),
            StatusCode::BadCommand => Some(0xC0),
            StatusCode::Malformed => None,
        }
    }
}

impl From<u8> for StatusCode {
    fn from(value: u8) -> Self {
        match value {
            0x80 => StatusCode::Success,
            0x90 => StatusCode::BadChecksum,
            0xA0 => StatusCode::BadParameter,
            0xB0 => StatusCode::UnknownCommand,
            0xC0 => StatusCode::BadCommand,
            _ => StatusCode::Malformed,
        }
    }
}

/// Operation state register, byte 15 of the present values frame.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct OperationState {
    pub calculating_demand: bool,
    pub waiting_for_trigger: bool,
    pub remote_control: bool,
    pub output_on: bool,
    pub local_key_enabled: bool,
    pub remote_sensing: bool,
    pub load_on_timer: bool,
    #[skip]
    __: B1,
}

/// Demand state register, little-endian bytes 16 and 17 of the present values frame.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct DemandState {
    pub reversed_voltage: bool,
    pub over_voltage: bool,
    pub over_current: bool,
    pub over_power: bool,
    pub over_temperature: bool,
    pub remote_terminal_disconnected: bool,
    pub constant_current: bool,
    pub constant_voltage: bool,
    pub constant_power: bool,
    pub constant_resistance: bool,
    #[skip]
    __: B6,
}

/// Measured input values and state registers.
#[derive(Debug, Clone, Copy)]
pub struct PresentValues {
    /// Volts.
    pub voltage: f64,
    /// Amps.
    pub current: f64,
    /// Watts.
    pub power: f64,
    pub operation_state: OperationState,
    pub demand_state: DemandState,
}

/// Firmware version as reported by the product information frame.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl FirmwareVersion {
    /// Decimal form, minor byte in hundredths. E.g. major `1`, minor `5` => `1.05`.
    pub fn as_f32(&self) -> f32 {
        self.minor as f32 / 100.0 + self.major as f32
    }
}

/// Identification of the load.
#[derive(Debug, PartialEq, Clone)]
pub struct ProductInfo {
    pub model: heapless::String<MODEL_LEN>,
    pub firmware: FirmwareVersion,
    pub serial_number: heapless::String<SERIAL_LEN>,
}

/// A validated, decoded response.
#[derive(Debug, Clone)]
pub enum LoadResponse {
    /// The command was acknowledged with [`StatusCode::Success`].
    Ack,
    Value(PhysicalValue),
    Mode(OperatingMode),
    PresentValues(PresentValues),
    ProductInfo(ProductInfo),
}

/// Sum of `bytes` modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Write the checksum of the leading bytes into the last byte of the frame.
pub fn seal(frame: &mut Frame) {
    frame[CHECKSUM_POS] = checksum(&frame[..CHECKSUM_POS]);
}

/// Assemble the request frame for `command`.
///
/// Fails only if a scaled argument can not be represented on the wire.
pub fn build_request(command: &LoadCommand, address: u8) -> core::result::Result<Frame, ValueOutOfRange> {
    use LoadCommand as LC;

    let mut frame: Frame = [0x00; FRAME_LEN];
    frame[0] = START_BYTE;
    frame[ADDRESS_POS] = address;
    frame[OPCODE_POS] = command.opcode();

    match (*command, command.spec().argument) {
        (LC::SetRemoteControl(on) | LC::SetLoadOn(on), _) => frame[PAYLOAD_POS] = on as u8,
        (LC::SetMode(mode), _) => frame[PAYLOAD_POS] = mode.into(),
        (
            LC::SetMaxVoltage(value)
            | LC::SetCvVoltage(value)
            | LC::SetUvloVoltage(value)
            | LC::SetMaxCurrent(value)
            | LC::SetCcCurrent(value)
            | LC::SetMaxPower(value)
            | LC::SetCwPower(value)
            | LC::SetCrResistance(value),
            ArgumentEncoding::Scaled(kind),
        ) => {
            frame[PAYLOAD_POS..PAYLOAD_POS + SCALED_FIELD_LEN]
                .copy_from_slice(&units::encode(value, kind)?);
        }
        // Queries carry no argument.
        _ => {}
    }

    seal(&mut frame);
    Ok(frame)
}

/// Check a response frame and decode it according to `spec`.
///
/// Start byte and checksum are verified before anything else in the frame is looked at.
/// A status frame other than [`StatusCode::Success`] becomes [`Error::CommandRejected`].
pub fn validate_and_dispatch<I: embedded_io::Error>(
    spec: &CommandSpec,
    address: u8,
    frame: &Frame,
) -> Result<LoadResponse, I> {
    if frame[0] != START_BYTE {
        log::warn!("Invalid start byte {:#04X} in {:02X?}", frame[0], frame);
        return Err(Error::Malformed);
    }

    let calculated = checksum(&frame[..CHECKSUM_POS]);
    if calculated != frame[CHECKSUM_POS] {
        log::warn!(
            "Invalid checksum - calculated={:02X?} received={:02X?} frame={:02X?}",
            calculated,
            frame[CHECKSUM_POS],
            frame
        );
        return Err(Error::ChecksumMismatch {
            calculated,
            received: frame[CHECKSUM_POS],
        });
    }

    if frame[ADDRESS_POS] != address {
        log::warn!(
            "Response from address {:#04X}, expected {:#04X}",
            frame[ADDRESS_POS],
            address
        );
        return Err(Error::Malformed);
    }

    if frame[OPCODE_POS] == STATUS_ACK_OPCODE {
        return match StatusCode::from(frame[PAYLOAD_POS]) {
            StatusCode::Success if spec.response == ResponseKind::StatusAck => Ok(LoadResponse::Ack),
            StatusCode::Success | StatusCode::Malformed => {
                log::warn!(
                    "Unexpected status frame for opcode {:#04X}: {:02X?}",
                    spec.opcode,
                    frame
                );
                Err(Error::Malformed)
            }
            status => {
                log::warn!("Opcode {:#04X} rejected with {:?}", spec.opcode, status);
                Err(Error::CommandRejected(status))
            }
        };
    }

    if frame[OPCODE_POS] != spec.opcode {
        log::warn!(
            "Response opcode {:#04X} does not answer opcode {:#04X}",
            frame[OPCODE_POS],
            spec.opcode
        );
        return Err(Error::Malformed);
    }

    let response = match spec.response {
        ResponseKind::StatusAck => {
            log::warn!("Opcode {:#04X} answered without a status frame", spec.opcode);
            return Err(Error::Malformed);
        }
        ResponseKind::Scaled(kind) => LoadResponse::Value(units::decode_at(frame, PAYLOAD_POS, kind)),
        ResponseKind::OperatingMode => match OperatingMode::try_from(frame[PAYLOAD_POS]) {
            Ok(mode) => LoadResponse::Mode(mode),
            Err(()) => {
                log::warn!("Unknown operating mode {:#04X}", frame[PAYLOAD_POS]);
                return Err(Error::Malformed);
            }
        },
        ResponseKind::PresentValues => LoadResponse::PresentValues(decode_present_values(frame)),
        ResponseKind::ProductInfo => LoadResponse::ProductInfo(decode_product_info::<I>(frame)?),
    };

    Ok(response)
}

fn decode_present_values(frame: &Frame) -> PresentValues {
    PresentValues {
        voltage: units::decode_at(frame, VOLTAGE_POS, UnitKind::Voltage).value,
        current: units::decode_at(frame, CURRENT_POS, UnitKind::Current).value,
        power: units::decode_at(frame, POWER_POS, UnitKind::Power).value,
        operation_state: OperationState::from_bytes([frame[OPERATION_STATE_POS]]),
        demand_state: DemandState::from_bytes([
            frame[DEMAND_STATE_POS],
            frame[DEMAND_STATE_POS + 1],
        ]),
    }
}

fn decode_product_info<I: embedded_io::Error>(frame: &Frame) -> Result<ProductInfo, I> {
    Ok(ProductInfo {
        model: ascii_field::<I, MODEL_LEN>(&frame[MODEL_POS..MODEL_POS + MODEL_LEN])?,
        firmware: FirmwareVersion {
            minor: frame[FIRMWARE_POS],
            major: frame[FIRMWARE_POS + 1],
        },
        serial_number: ascii_field::<I, SERIAL_LEN>(&frame[SERIAL_POS..SERIAL_POS + SERIAL_LEN])?,
    })
}

/// Fixed width ASCII text, padded with NUL or space.
fn ascii_field<I: embedded_io::Error, const N: usize>(bytes: &[u8]) -> Result<heapless::String<N>, I> {
    let end = bytes
        .iter()
        .rposition(|b| *b != 0x00 && *b != b' ')
        .map_or(0, |last| last + 1);
    let text = &bytes[..end];

    if !text.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        log::warn!("Non ASCII text field {:02X?}", bytes);
        return Err(Error::Malformed);
    }

    let mut field = heapless::String::new();
    for b in text {
        if field.push(*b as char).is_err() {
            return Err(Error::Malformed);
        }
    }
    Ok(field)
}
