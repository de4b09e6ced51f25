//! Driver for the TC0521 four-channel thermocouple meter.
//!
//! Every command is a 7 byte frame `[0x02, opcode, 0x00, 0x00, 0x00, 0x00, 0x03]`. Button
//! commands are not answered; the identification and status commands are.

use strum_macros::EnumIter;

use crate::{
    error::{Error, Result},
    status::{self, DeviceStatusRecord, STATUS_FRAME_LEN, STX, StatusFrame},
    transport::{self, Transport},
};

/// Length of every command frame.
pub const COMMAND_LEN: usize = 7;
/// Last byte of every meter frame.
pub const ETX: u8 = 0x03;
/// Length of the reply to the identification command.
pub const MODEL_RESPONSE_LEN: usize = 32;

const IDENTIFY_OPCODE: u8 = b'K';
const STATUS_OPCODE: u8 = b'A';

/// Identification reply of a TC0521.
pub const TC0521_SIGNATURE: [u8; MODEL_RESPONSE_LEN] =
    *b"\x02#\xc4\x91#\xc4\x91#\xc4\x91#\xc4\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff521\xff\xff\xff\xff\xff\x03";

/// Front panel buttons which can be pressed remotely.
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum Button {
    Backlight,
    /// Toggle between Celsius and Fahrenheit.
    Units,
    Record,
    Hold,
    /// Step through MAX, MIN, AVG and MIN/MAX/AVG.
    MinMaxAvg,
    ExitMinMaxAvg,
    /// Recall stored data.
    Recall,
}

impl From<Button> for u8 {
    fn from(button: Button) -> Self {
        match button {
            Button::Backlight => b'B',
            Button::Units => b'C',
            Button::Record => b'E',
            Button::Hold => b'H',
            Button::MinMaxAvg => b'M',
            Button::ExitMinMaxAvg => b'N',
            Button::Recall => b'P',
        }
    }
}

/// Build the command frame for `opcode`.
pub fn command_frame(opcode: u8) -> [u8; COMMAND_LEN] {
    [STX, opcode, 0x00, 0x00, 0x00, 0x00, ETX]
}

/// You can create a Tc0521 using any interface which implements [Transport].
///
/// The meter does not reliably reflect settings changed remotely, so configure it on the
/// front panel before connecting where possible.
pub struct Tc0521<S: Transport> {
    interface: S,
}

impl<S: Transport> Tc0521<S> {
    pub fn new(interface: S) -> Self {
        Self { interface }
    }

    /// Give the interface back.
    pub fn release(self) -> S {
        self.interface
    }

    /// Press a front panel button. The meter sends no reply.
    pub fn press(&mut self, button: Button) -> Result<(), S::Error> {
        transport::send_frame(&mut self.interface, &command_frame(button.into()))
    }

    /// Check that the attached device identifies itself as a TC0521.
    pub fn verify_model(&mut self) -> Result<(), S::Error> {
        transport::send_frame(&mut self.interface, &command_frame(IDENTIFY_OPCODE))?;
        let response: [u8; MODEL_RESPONSE_LEN] = transport::read_frame(&mut self.interface)?;
        if response != TC0521_SIGNATURE {
            log::warn!("Unexpected identification reply {:02X?}", response);
            return Err(Error::UnexpectedDevice);
        }
        Ok(())
    }

    /// Query the operating status and current temperatures.
    ///
    /// A [`Error::ChecksumMismatch`] means the report was discarded, query again.
    pub fn read_status(&mut self) -> Result<DeviceStatusRecord, S::Error> {
        transport::send_frame(&mut self.interface, &command_frame(STATUS_OPCODE))?;
        let frame: StatusFrame = transport::read_frame::<S, STATUS_FRAME_LEN>(&mut self.interface)?;
        status::decode_status(&frame)
    }
}
