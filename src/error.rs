//! Our error types for the bench instruments.

use thiserror::Error;

use crate::{frame::StatusCode, units::ValueOutOfRange};

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for instrument communications.
///
/// None of these are retried internally. A [`Error::ChecksumMismatch`] means the whole
/// request should be repeated by the caller.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    #[error("Communication timeout")]
    Timeout,
    #[error("{0}")]
    ValueOutOfRange(#[from] ValueOutOfRange),
    #[error("Frame truncated, expected {expected} bytes but received {received}")]
    FrameTruncated { expected: usize, received: usize },
    #[error("Malformed frame received")]
    Malformed,
    #[error("Checksum mismatch, calculated {calculated:#04x} but frame carries {received:#04x}")]
    ChecksumMismatch { calculated: u8, received: u8 },
    #[error("Command rejected by device: {0:?}")]
    CommandRejected(StatusCode),
    #[error("Response kind does not match the command issued")]
    UnknownReturnKind,
    #[error("Device did not identify as the expected model")]
    UnexpectedDevice,
}
