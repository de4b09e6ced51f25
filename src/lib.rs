//! This crate provides drivers for bench test instruments which speak fixed-length binary frames over a serial link.
//!
//! It supports `no-std` environments by use of the `no-std` feature flag.
//!
//! Supported instruments:
//! * B&K Precision 8500 series programmable DC electronic loads, see [`load::DcLoad`]
//! * PerfectPrime TC0521 four-channel thermocouple meter, see [`thermocouple::Tc0521`]
//!
//! Both drivers are generic over any [`transport::Transport`], an [`embedded_io`] interface
//! which can also discard stale bytes.
//!
//! The serial port used for DC load comms should be configured like so:
//! * Default baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! The thermocouple meter uses the same framing with a one second read timeout.

#![cfg_attr(feature = "no-std", no_std)]

pub mod command;
pub mod error;
pub mod frame;
pub mod load;
pub mod status;
pub mod thermocouple;
pub mod transport;
pub mod units;

#[cfg(test)]
mod mock_serial;
