//! The byte transport shared by both instruments.
//!
//! Any [`embedded_io::Read`] + [`embedded_io::Write`] interface works once it can also
//! discard stale bytes, see [`Transport`].

use embedded_io::Error as _;

use crate::error::{Error, Result};

/// A serial interface usable by the instrument drivers.
pub trait Transport: embedded_io::Read + embedded_io::Write {
    /// Discard any bytes waiting in the receive and transmit buffers.
    fn clear_buffers(&mut self) -> core::result::Result<(), Self::Error>;
}

/// Clear stale bytes, then write the whole frame and flush it out.
pub(crate) fn send_frame<S: Transport>(interface: &mut S, frame: &[u8]) -> Result<(), S::Error> {
    log::debug!("TX {:02X?}", frame);
    interface.clear_buffers().map_err(Error::SerialError)?;
    interface.write_all(frame).map_err(Error::SerialError)?;
    interface.flush().map_err(Error::SerialError)?;
    Ok(())
}

/// Block until exactly `N` bytes have been read.
///
/// A read that ends early is never returned as a frame. It surfaces as
/// [`Error::FrameTruncated`], or [`Error::Timeout`] when nothing arrived at all.
pub(crate) fn read_frame<S: Transport, const N: usize>(
    interface: &mut S,
) -> Result<[u8; N], S::Error> {
    let mut frame = [0u8; N];
    let mut received = 0;

    while received < N {
        match interface.read(&mut frame[received..]) {
            Ok(0) => break,
            Ok(bytes_read) => received += bytes_read,
            Err(e) if e.kind() == embedded_io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == embedded_io::ErrorKind::TimedOut => {
                if received == 0 {
                    log::warn!("Timed out waiting for a {} byte frame", N);
                    return Err(Error::Timeout);
                }
                break;
            }
            Err(e) => return Err(Error::SerialError(e)),
        }
    }

    if received < N {
        log::warn!(
            "Short frame - required={} received={} data={:02X?}",
            N,
            received,
            &frame[..received]
        );
        return Err(Error::FrameTruncated {
            expected: N,
            received,
        });
    }

    log::debug!("RX {:02X?}", frame);
    Ok(frame)
}
