//! We use this mocking module in unit tests to emulate a serial port.

use thiserror::Error;

use crate::transport::Transport;

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 256>,
    /// Buffer containing data ready to be read
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Reply the emulated device sends once the next write arrives
    pending_response: Option<heapless::Vec<u8, 256>>,
    /// Largest number of bytes a single read returns
    max_read_chunk: usize,
    /// Number of times the buffers were cleared
    clear_count: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
    /// Report a timeout instead of end-of-stream once the read data runs out
    timeout_when_exhausted: bool,
    /// Number of upcoming reads which fail as interrupted
    interrupted_reads: usize,
}

#[derive(Error, Debug)]
pub enum MockSerialError {
    /// Simulated timeout error
    #[error("Simulated timeout")]
    Timeout,
    /// Simulated buffer overflow
    #[error("Mock buffer overflow")]
    BufferOverflow,
    /// Simulated signal interruption, the read may be retried
    #[error("Simulated interrupted read")]
    Interrupted,
    /// Generic simulated error for testing
    #[error("Simulated serial error")]
    SimulatedError,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::Interrupted => embedded_io::ErrorKind::Interrupted,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;

        // The device answers once it has been spoken to.
        if let Some(response) = self.pending_response.take() {
            self.read_buffer = response;
            self.read_position = 0;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if self.interrupted_reads > 0 {
            self.interrupted_reads -= 1;
            return Err(MockSerialError::Interrupted);
        }

        if self.read_position >= self.read_buffer.len() {
            if self.timeout_when_exhausted {
                return Err(MockSerialError::Timeout);
            }
            return Ok(0);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = buf.len().min(available_bytes).min(self.max_read_chunk);

        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl Transport for MockSerial {
    fn clear_buffers(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        self.read_position = self.read_buffer.len();
        self.clear_count += 1;
        Ok(())
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            pending_response: None,
            max_read_chunk: usize::MAX,
            clear_count: 0,
            should_error_on_write: false,
            should_error_on_read: false,
            timeout_when_exhausted: false,
            interrupted_reads: 0,
        }
    }

    /// Set the data that is immediately available to read()
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Set the reply which becomes readable after the next write
    pub fn set_response(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        let mut response = heapless::Vec::new();
        response
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        self.pending_response = Some(response);
        Ok(())
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Clear the write buffer
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
    }

    /// Number of times [`Transport::clear_buffers`] was called
    pub fn clear_count(&self) -> usize {
        self.clear_count
    }

    /// Limit how many bytes each read() hands back
    pub fn set_max_read_chunk(&mut self, chunk: usize) {
        self.max_read_chunk = chunk;
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    /// Configure whether running out of data is reported as a timeout
    pub fn set_timeout_when_exhausted(&mut self, timeout: bool) {
        self.timeout_when_exhausted = timeout;
    }

    /// Make the next `count` reads fail as interrupted
    pub fn set_interrupted_reads(&mut self, count: usize) {
        self.interrupted_reads = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn test_write_data() {
        let mut mock = MockSerial::new();
        let test_data = b"Hello, World!";

        let result = mock.write(test_data);
        assert_eq!(result.unwrap(), test_data.len());
        assert_eq!(mock.written_data(), test_data);
    }

    #[test]
    fn test_write_buffer_overflow() {
        let mut mock = MockSerial::new();
        let large_data = [0u8; 300]; // Larger than 256 byte capacity

        let result = mock.write(&large_data);
        assert!(matches!(result.unwrap_err(), MockSerialError::BufferOverflow));
    }

    #[test]
    fn test_read_partial_data() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"Long response data").unwrap();

        let mut buffer = [0u8; 5];
        assert_eq!(mock.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer, b"Long ");
    }

    #[test]
    fn test_read_chunk_limit() {
        let mut mock = MockSerial::new();
        mock.set_max_read_chunk(3);
        mock.set_read_data(b"Hello World").unwrap();

        let mut buffer = [0u8; 10];
        assert_eq!(mock.read(&mut buffer).unwrap(), 3);
        assert_eq!(&buffer[..3], b"Hel");
    }

    #[test]
    fn test_read_end_of_stream_when_no_data() {
        let mut mock = MockSerial::new();
        let mut buffer = [0u8; 10];
        assert_eq!(mock.read(&mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_read_timeout_after_data_exhausted() {
        let mut mock = MockSerial::new();
        mock.set_timeout_when_exhausted(true);
        mock.set_read_data(b"Hi").unwrap();

        let mut buffer = [0u8; 10];
        assert_eq!(mock.read(&mut buffer).unwrap(), 2);
        let err = mock.read(&mut buffer).unwrap_err();
        assert_eq!(err.kind(), embedded_io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_response_arrives_after_write() {
        let mut mock = MockSerial::new();
        mock.set_response(b"pong").unwrap();

        let mut buffer = [0u8; 4];
        assert_eq!(mock.read(&mut buffer).unwrap(), 0);

        mock.write(b"ping").unwrap();
        assert_eq!(mock.read(&mut buffer).unwrap(), 4);
        assert_eq!(&buffer, b"pong");
    }

    #[test]
    fn test_clear_buffers_discards_unread_data() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"stale").unwrap();

        mock.clear_buffers().unwrap();
        assert_eq!(mock.clear_count(), 1);

        let mut buffer = [0u8; 5];
        assert_eq!(mock.read(&mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_error_flags_toggle() {
        let mut mock = MockSerial::new();

        mock.set_write_error(true);
        assert!(mock.write(b"test").is_err());
        assert!(mock.flush().is_err());
        assert!(mock.clear_buffers().is_err());

        mock.set_write_error(false);
        assert!(mock.write(b"test").is_ok());

        mock.set_read_data(b"data").unwrap();
        mock.set_read_error(true);
        let mut buffer = [0u8; 10];
        assert!(mock.read(&mut buffer).is_err());

        mock.set_read_error(false);
        assert!(mock.read(&mut buffer).is_ok());
    }

    #[test]
    fn test_interrupted_reads() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"ok").unwrap();
        mock.set_interrupted_reads(1);

        let mut buffer = [0u8; 2];
        let err = mock.read(&mut buffer).unwrap_err();
        assert_eq!(err.kind(), embedded_io::ErrorKind::Interrupted);
        assert_eq!(mock.read(&mut buffer).unwrap(), 2);
    }

    #[test]
    fn test_clear_written_data() {
        let mut mock = MockSerial::new();
        mock.write(b"test data").unwrap();
        mock.clear_written_data();
        assert!(mock.written_data().is_empty());
    }
}
