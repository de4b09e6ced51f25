use std::env;

use bench_instruments::{
    load::DcLoad,
    thermocouple::{Button, Tc0521},
    transport::Transport,
};
use inquire::Select;
use serialport::{ClearBuffer, SerialPort};

// Configuration constants - adjust these for your setup
const LOAD_BAUD_RATE: u32 = 9600;
const METER_BAUD_RATE: u32 = 9600;
const SERIAL_TIMEOUT_MS: u64 = 1000;
const LOAD_ADDRESS: u8 = 0x00;
const CC_CURRENT_A: f64 = 0.1;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

impl Transport for PortWrapper {
    fn clear_buffers(&mut self) -> Result<(), Self::Error> {
        self.0
            .clear(ClearBuffer::All)
            .map_err(|e| IoError(e.into()))
    }
}

fn select_port(prompt: &str) -> String {
    // List available serial ports
    let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

    if ports.is_empty() {
        eprintln!("No serial ports found!");
        std::process::exit(1);
    }

    let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

    Select::new(prompt, port_names)
        .prompt()
        .expect("Failed to select port")
}

fn open_port(port_name: &str, baud_rate: u32) -> PortWrapper {
    let port = serialport::new(port_name, baud_rate)
        .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");
    PortWrapper(port)
}

fn exercise_load(port_name: &str) {
    let mut load = DcLoad::new(open_port(port_name, LOAD_BAUD_RATE), LOAD_ADDRESS);

    load.set_remote_control(true).unwrap();

    let info = load.get_product_info().unwrap();
    println!(
        "Model: {} firmware {:.2} serial {}",
        info.model,
        info.firmware.as_f32(),
        info.serial_number
    );

    load.set_cc_current(CC_CURRENT_A).unwrap();
    println!("CC setpoint read back: {}A", load.get_cc_current().unwrap());

    let values = load.read_present_values().unwrap();
    println!("{:#?}", values);

    load.set_remote_control(false).unwrap();
}

fn exercise_meter(port_name: &str) {
    let mut meter = Tc0521::new(open_port(port_name, METER_BAUD_RATE));

    meter.verify_model().unwrap();
    println!("Found TC0521");

    meter.press(Button::Backlight).unwrap();

    let status = meter.read_status().unwrap();
    println!("{:#?}", status);
}

fn main() {
    // Usage: serial [load|meter] [port]
    let instrument = env::args().nth(1).unwrap_or_else(|| String::from("load"));
    let port_name = env::args()
        .nth(2)
        .unwrap_or_else(|| select_port("Select a serial port:"));

    println!("Using port: {}", port_name);

    match instrument.as_str() {
        "meter" => exercise_meter(&port_name),
        _ => exercise_load(&port_name),
    }
}
