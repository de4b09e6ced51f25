use crate::{
    command::{LoadCommand, OperatingMode},
    error::{Error, Result},
    frame::{self, Frame, LoadResponse, PresentValues, ProductInfo},
    transport::{self, Transport},
    units::UnitKind,
};

/// You can create a DcLoad using any interface which implements [Transport].
///
/// Each method performs exactly one request/response round trip. Nothing is cached between
/// calls and nothing is retried; a [`Error::ChecksumMismatch`] should be handled by calling
/// the method again.
///
/// For its methods, we generally use the nomenclature that "set" means to write a configuration and
/// "get" means to read back a configuration value. Where as "read" means to get a measured value.
pub struct DcLoad<S: Transport> {
    interface: S,
    /// Default for the load is 0x00.
    address: u8,
}

impl<S: Transport> DcLoad<S> {
    /// Create a new DcLoad instance with the given interface and address.
    pub fn new(interface: S, address: u8) -> Self {
        Self { interface, address }
    }

    /// Give the interface back.
    pub fn release(self) -> S {
        self.interface
    }

    /// Put the load under remote control, or hand control back to the front panel.
    pub fn set_remote_control(&mut self, remote: bool) -> Result<(), S::Error> {
        self.command(LoadCommand::SetRemoteControl(remote))
    }

    /// Turn the load input on or off.
    pub fn set_load_on(&mut self, on: bool) -> Result<(), S::Error> {
        self.command(LoadCommand::SetLoadOn(on))
    }

    /// Set the maximum input voltage in volts.
    pub fn set_max_voltage(&mut self, volts: f64) -> Result<(), S::Error> {
        self.command(LoadCommand::SetMaxVoltage(volts))
    }

    /// Get the maximum input voltage in volts.
    pub fn get_max_voltage(&mut self) -> Result<f64, S::Error> {
        self.query_value(LoadCommand::GetMaxVoltage, UnitKind::Voltage)
    }

    /// Set the maximum input current in amps.
    pub fn set_max_current(&mut self, amps: f64) -> Result<(), S::Error> {
        self.command(LoadCommand::SetMaxCurrent(amps))
    }

    /// Get the maximum input current in amps.
    pub fn get_max_current(&mut self) -> Result<f64, S::Error> {
        self.query_value(LoadCommand::GetMaxCurrent, UnitKind::Current)
    }

    /// Set the maximum input power in watts.
    pub fn set_max_power(&mut self, watts: f64) -> Result<(), S::Error> {
        self.command(LoadCommand::SetMaxPower(watts))
    }

    /// Get the maximum input power in watts.
    pub fn get_max_power(&mut self) -> Result<f64, S::Error> {
        self.query_value(LoadCommand::GetMaxPower, UnitKind::Power)
    }

    /// Select the regulation mode.
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<(), S::Error> {
        self.command(LoadCommand::SetMode(mode))
    }

    /// Get the active regulation mode.
    pub fn get_mode(&mut self) -> Result<OperatingMode, S::Error> {
        match self.execute(LoadCommand::GetMode)? {
            LoadResponse::Mode(mode) => Ok(mode),
            _ => Err(Error::UnknownReturnKind),
        }
    }

    /// Set the constant current setpoint in amps.
    pub fn set_cc_current(&mut self, amps: f64) -> Result<(), S::Error> {
        self.command(LoadCommand::SetCcCurrent(amps))
    }

    /// Get the constant current setpoint in amps.
    pub fn get_cc_current(&mut self) -> Result<f64, S::Error> {
        self.query_value(LoadCommand::GetCcCurrent, UnitKind::Current)
    }

    /// Set the constant voltage setpoint in volts.
    pub fn set_cv_voltage(&mut self, volts: f64) -> Result<(), S::Error> {
        self.command(LoadCommand::SetCvVoltage(volts))
    }

    /// Get the constant voltage setpoint in volts.
    pub fn get_cv_voltage(&mut self) -> Result<f64, S::Error> {
        self.query_value(LoadCommand::GetCvVoltage, UnitKind::Voltage)
    }

    /// Set the constant power setpoint in watts.
    pub fn set_cw_power(&mut self, watts: f64) -> Result<(), S::Error> {
        self.command(LoadCommand::SetCwPower(watts))
    }

    /// Get the constant power setpoint in watts.
    pub fn get_cw_power(&mut self) -> Result<f64, S::Error> {
        self.query_value(LoadCommand::GetCwPower, UnitKind::Power)
    }

    /// Set the constant resistance setpoint in ohms.
    pub fn set_cr_resistance(&mut self, ohms: f64) -> Result<(), S::Error> {
        self.command(LoadCommand::SetCrResistance(ohms))
    }

    /// Get the constant resistance setpoint in ohms.
    pub fn get_cr_resistance(&mut self) -> Result<f64, S::Error> {
        self.query_value(LoadCommand::GetCrResistance, UnitKind::Resistance)
    }

    /// Set the under-voltage lockout in volts. The load switches off below this input voltage.
    pub fn set_uvlo_voltage(&mut self, volts: f64) -> Result<(), S::Error> {
        self.command(LoadCommand::SetUvloVoltage(volts))
    }

    /// Get the under-voltage lockout in volts.
    pub fn get_uvlo_voltage(&mut self) -> Result<f64, S::Error> {
        self.query_value(LoadCommand::GetUvloVoltage, UnitKind::Voltage)
    }

    /// Return the measured input voltage, current, power and the state registers.
    pub fn read_present_values(&mut self) -> Result<PresentValues, S::Error> {
        match self.execute(LoadCommand::GetPresentValues)? {
            LoadResponse::PresentValues(values) => Ok(values),
            _ => Err(Error::UnknownReturnKind),
        }
    }

    /// Return the model, firmware version and serial number.
    pub fn get_product_info(&mut self) -> Result<ProductInfo, S::Error> {
        match self.execute(LoadCommand::GetProductInfo)? {
            LoadResponse::ProductInfo(info) => Ok(info),
            _ => Err(Error::UnknownReturnKind),
        }
    }

    /// Run one command round trip and return the decoded response.
    pub fn execute(&mut self, command: LoadCommand) -> Result<LoadResponse, S::Error> {
        let request = frame::build_request(&command, self.address)?;
        let response = self.send_and_receive(&request)?;
        frame::validate_and_dispatch(&command.spec(), self.address, &response)
    }

    /// Send a raw frame and block until a full response frame has been read.
    pub fn send_and_receive(&mut self, request: &Frame) -> Result<Frame, S::Error> {
        transport::send_frame(&mut self.interface, request)?;
        transport::read_frame(&mut self.interface)
    }

    fn command(&mut self, command: LoadCommand) -> Result<(), S::Error> {
        match self.execute(command)? {
            LoadResponse::Ack => Ok(()),
            _ => Err(Error::UnknownReturnKind),
        }
    }

    fn query_value(&mut self, command: LoadCommand, kind: UnitKind) -> Result<f64, S::Error> {
        match self.execute(command)? {
            LoadResponse::Value(value) if value.kind == kind => Ok(value.value),
            _ => Err(Error::UnknownReturnKind),
        }
    }
}
