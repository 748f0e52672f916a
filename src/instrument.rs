//! The programmable power supply the rig measures through.

/// Highest voltage any plan may command. Checked once against the voltage
/// axis when a plan is built.
pub const MAX_OUTPUT_VOLTAGE: f64 = 30.0;

#[derive(Debug, thiserror::Error)]
pub enum InstrumentError {
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout error: no reply to '{command}'")]
    Timeout { command: String },

    #[error("Malformed reply to '{command}': '{reply}'")]
    MalformedReply { command: String, reply: String },

    #[error("Voltage {requested} V is outside the supply range 0..={max} V")]
    VoltageOutOfRange { requested: f64, max: f64 },

    #[error("Channel {0} does not exist on this power supply")]
    InvalidChannel(u8),
}

/// Capabilities the sweep needs from a power supply.
///
/// Voltages are in volts and currents in amps, as the supply reports them.
pub trait PowerSupply {
    /// Instrument identity string, recorded with the dataset.
    fn identify(&mut self) -> Result<String, InstrumentError>;

    fn set_channel_voltage(&mut self, channel: u8, volts: f64) -> Result<(), InstrumentError>;

    fn read_channel_output_voltage(&mut self, channel: u8) -> Result<f64, InstrumentError>;

    fn read_channel_output_current(&mut self, channel: u8) -> Result<f64, InstrumentError>;
}
