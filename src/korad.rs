//! Korad/Tenma KA-series bench supplies over a serial line.
//!
//! The protocol is bare ASCII with no line terminators in either direction:
//! a query such as `VOUT1?` is answered with `05.00`, and the answer is over
//! once the line goes quiet. Commands that arrive back-to-back are silently
//! dropped by the firmware, so a minimum gap is kept between them.

use crate::instrument::{InstrumentError, PowerSupply, MAX_OUTPUT_VOLTAGE};
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::ops::RangeInclusive;
use std::thread;
use std::time::{Duration, Instant};

const BAUD_RATE: u32 = 9600;
/// Silence on the line that ends a reply.
const READ_TIMEOUT: Duration = Duration::from_millis(50);
const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);
const COMMAND_GAP: Duration = Duration::from_millis(50);
const CHANNELS: RangeInclusive<u8> = 1..=2;

pub struct KoradSupply<T> {
    port: T,
    response_timeout: Duration,
    command_gap: Duration,
    last_command: Option<Instant>,
}

impl KoradSupply<Box<dyn SerialPort>> {
    /// Open the supply on a serial port, e.g. `/dev/ttyACM0`.
    pub fn open(port: &str) -> Result<Self, InstrumentError> {
        log::debug!("Opening power supply on {}", port);
        let serial = serialport::new(port, BAUD_RATE)
            .timeout(READ_TIMEOUT)
            .open()?;
        serial.clear(serialport::ClearBuffer::All)?;
        Ok(Self::new(serial))
    }
}

impl<T: Read + Write> KoradSupply<T> {
    pub fn new(port: T) -> Self {
        Self {
            port,
            response_timeout: RESPONSE_TIMEOUT,
            command_gap: COMMAND_GAP,
            last_command: None,
        }
    }

    /// How long to wait for the first byte of a reply.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Minimum spacing between two commands.
    pub fn with_command_gap(mut self, gap: Duration) -> Self {
        self.command_gap = gap;
        self
    }

    pub fn get_ref(&self) -> &T {
        &self.port
    }

    fn send(&mut self, command: &str) -> Result<(), InstrumentError> {
        if let Some(last) = self.last_command {
            let since = last.elapsed();
            if since < self.command_gap {
                thread::sleep(self.command_gap - since);
            }
        }

        log::debug!("PSU <- {}", command);
        self.port.write_all(command.as_bytes())?;
        self.port.flush()?;
        self.last_command = Some(Instant::now());
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String, InstrumentError> {
        self.send(command)?;

        let mut response = Vec::new();
        let started = Instant::now();

        loop {
            let mut byte = [0u8; 1];
            let quiet = match self.port.read(&mut byte) {
                Ok(0) => true,
                Ok(_) => {
                    response.push(byte[0]);
                    false
                }
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => true,
                Err(e) => return Err(e.into()),
            };

            if quiet {
                if !response.is_empty() {
                    break;
                }
                if started.elapsed() >= self.response_timeout {
                    return Err(InstrumentError::Timeout {
                        command: command.to_string(),
                    });
                }
            }
        }

        let reply = String::from_utf8_lossy(&response)
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string();
        log::debug!("PSU -> {}", reply);
        Ok(reply)
    }

    fn query_number(&mut self, command: &str) -> Result<f64, InstrumentError> {
        let reply = self.query(command)?;
        reply
            .parse()
            .map_err(|_| InstrumentError::MalformedReply {
                command: command.to_string(),
                reply,
            })
    }

    fn check_channel(channel: u8) -> Result<(), InstrumentError> {
        if CHANNELS.contains(&channel) {
            Ok(())
        } else {
            Err(InstrumentError::InvalidChannel(channel))
        }
    }
}

impl<T: Read + Write> PowerSupply for KoradSupply<T> {
    fn identify(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    fn set_channel_voltage(&mut self, channel: u8, volts: f64) -> Result<(), InstrumentError> {
        Self::check_channel(channel)?;
        if !(0.0..=MAX_OUTPUT_VOLTAGE).contains(&volts) {
            return Err(InstrumentError::VoltageOutOfRange {
                requested: volts,
                max: MAX_OUTPUT_VOLTAGE,
            });
        }
        self.send(&format!("VSET{}:{:05.2}", channel, volts))
    }

    fn read_channel_output_voltage(&mut self, channel: u8) -> Result<f64, InstrumentError> {
        Self::check_channel(channel)?;
        self.query_number(&format!("VOUT{}?", channel))
    }

    fn read_channel_output_current(&mut self, channel: u8) -> Result<f64, InstrumentError> {
        Self::check_channel(channel)?;
        self.query_number(&format!("IOUT{}?", channel))
    }
}
