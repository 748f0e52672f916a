//! Recording stand-ins for the power supply and LED strip.

use crate::color::ColorTriple;
use crate::device::{DeviceError, LedStrip};
use crate::instrument::{InstrumentError, PowerSupply};
use std::collections::VecDeque;
use std::io;

#[derive(Debug, Clone, PartialEq)]
pub enum SupplyCall {
    Identify,
    SetVoltage(u8, f64),
    ReadVoltage(u8),
    ReadCurrent(u8),
}

/// Replays scripted `(volts, amps)` readings, one pair per measurement.
#[derive(Debug, Default)]
pub struct StubSupply {
    pub calls: Vec<SupplyCall>,
    readings: VecDeque<(f64, f64)>,
    pending_current: Option<f64>,
    fail_on_current_read: Option<usize>,
    current_reads: usize,
}

impl StubSupply {
    pub fn with_readings(readings: &[(f64, f64)]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// The `n`-th current read (1-based) times out.
    pub fn failing_on_current_read(mut self, n: usize) -> Self {
        self.fail_on_current_read = Some(n);
        self
    }
}

impl PowerSupply for StubSupply {
    fn identify(&mut self) -> Result<String, InstrumentError> {
        self.calls.push(SupplyCall::Identify);
        Ok("STUB PSU V1.0".to_string())
    }

    fn set_channel_voltage(&mut self, channel: u8, volts: f64) -> Result<(), InstrumentError> {
        self.calls.push(SupplyCall::SetVoltage(channel, volts));
        Ok(())
    }

    fn read_channel_output_voltage(&mut self, channel: u8) -> Result<f64, InstrumentError> {
        self.calls.push(SupplyCall::ReadVoltage(channel));
        let (volts, amps) = self.readings.pop_front().unwrap_or((0.0, 0.0));
        self.pending_current = Some(amps);
        Ok(volts)
    }

    fn read_channel_output_current(&mut self, channel: u8) -> Result<f64, InstrumentError> {
        self.calls.push(SupplyCall::ReadCurrent(channel));
        self.current_reads += 1;
        if self.fail_on_current_read == Some(self.current_reads) {
            return Err(InstrumentError::Timeout {
                command: format!("IOUT{}?", channel),
            });
        }
        Ok(self.pending_current.take().unwrap_or(0.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StripCall {
    Brightness(u8),
    Pixel(usize, ColorTriple),
    Push,
    Blank,
    Release,
}

#[derive(Debug)]
pub struct StubStrip {
    pub calls: Vec<StripCall>,
    pixel_count: usize,
    fail_on_push: Option<usize>,
    pushes: usize,
}

impl StubStrip {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            calls: Vec::new(),
            pixel_count,
            fail_on_push: None,
            pushes: 0,
        }
    }

    /// The `n`-th frame push (1-based) fails with an I/O error.
    pub fn failing_on_push(mut self, n: usize) -> Self {
        self.fail_on_push = Some(n);
        self
    }

    pub fn count(&self, call: &StripCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl LedStrip for StubStrip {
    fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    fn set_global_brightness(&mut self, level: u8) -> Result<(), DeviceError> {
        self.calls.push(StripCall::Brightness(level));
        Ok(())
    }

    fn set_pixel(&mut self, index: usize, color: ColorTriple) -> Result<(), DeviceError> {
        self.calls.push(StripCall::Pixel(index, color));
        Ok(())
    }

    fn push_frame(&mut self) -> Result<(), DeviceError> {
        self.pushes += 1;
        if self.fail_on_push == Some(self.pushes) {
            return Err(DeviceError::Io(io::Error::other("bus fault")));
        }
        self.calls.push(StripCall::Push);
        Ok(())
    }

    fn blank(&mut self) -> Result<(), DeviceError> {
        self.calls.push(StripCall::Blank);
        Ok(())
    }

    fn release(&mut self) -> Result<(), DeviceError> {
        self.calls.push(StripCall::Release);
        Ok(())
    }
}
