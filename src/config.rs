//! Validated run configuration, independent of how it was collected.

use crate::apa102::RgbOrder;
use crate::axis::{Axis, AxisValue, InvalidRangeError};
use crate::color::{ColorSequence, SweepMode};
use crate::device::DeviceError;
use crate::error::Result;
use crate::instrument::InstrumentError;
use crate::measurement::MeasurementStep;
use crate::plan::SweepPlan;
use std::path::PathBuf;
use std::time::Duration;

/// Inclusive bounds and step of one axis, as the user gave them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeConfig<T> {
    pub min: T,
    pub max: T,
    pub step: T,
}

impl<T: AxisValue> RangeConfig<T> {
    pub fn new(min: T, max: T, step: T) -> Self {
        Self { min, max, step }
    }

    pub fn axis(&self) -> std::result::Result<Axis<T>, InvalidRangeError> {
        Axis::new(self.min, self.max, self.step)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub output: PathBuf,
    pub overwrite: bool,
    /// `individual`, `white` or `full`.
    pub mode: String,
    pub psu_port: String,
    /// 1-based supply channel.
    pub psu_channel: u8,
    pub strip_device: PathBuf,
    pub strip_rgb_order: String,
    pub pixel_count: usize,
    pub brightness: RangeConfig<u8>,
    pub value: RangeConfig<u8>,
    /// `None` leaves the supply at whatever voltage it is set to.
    pub voltage: Option<RangeConfig<f64>>,
    pub settle_time: Duration,
    pub current_offset_ma: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("measurements.csv"),
            overwrite: false,
            mode: SweepMode::Individual.as_str().to_string(),
            psu_port: "/dev/ttyS0".to_string(),
            psu_channel: 1,
            strip_device: PathBuf::from("/dev/spidev0.0"),
            strip_rgb_order: "rgb".to_string(),
            pixel_count: 20,
            brightness: RangeConfig::new(0, 31, 1),
            value: RangeConfig::new(0, 255, 1),
            voltage: None,
            settle_time: Duration::from_millis(100),
            current_offset_ma: 0.0,
        }
    }
}

impl SweepConfig {
    /// Build the sweep plan. Every configuration error surfaces here, before
    /// any file, port or bus is opened.
    pub fn plan(&self) -> Result<SweepPlan> {
        let mode: SweepMode = self.mode.parse()?;

        if self.pixel_count == 0 {
            return Err(InvalidRangeError::BelowMinimum {
                axis: "Pixel count",
                value: self.pixel_count.to_string(),
                min: "1".to_string(),
            }
            .into());
        }
        if self.psu_channel == 0 {
            return Err(InstrumentError::InvalidChannel(self.psu_channel).into());
        }
        self.rgb_order()?;

        let voltage = self.voltage.as_ref().map(RangeConfig::axis).transpose()?;
        let colors = ColorSequence::new(mode, self.value.axis()?);
        SweepPlan::new(voltage, self.brightness.axis()?, colors)
    }

    pub fn rgb_order(&self) -> std::result::Result<RgbOrder, DeviceError> {
        self.strip_rgb_order.parse()
    }

    pub fn measurement_step(&self) -> MeasurementStep {
        MeasurementStep::new(self.psu_channel, self.settle_time, self.current_offset_ma)
    }
}
