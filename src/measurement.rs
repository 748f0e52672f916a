//! One setpoint: command the rig, let it settle, read the supply back.

use crate::color::ColorTriple;
use crate::device::LedStrip;
use crate::error::Result;
use crate::instrument::PowerSupply;
use crate::plan::Setpoint;
use std::thread;
use std::time::Duration;

/// What was commanded and what the supply reported for one setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub brightness: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// Supply output voltage, volts.
    pub voltage: f64,
    /// Average current per pixel after the offset correction, milliamps.
    pub current_ma: f64,
}

impl Observation {
    pub fn color(&self) -> ColorTriple {
        ColorTriple::new(self.red, self.green, self.blue)
    }
}

/// Drives the rig to one setpoint and reads the supply once it has settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementStep {
    channel: u8,
    settle: Duration,
    current_offset_ma: f64,
}

impl MeasurementStep {
    /// `current_offset_ma` is subtracted from every per-pixel current, to
    /// remove draw that does not come from the LEDs.
    pub fn new(channel: u8, settle: Duration, current_offset_ma: f64) -> Self {
        Self {
            channel,
            settle,
            current_offset_ma,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    pub fn measure<P, L>(
        &self,
        supply: &mut P,
        strip: &mut L,
        setpoint: &Setpoint,
    ) -> Result<Observation>
    where
        P: PowerSupply + ?Sized,
        L: LedStrip + ?Sized,
    {
        if let Some(volts) = setpoint.voltage {
            supply.set_channel_voltage(self.channel, volts)?;
        }

        strip.set_global_brightness(setpoint.brightness)?;
        strip.fill(setpoint.color)?;
        strip.push_frame()?;

        thread::sleep(self.settle);

        let voltage = supply.read_channel_output_voltage(self.channel)?;
        let current_a = supply.read_channel_output_current(self.channel)?;
        let current_ma = current_a * 1000.0 / strip.pixel_count() as f64 - self.current_offset_ma;

        Ok(Observation {
            brightness: setpoint.brightness,
            red: setpoint.color.red,
            green: setpoint.color.green,
            blue: setpoint.color.blue,
            voltage,
            current_ma,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::instrument::InstrumentError;
    use crate::mock::{StripCall, StubStrip, StubSupply, SupplyCall};
    use std::time::Instant;

    fn setpoint(voltage: Option<f64>) -> Setpoint {
        Setpoint {
            voltage,
            brightness: 17,
            color: ColorTriple::new(255, 0, 0),
        }
    }

    #[test]
    fn test_commands_before_reads() {
        let mut supply = StubSupply::with_readings(&[(5.02, 0.4)]);
        let mut strip = StubStrip::new(2);
        let step = MeasurementStep::new(1, Duration::ZERO, 0.0);

        step.measure(&mut supply, &mut strip, &setpoint(Some(5.0)))
            .unwrap();

        assert_eq!(
            supply.calls,
            vec![
                SupplyCall::SetVoltage(1, 5.0),
                SupplyCall::ReadVoltage(1),
                SupplyCall::ReadCurrent(1),
            ]
        );
        assert_eq!(
            strip.calls,
            vec![
                StripCall::Brightness(17),
                StripCall::Pixel(0, ColorTriple::new(255, 0, 0)),
                StripCall::Pixel(1, ColorTriple::new(255, 0, 0)),
                StripCall::Push,
            ]
        );
    }

    #[test]
    fn test_supply_untouched_without_voltage() {
        let mut supply = StubSupply::with_readings(&[(5.0, 0.1)]);
        let mut strip = StubStrip::new(1);
        let step = MeasurementStep::new(2, Duration::ZERO, 0.0);

        step.measure(&mut supply, &mut strip, &setpoint(None)).unwrap();

        assert!(!supply
            .calls
            .iter()
            .any(|c| matches!(c, SupplyCall::SetVoltage(..))));
    }

    #[test]
    fn test_current_normalized_per_pixel_with_offset() {
        let mut supply = StubSupply::with_readings(&[(4.98, 0.5)]);
        let mut strip = StubStrip::new(20);
        let step = MeasurementStep::new(1, Duration::ZERO, 1.5);

        let observation = step
            .measure(&mut supply, &mut strip, &setpoint(None))
            .unwrap();

        assert_eq!(
            observation,
            Observation {
                brightness: 17,
                red: 255,
                green: 0,
                blue: 0,
                voltage: 4.98,
                current_ma: 0.5 * 1000.0 / 20.0 - 1.5,
            }
        );
    }

    #[test]
    fn test_waits_for_settle_time() {
        let mut supply = StubSupply::with_readings(&[(5.0, 0.1)]);
        let mut strip = StubStrip::new(1);
        let step = MeasurementStep::new(1, Duration::from_millis(25), 0.0);

        let started = Instant::now();
        step.measure(&mut supply, &mut strip, &setpoint(None)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_supply_failure_propagates() {
        let mut supply = StubSupply::with_readings(&[(5.0, 0.1)]).failing_on_current_read(1);
        let mut strip = StubStrip::new(1);
        let step = MeasurementStep::new(1, Duration::ZERO, 0.0);

        let result = step.measure(&mut supply, &mut strip, &setpoint(None));
        assert!(matches!(
            result,
            Err(Error::Instrument(InstrumentError::Timeout { .. }))
        ));
    }
}
