//! The full, ordered iteration space of a characterization run.
//!
//! A [`SweepPlan`] nests its axes with voltage outermost, then brightness, then
//! color. Changing the supply voltage is the slowest operation on the rig, so it
//! changes as rarely as possible; color changes on every step.

use crate::axis::{Axis, InvalidRangeError};
use crate::color::{ColorSequence, ColorTriple};
use crate::device::MAX_GLOBAL_BRIGHTNESS;
use crate::error::Result;
use crate::instrument::{InstrumentError, MAX_OUTPUT_VOLTAGE};
use std::iter::FusedIterator;

/// One commanded rig state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoint {
    /// Supply voltage to command, or `None` to leave the supply untouched.
    pub voltage: Option<f64>,
    pub brightness: u8,
    pub color: ColorTriple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    voltage: Option<Axis<f64>>,
    brightness: Axis<u8>,
    colors: ColorSequence,
    total: usize,
}

impl SweepPlan {
    /// Compose a plan, checking the axes against the device and supply limits.
    pub fn new(
        voltage: Option<Axis<f64>>,
        brightness: Axis<u8>,
        colors: ColorSequence,
    ) -> Result<Self> {
        if brightness.stop() > MAX_GLOBAL_BRIGHTNESS {
            return Err(InvalidRangeError::AboveMaximum {
                axis: "Brightness",
                value: brightness.stop().to_string(),
                max: MAX_GLOBAL_BRIGHTNESS.to_string(),
            }
            .into());
        }

        if let Some(voltage) = &voltage {
            if voltage.start() < 0.0 {
                return Err(InstrumentError::VoltageOutOfRange {
                    requested: voltage.start(),
                    max: MAX_OUTPUT_VOLTAGE,
                }
                .into());
            }
            if voltage.stop() > MAX_OUTPUT_VOLTAGE {
                return Err(InstrumentError::VoltageOutOfRange {
                    requested: voltage.stop(),
                    max: MAX_OUTPUT_VOLTAGE,
                }
                .into());
            }
        }

        let total = voltage
            .as_ref()
            .map_or(1, Axis::length)
            .checked_mul(brightness.length())
            .and_then(|n| n.checked_mul(colors.length()))
            .ok_or(InvalidRangeError::TooManySetpoints)?;

        Ok(Self {
            voltage,
            brightness,
            colors,
            total,
        })
    }

    pub fn voltage(&self) -> Option<&Axis<f64>> {
        self.voltage.as_ref()
    }

    pub fn brightness(&self) -> &Axis<u8> {
        &self.brightness
    }

    pub fn colors(&self) -> &ColorSequence {
        &self.colors
    }

    /// Number of setpoints in the plan.
    pub fn total_count(&self) -> usize {
        self.total
    }

    /// The `i`-th setpoint in traversal order, or `None` past the end.
    pub fn get(&self, i: usize) -> Option<Setpoint> {
        if i >= self.total_count() {
            return None;
        }
        let colors = self.colors.length();
        let per_voltage = self.brightness.length() * colors;

        let voltage = match &self.voltage {
            Some(axis) => Some(axis.get(i / per_voltage)?),
            None => None,
        };
        Some(Setpoint {
            voltage,
            brightness: self.brightness.get((i / colors) % self.brightness.length())?,
            color: self.colors.get(i % colors)?,
        })
    }

    /// Iterate every setpoint, voltage changing slowest and color fastest.
    pub fn produce(&self) -> SetpointIter<'_> {
        SetpointIter {
            plan: self,
            front: 0,
        }
    }
}

impl<'a> IntoIterator for &'a SweepPlan {
    type Item = Setpoint;
    type IntoIter = SetpointIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.produce()
    }
}

#[derive(Debug, Clone)]
pub struct SetpointIter<'a> {
    plan: &'a SweepPlan,
    front: usize,
}

impl Iterator for SetpointIter<'_> {
    type Item = Setpoint;

    fn next(&mut self) -> Option<Setpoint> {
        let setpoint = self.plan.get(self.front)?;
        self.front += 1;
        Some(setpoint)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.total_count().saturating_sub(self.front);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SetpointIter<'_> {}

impl FusedIterator for SetpointIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::SweepMode;
    use crate::error::Error;

    fn two_whites() -> ColorSequence {
        ColorSequence::new(SweepMode::White, Axis::new(0, 255, 255).unwrap())
    }

    #[test]
    fn test_total_count_is_product() {
        for mode in [SweepMode::Individual, SweepMode::White, SweepMode::Full] {
            let colors = ColorSequence::new(mode, Axis::new(0, 200, 50).unwrap());
            let brightness = Axis::new(0, 31, 4).unwrap();

            let plan = SweepPlan::new(None, brightness, colors).unwrap();
            assert_eq!(
                plan.total_count(),
                brightness.length() * colors.length()
            );
            assert_eq!(plan.produce().count(), plan.total_count());

            let voltage = Axis::new(4.5, 5.5, 0.25).unwrap();
            let plan = SweepPlan::new(Some(voltage), brightness, colors).unwrap();
            assert_eq!(
                plan.total_count(),
                voltage.length() * brightness.length() * colors.length()
            );
            assert_eq!(plan.produce().count(), plan.total_count());
        }
    }

    #[test]
    fn test_voltage_slowest_color_fastest() {
        let plan = SweepPlan::new(
            Some(Axis::new(4.0, 5.0, 1.0).unwrap()),
            Axis::new(1, 2, 1).unwrap(),
            two_whites(),
        )
        .unwrap();

        let visited: Vec<(Option<f64>, u8, u8)> = plan
            .produce()
            .map(|s| (s.voltage, s.brightness, s.color.red))
            .collect();

        assert_eq!(
            visited,
            vec![
                (Some(4.0), 1, 0),
                (Some(4.0), 1, 255),
                (Some(4.0), 2, 0),
                (Some(4.0), 2, 255),
                (Some(5.0), 1, 0),
                (Some(5.0), 1, 255),
                (Some(5.0), 2, 0),
                (Some(5.0), 2, 255),
            ]
        );
    }

    #[test]
    fn test_no_voltage_axis() {
        let plan = SweepPlan::new(None, Axis::new(31, 31, 1).unwrap(), two_whites()).unwrap();
        assert_eq!(plan.total_count(), 2);
        assert!(plan.produce().all(|s| s.voltage.is_none()));
    }

    #[test]
    fn test_voltage_above_ceiling_rejected() {
        let result = SweepPlan::new(
            Some(Axis::new(5.0, MAX_OUTPUT_VOLTAGE + 1.0, 1.0).unwrap()),
            Axis::new(0, 31, 1).unwrap(),
            two_whites(),
        );
        assert!(matches!(
            result,
            Err(Error::Instrument(InstrumentError::VoltageOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_negative_voltage_rejected() {
        let result = SweepPlan::new(
            Some(Axis::new(-1.0, 5.0, 1.0).unwrap()),
            Axis::new(0, 31, 1).unwrap(),
            two_whites(),
        );
        assert!(matches!(
            result,
            Err(Error::Instrument(InstrumentError::VoltageOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_brightness_above_device_maximum_rejected() {
        let result = SweepPlan::new(None, Axis::new(0, 32, 1).unwrap(), two_whites());
        assert!(matches!(
            result,
            Err(Error::InvalidRange(InvalidRangeError::AboveMaximum { .. }))
        ));
    }

    #[test]
    fn test_uncountable_plan_rejected() {
        let result = SweepPlan::new(
            Some(Axis::new(0.0, 30.0, 1e-11).unwrap()),
            Axis::new(0, 31, 1).unwrap(),
            ColorSequence::new(SweepMode::Full, Axis::new(0, 255, 1).unwrap()),
        );
        assert!(matches!(
            result,
            Err(Error::InvalidRange(InvalidRangeError::TooManySetpoints))
        ));
    }
}
