//! Single sweep dimensions.
//!
//! An [`Axis`] is an inclusive `start..=stop` range walked in fixed steps. The
//! last produced value is always `stop`, even when `stop - start` is not a
//! whole multiple of `step`, so `Axis::new(0, 10, 3)` yields `0, 3, 6, 9, 10`.
//!
//! Every interior value is recomputed as `start + k * step` rather than
//! accumulated, so real-valued axes do not drift.

use std::fmt;
use std::iter::FusedIterator;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRangeError {
    #[error("Range stop {stop} is below start {start}")]
    Reversed { start: String, stop: String },

    #[error("Range step {step} must be greater than zero")]
    NonPositiveStep { step: String },

    #[error("{axis} value {value} exceeds the maximum of {max}")]
    AboveMaximum {
        axis: &'static str,
        value: String,
        max: String,
    },

    #[error("{axis} value {value} is below the minimum of {min}")]
    BelowMinimum {
        axis: &'static str,
        value: String,
        min: String,
    },

    #[error("Range {start}..={stop} step {step} has more values than can be counted")]
    TooManySteps {
        start: String,
        stop: String,
        step: String,
    },

    #[error("Sweep plan has more setpoints than can be counted")]
    TooManySetpoints,
}

/// Numeric domain an [`Axis`] can range over.
pub trait AxisValue: Copy + PartialOrd + fmt::Debug + fmt::Display {
    const ZERO: Self;

    /// Number of whole steps contained in `stop - start`, or `None` if that
    /// does not fit in a `usize`.
    fn whole_steps(start: Self, stop: Self, step: Self) -> Option<usize>;

    /// `start + k * step`.
    fn offset(start: Self, step: Self, k: usize) -> Self;

    /// Whether a lattice value lands on `stop`.
    fn lands_on(lattice: Self, stop: Self, step: Self) -> bool;
}

macro_rules! impl_integer_axis_value {
    ($($t:ty),*) => {
        $(
            impl AxisValue for $t {
                const ZERO: Self = 0;

                fn whole_steps(start: Self, stop: Self, step: Self) -> Option<usize> {
                    usize::try_from((i128::from(stop) - i128::from(start)) / i128::from(step)).ok()
                }

                fn offset(start: Self, step: Self, k: usize) -> Self {
                    (i128::from(start) + k as i128 * i128::from(step)) as $t
                }

                fn lands_on(lattice: Self, stop: Self, _step: Self) -> bool {
                    lattice == stop
                }
            }
        )*
    };
}

macro_rules! impl_float_axis_value {
    ($($t:ty),*) => {
        $(
            impl AxisValue for $t {
                const ZERO: Self = 0.0;

                fn whole_steps(start: Self, stop: Self, step: Self) -> Option<usize> {
                    let whole = ((stop - start) / step).floor();
                    // usize::MAX rounds up to 2^64 (or 2^32), so `<` keeps the cast exact
                    if whole.is_finite() && whole < usize::MAX as $t {
                        Some(whole as usize)
                    } else {
                        None
                    }
                }

                fn offset(start: Self, step: Self, k: usize) -> Self {
                    (k as $t).mul_add(step, start)
                }

                fn lands_on(lattice: Self, stop: Self, step: Self) -> bool {
                    (stop - lattice).abs() <= step * 1e-6
                }
            }
        )*
    };
}

impl_integer_axis_value!(u8, u16, u32, u64, i16, i32, i64);
impl_float_axis_value!(f32, f64);

/// One sweep dimension: an inclusive, stepped range of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis<T> {
    start: T,
    stop: T,
    step: T,
    len: usize,
}

impl<T: AxisValue> Axis<T> {
    pub fn new(start: T, stop: T, step: T) -> Result<Self, InvalidRangeError> {
        // Negated comparisons so NaN bounds are rejected too
        if !(step > T::ZERO) {
            return Err(InvalidRangeError::NonPositiveStep {
                step: step.to_string(),
            });
        }
        if !(stop >= start) {
            return Err(InvalidRangeError::Reversed {
                start: start.to_string(),
                stop: stop.to_string(),
            });
        }

        let too_many = || InvalidRangeError::TooManySteps {
            start: start.to_string(),
            stop: stop.to_string(),
            step: step.to_string(),
        };
        let whole = T::whole_steps(start, stop, step).ok_or_else(too_many)?;
        let last_on_lattice = T::offset(start, step, whole);
        let tail = if T::lands_on(last_on_lattice, stop, step) {
            1
        } else {
            2
        };
        let len = whole.checked_add(tail).ok_or_else(too_many)?;

        Ok(Self {
            start,
            stop,
            step,
            len,
        })
    }

    pub fn start(&self) -> T {
        self.start
    }

    pub fn stop(&self) -> T {
        self.stop
    }

    pub fn step(&self) -> T {
        self.step
    }

    /// Number of values [`Axis::produce`] yields. Never zero.
    pub fn length(&self) -> usize {
        self.len
    }

    /// The `k`-th value of the axis, or `None` past the end.
    pub fn get(&self, k: usize) -> Option<T> {
        if k >= self.len {
            None
        } else if k == self.len - 1 {
            Some(self.stop)
        } else {
            Some(T::offset(self.start, self.step, k))
        }
    }

    /// Iterate the axis from `start` to `stop`. Each call starts over.
    pub fn produce(&self) -> AxisIter<T> {
        AxisIter {
            axis: *self,
            front: 0,
        }
    }
}

impl<T: AxisValue> IntoIterator for &Axis<T> {
    type Item = T;
    type IntoIter = AxisIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.produce()
    }
}

impl<T: AxisValue> fmt::Display for Axis<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={} step {}", self.start, self.stop, self.step)
    }
}

#[derive(Debug, Clone)]
pub struct AxisIter<T> {
    axis: Axis<T>,
    front: usize,
}

impl<T: AxisValue> Iterator for AxisIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let value = self.axis.get(self.front)?;
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.axis.len.saturating_sub(self.front);
        (remaining, Some(remaining))
    }
}

impl<T: AxisValue> ExactSizeIterator for AxisIter<T> {}

impl<T: AxisValue> FusedIterator for AxisIter<T> {}
