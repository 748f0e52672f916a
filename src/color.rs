//! Color values and the per-mode color sequences a sweep walks.

use crate::axis::Axis;
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

/// Bit offsets of the red, green and blue channels in a packed 24-bit color.
pub const COLOR_BITSHIFTS: [u32; 3] = [16, 8, 0];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sweep mode '{0}', expected one of: individual, white, full")]
pub struct InvalidModeError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorTriple {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl ColorTriple {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// All three channels at the same value.
    pub const fn gray(value: u8) -> Self {
        Self::new(value, value, value)
    }

    pub fn from_packed(packed: u32) -> Self {
        let channel = |shift: u32| ((packed >> shift) & 0xFF) as u8;
        Self {
            red: channel(COLOR_BITSHIFTS[0]),
            green: channel(COLOR_BITSHIFTS[1]),
            blue: channel(COLOR_BITSHIFTS[2]),
        }
    }

    pub fn packed(self) -> u32 {
        (u32::from(self.red) << COLOR_BITSHIFTS[0])
            | (u32::from(self.green) << COLOR_BITSHIFTS[1])
            | (u32::from(self.blue) << COLOR_BITSHIFTS[2])
    }
}

impl fmt::Display for ColorTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:3},{:3},{:3})", self.red, self.green, self.blue)
    }
}

/// How the color channels are combined while sweeping the value axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepMode {
    /// Red, then green, then blue on their own, the other two held at 0.
    #[default]
    Individual,
    /// All three channels driven to the same value.
    White,
    /// Every red/green/blue combination, red outermost and blue innermost.
    Full,
}

impl SweepMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepMode::Individual => "individual",
            SweepMode::White => "white",
            SweepMode::Full => "full",
        }
    }
}

impl FromStr for SweepMode {
    type Err = InvalidModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(SweepMode::Individual),
            "white" => Ok(SweepMode::White),
            "full" => Ok(SweepMode::Full),
            _ => Err(InvalidModeError(s.to_string())),
        }
    }
}

impl fmt::Display for SweepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ordered set of colors visited for one brightness/voltage setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSequence {
    mode: SweepMode,
    values: Axis<u8>,
}

impl ColorSequence {
    pub fn new(mode: SweepMode, values: Axis<u8>) -> Self {
        Self { mode, values }
    }

    pub fn mode(&self) -> SweepMode {
        self.mode
    }

    pub fn values(&self) -> &Axis<u8> {
        &self.values
    }

    pub fn length(&self) -> usize {
        let n = self.values.length();
        match self.mode {
            SweepMode::Individual => COLOR_BITSHIFTS.len() * n,
            SweepMode::White => n,
            SweepMode::Full => n * n * n,
        }
    }

    /// The `i`-th color of the sequence, or `None` past the end.
    pub fn get(&self, i: usize) -> Option<ColorTriple> {
        if i >= self.length() {
            return None;
        }
        let n = self.values.length();
        match self.mode {
            SweepMode::Individual => {
                let shift = COLOR_BITSHIFTS[i / n];
                let value = self.values.get(i % n)?;
                Some(ColorTriple::from_packed(u32::from(value) << shift))
            }
            SweepMode::White => self.values.get(i).map(ColorTriple::gray),
            SweepMode::Full => Some(ColorTriple::new(
                self.values.get(i / (n * n))?,
                self.values.get((i / n) % n)?,
                self.values.get(i % n)?,
            )),
        }
    }

    pub fn produce(&self) -> ColorIter {
        ColorIter {
            sequence: *self,
            front: 0,
        }
    }
}

impl IntoIterator for &ColorSequence {
    type Item = ColorTriple;
    type IntoIter = ColorIter;

    fn into_iter(self) -> Self::IntoIter {
        self.produce()
    }
}

#[derive(Debug, Clone)]
pub struct ColorIter {
    sequence: ColorSequence,
    front: usize,
}

impl Iterator for ColorIter {
    type Item = ColorTriple;

    fn next(&mut self) -> Option<ColorTriple> {
        let color = self.sequence.get(self.front)?;
        self.front += 1;
        Some(color)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sequence.length().saturating_sub(self.front);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ColorIter {}

impl FusedIterator for ColorIter {}
