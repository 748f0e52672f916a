//! The LED strip under test.

use crate::color::ColorTriple;

/// Global brightness is a 5-bit field.
pub const MAX_GLOBAL_BRIGHTNESS: u8 = 31;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pixel {index} out of range for a strip of {count} pixels")]
    PixelOutOfRange { index: usize, count: usize },

    #[error("Global brightness {0} does not fit in 5 bits")]
    BrightnessOutOfRange(u8),

    #[error("LED strip has already been released")]
    Released,

    #[error("Unknown color order '{0}', expected a permutation of 'rgb'")]
    UnknownRgbOrder(String),
}

/// Capabilities the sweep needs from an addressable strip.
///
/// Color and brightness changes are staged until [`LedStrip::push_frame`].
pub trait LedStrip {
    /// Number of pixels on the strip, fixed at construction.
    fn pixel_count(&self) -> usize;

    fn set_global_brightness(&mut self, level: u8) -> Result<(), DeviceError>;

    fn set_pixel(&mut self, index: usize, color: ColorTriple) -> Result<(), DeviceError>;

    /// Latch the staged colors and brightness onto the strip.
    fn push_frame(&mut self) -> Result<(), DeviceError>;

    /// Turn every pixel off and push the frame.
    fn blank(&mut self) -> Result<(), DeviceError>;

    /// Hand the strip back. No further commands are accepted.
    fn release(&mut self) -> Result<(), DeviceError>;

    /// Stage the same color on every pixel.
    fn fill(&mut self, color: ColorTriple) -> Result<(), DeviceError> {
        for index in 0..self.pixel_count() {
            self.set_pixel(index, color)?;
        }
        Ok(())
    }
}
