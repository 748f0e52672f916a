//! APA102 ("DotStar") strips driven through a Linux spidev node.
//!
//! A frame on the wire is a 32-bit zero start frame, one 32-bit word per
//! pixel (`0b111` + 5-bit global brightness, then the three color bytes), and
//! a run of zero bytes long enough to clock the last pixel's data through
//! every pixel in the chain.

use crate::color::ColorTriple;
use crate::device::{DeviceError, LedStrip, MAX_GLOBAL_BRIGHTNESS};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Largest single write spidev accepts with its default `bufsiz`.
const SPIDEV_MAX_TRANSFER: usize = 4096;
const START_FRAME: [u8; 4] = [0x00; 4];
const PIXEL_HEADER: u8 = 0b1110_0000;

/// Order in which the strip expects its color bytes.
///
/// Naming follows the common Python driver convention, where `Rgb` puts
/// blue first on the wire (the chip's native order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RgbOrder {
    #[default]
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl RgbOrder {
    /// Byte offsets of red, green and blue within a pixel word.
    fn offsets(self) -> [usize; 3] {
        match self {
            RgbOrder::Rgb => [3, 2, 1],
            RgbOrder::Rbg => [3, 1, 2],
            RgbOrder::Grb => [2, 3, 1],
            RgbOrder::Gbr => [2, 1, 3],
            RgbOrder::Brg => [1, 3, 2],
            RgbOrder::Bgr => [1, 2, 3],
        }
    }
}

impl FromStr for RgbOrder {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb" => Ok(RgbOrder::Rgb),
            "rbg" => Ok(RgbOrder::Rbg),
            "grb" => Ok(RgbOrder::Grb),
            "gbr" => Ok(RgbOrder::Gbr),
            "brg" => Ok(RgbOrder::Brg),
            "bgr" => Ok(RgbOrder::Bgr),
            _ => Err(DeviceError::UnknownRgbOrder(s.to_string())),
        }
    }
}

pub struct Apa102Strip<W> {
    out: W,
    order: RgbOrder,
    pixels: Vec<ColorTriple>,
    brightness: u8,
    released: bool,
}

impl Apa102Strip<File> {
    /// Open a spidev node such as `/dev/spidev0.0`.
    pub fn open(
        path: impl AsRef<Path>,
        pixel_count: usize,
        order: RgbOrder,
    ) -> Result<Self, DeviceError> {
        let path = path.as_ref();
        log::debug!("Opening LED strip on {}", path.display());
        let out = OpenOptions::new().write(true).open(path)?;
        Ok(Self::new(out, pixel_count, order))
    }
}

impl<W: Write> Apa102Strip<W> {
    pub fn new(out: W, pixel_count: usize, order: RgbOrder) -> Self {
        Self {
            out,
            order,
            pixels: vec![ColorTriple::BLACK; pixel_count],
            brightness: 0,
            released: false,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn end_frame_len(&self) -> usize {
        self.pixels.len().div_ceil(16).max(4)
    }

    fn encode_frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(8 + 4 * self.pixels.len() + self.end_frame_len());
        frame.extend_from_slice(&START_FRAME);

        let [red, green, blue] = self.order.offsets();
        for pixel in &self.pixels {
            let mut word = [PIXEL_HEADER | self.brightness, 0, 0, 0];
            word[red] = pixel.red;
            word[green] = pixel.green;
            word[blue] = pixel.blue;
            frame.extend_from_slice(&word);
        }

        frame.resize(frame.len() + self.end_frame_len(), 0x00);
        frame
    }

    fn ensure_open(&self) -> Result<(), DeviceError> {
        if self.released {
            Err(DeviceError::Released)
        } else {
            Ok(())
        }
    }
}

impl<W: Write> LedStrip for Apa102Strip<W> {
    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn set_global_brightness(&mut self, level: u8) -> Result<(), DeviceError> {
        self.ensure_open()?;
        if level > MAX_GLOBAL_BRIGHTNESS {
            return Err(DeviceError::BrightnessOutOfRange(level));
        }
        self.brightness = level;
        Ok(())
    }

    fn set_pixel(&mut self, index: usize, color: ColorTriple) -> Result<(), DeviceError> {
        self.ensure_open()?;
        let count = self.pixels.len();
        let pixel = self
            .pixels
            .get_mut(index)
            .ok_or(DeviceError::PixelOutOfRange { index, count })?;
        *pixel = color;
        Ok(())
    }

    fn push_frame(&mut self) -> Result<(), DeviceError> {
        self.ensure_open()?;
        let frame = self.encode_frame();
        for chunk in frame.chunks(SPIDEV_MAX_TRANSFER) {
            self.out.write_all(chunk)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn blank(&mut self) -> Result<(), DeviceError> {
        self.ensure_open()?;
        self.pixels.fill(ColorTriple::BLACK);
        self.brightness = 0;
        self.push_frame()
    }

    fn release(&mut self) -> Result<(), DeviceError> {
        self.ensure_open()?;
        self.out.flush()?;
        self.released = true;
        log::debug!("LED strip released");
        Ok(())
    }
}
