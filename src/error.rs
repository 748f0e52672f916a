//! Crate-level error types.

use crate::axis::InvalidRangeError;
use crate::color::InvalidModeError;
use crate::dataset::DatasetError;
use crate::device::DeviceError;
use crate::instrument::InstrumentError;

/// Anything that can stop a sweep, from plan validation to hardware I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid range: {0}")]
    InvalidRange(#[from] InvalidRangeError),

    #[error(transparent)]
    InvalidMode(#[from] InvalidModeError),

    #[error("Power supply error: {0}")]
    Instrument(#[from] InstrumentError),

    #[error("LED strip error: {0}")]
    Device(#[from] DeviceError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

/// Crate-level result type.
pub type Result<T> = std::result::Result<T, Error>;
