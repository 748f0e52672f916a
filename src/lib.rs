//! # LedBench RS
//!
//! A Rust library for characterizing addressable LED strips on a bench rig.
//!
//! The rig steps a strip through color, intensity, global brightness and
//! (optionally) supply voltage, waits for the current draw to settle at every
//! setpoint, reads voltage and current back from a programmable power supply
//! and records one CSV row per setpoint.
//!
//! ## Features
//!
//! - **Sweep plans**: inclusive, drift-free axes composed into a deterministic
//!   voltage → brightness → color traversal
//! - **Three color modes**: isolated channels, white balance, or the full cube
//! - **Hardware drivers**: Korad/Tenma supplies over `serialport`, APA102
//!   strips over Linux spidev
//! - **Headless core**: the runner is an iterator of step reports; rendering
//!   and persistence plug in through small traits
//! - **Safe shutdown**: the strip is blanked and released however a sweep ends
//!
//! ## Examples
//!
//! ### Building a Plan
//!
//! ```rust
//! use ledbench_rs::{Axis, ColorSequence, SweepMode, SweepPlan};
//!
//! let colors = ColorSequence::new(SweepMode::Individual, Axis::new(0, 255, 255)?);
//! let plan = SweepPlan::new(None, Axis::new(0, 31, 31)?, colors)?;
//!
//! assert_eq!(plan.total_count(), 2 * 6);
//! for setpoint in plan.produce().take(3) {
//!     println!("{} @ {}", setpoint.color, setpoint.brightness);
//! }
//! # Ok::<(), ledbench_rs::Error>(())
//! ```
//!
//! ### Running a Sweep
//!
//! ```rust,no_run
//! use ledbench_rs::{Apa102Strip, DatasetWriter, KoradSupply, SweepConfig, SweepRunner};
//!
//! let config = SweepConfig::default();
//! let plan = config.plan()?;
//!
//! let mut dataset = DatasetWriter::create(&config.output, config.overwrite)?;
//! let mut supply = KoradSupply::open(&config.psu_port)?;
//! let mut strip = Apa102Strip::open(&config.strip_device, config.pixel_count, config.rgb_order()?)?;
//!
//! let runner = SweepRunner::new(&plan, config.measurement_step(), &mut supply, &mut strip);
//! let summary = runner.run(&mut dataset, &mut ())?;
//! println!("Measured {} setpoints", summary.steps);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Driving the Sweep Step by Step
//!
//! ```rust,no_run
//! use ledbench_rs::{SweepConfig, SweepRunner, Apa102Strip, KoradSupply};
//! use ledbench_rs::progress::Eta;
//!
//! let config = SweepConfig::default();
//! let plan = config.plan()?;
//! let mut supply = KoradSupply::open(&config.psu_port)?;
//! let mut strip = Apa102Strip::open(&config.strip_device, config.pixel_count, config.rgb_order()?)?;
//!
//! for report in SweepRunner::new(&plan, config.measurement_step(), &mut supply, &mut strip) {
//!     let report = report?;
//!     let eta = report.eta.map(Eta).map(|e| e.to_string()).unwrap_or_default();
//!     println!("{:6.2}% {} mA, {} left", report.percent_complete, report.observation.current_ma, eta);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod apa102;
pub mod axis;
pub mod color;
pub mod config;
pub mod dataset;
pub mod device;
pub mod error;
pub mod instrument;
pub mod korad;
pub mod measurement;
pub mod plan;
pub mod progress;
pub mod runner;

#[cfg(test)]
mod mock;

// Re-export the main types for convenience
pub use axis::{Axis, AxisValue, InvalidRangeError};

pub use color::{ColorSequence, ColorTriple, InvalidModeError, SweepMode};

pub use plan::{Setpoint, SweepPlan};

pub use device::{DeviceError, LedStrip};

pub use instrument::{InstrumentError, PowerSupply};

pub use apa102::{Apa102Strip, RgbOrder};

pub use korad::KoradSupply;

pub use measurement::{MeasurementStep, Observation};

pub use progress::ProgressTracker;

pub use dataset::{DatasetError, DatasetWriter, ObservationSink, Provenance};

pub use runner::{ProgressDisplay, StepReport, SweepRunner, SweepSummary};

pub use config::{RangeConfig, SweepConfig};

pub use error::{Error, Result};
