//! CSV output, one row per observation.
//!
//! The file optionally opens with `#` provenance comments and a blank line,
//! followed by the header row. Rows are flushed as they are written so an
//! interrupted sweep still leaves usable data behind.

use crate::measurement::Observation;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 6] = [
    "Brightness (31)",
    "Red (255)",
    "Green (255)",
    "Blue (255)",
    "Voltage (V)",
    "Current (mA)",
];

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Output file '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset output was lost to an earlier write failure")]
    OutputLost,
}

/// Receives the dataset as the sweep produces it.
pub trait ObservationSink {
    fn write_header(&mut self) -> Result<(), DatasetError>;

    fn write_observation(&mut self, observation: &Observation) -> Result<(), DatasetError>;
}

/// Where a dataset came from. Kept for the reader, never parsed back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    pub command: Option<String>,
    pub instrument: Option<String>,
    pub started: Option<DateTime<Local>>,
}

impl Provenance {
    pub fn is_empty(&self) -> bool {
        self.command.is_none() && self.instrument.is_none() && self.started.is_none()
    }

    fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        if let Some(command) = &self.command {
            writeln!(out, "# command: {}", command)?;
        }
        if let Some(instrument) = &self.instrument {
            writeln!(out, "# instrument: {}", instrument)?;
        }
        if let Some(started) = &self.started {
            writeln!(out, "# started: {}", started.to_rfc3339())?;
        }
        writeln!(out)
    }
}

pub struct DatasetWriter<W: Write> {
    pending: Option<W>,
    writer: Option<csv::Writer<W>>,
    provenance: Provenance,
}

impl DatasetWriter<File> {
    /// Create the output file. An existing file is only replaced when
    /// `overwrite` is set.
    pub fn create(path: impl AsRef<Path>, overwrite: bool) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = if overwrite {
            File::create(path)
        } else {
            OpenOptions::new().write(true).create_new(true).open(path)
        };
        let file = file.map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => DatasetError::AlreadyExists(path.to_path_buf()),
            _ => DatasetError::Io(e),
        })?;

        log::info!("Writing dataset to '{}'", path.display());
        Ok(Self::new(file))
    }
}

impl<W: Write> DatasetWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            pending: Some(out),
            writer: None,
            provenance: Provenance::default(),
        }
    }

    /// Set the comment block written above the header. Has no effect once
    /// the header is out.
    pub fn set_provenance(&mut self, provenance: Provenance) {
        self.provenance = provenance;
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W, DatasetError> {
        match (self.writer, self.pending) {
            (Some(writer), _) => writer
                .into_inner()
                .map_err(|e| DatasetError::Io(e.into_error())),
            (None, Some(out)) => Ok(out),
            (None, None) => Err(DatasetError::OutputLost),
        }
    }
}

impl<W: Write> ObservationSink for DatasetWriter<W> {
    /// Does nothing once the header is out. After a failed header write the
    /// output is gone and every later call fails with `OutputLost`.
    fn write_header(&mut self) -> Result<(), DatasetError> {
        if self.writer.is_some() {
            return Ok(());
        }
        let Some(mut out) = self.pending.take() else {
            return Err(DatasetError::OutputLost);
        };
        self.provenance.write_to(&mut out)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer.write_record(HEADER)?;
        writer.flush()?;
        self.writer = Some(writer);
        Ok(())
    }

    fn write_observation(&mut self, observation: &Observation) -> Result<(), DatasetError> {
        self.write_header()?;
        let writer = self.writer.as_mut().ok_or(DatasetError::OutputLost)?;
        writer.serialize((
            observation.brightness,
            observation.red,
            observation.green,
            observation.blue,
            observation.voltage,
            observation.current_ma,
        ))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation() -> Observation {
        Observation {
            brightness: 31,
            red: 255,
            green: 0,
            blue: 0,
            voltage: 5.0,
            current_ma: 12.5,
        }
    }

    #[test]
    fn test_header_and_rows() {
        let mut dataset = DatasetWriter::new(Vec::new());
        dataset.write_header().unwrap();
        dataset.write_observation(&observation()).unwrap();

        let text = String::from_utf8(dataset.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "Brightness (31),Red (255),Green (255),Blue (255),Voltage (V),Current (mA)\n\
             31,255,0,0,5.0,12.5\n"
        );
    }

    #[test]
    fn test_provenance_block() {
        let mut dataset = DatasetWriter::new(Vec::new());
        dataset.set_provenance(Provenance {
            command: Some("ledbench out.csv --mode white".to_string()),
            instrument: Some("KORAD KA3005P V5.8".to_string()),
            started: None,
        });
        dataset.write_header().unwrap();

        let text = String::from_utf8(dataset.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# command: ledbench out.csv --mode white");
        assert_eq!(lines[1], "# instrument: KORAD KA3005P V5.8");
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with("Brightness (31),"));
    }

    /// Fails the first write, accepts everything after.
    #[derive(Default)]
    struct FlakyOutput {
        failed: bool,
        written: Vec<u8>,
    }

    impl Write for FlakyOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.failed {
                self.failed = true;
                return Err(io::Error::other("disk full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_header_failure_is_not_swallowed() {
        let mut dataset = DatasetWriter::new(FlakyOutput::default());
        assert!(dataset.write_header().is_err());

        assert!(matches!(
            dataset.write_observation(&observation()),
            Err(DatasetError::OutputLost)
        ));
        assert!(matches!(dataset.write_header(), Err(DatasetError::OutputLost)));
        assert!(matches!(dataset.into_inner(), Err(DatasetError::OutputLost)));
    }

    #[test]
    fn test_header_written_once() {
        let mut dataset = DatasetWriter::new(Vec::new());
        dataset.write_header().unwrap();
        dataset.write_header().unwrap();
        dataset.write_observation(&observation()).unwrap();

        let text = String::from_utf8(dataset.into_inner().unwrap()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv");
        std::fs::write(&path, "keep me").unwrap();

        assert!(matches!(
            DatasetWriter::create(&path, false),
            Err(DatasetError::AlreadyExists(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");

        let mut dataset = DatasetWriter::create(&path, true).unwrap();
        dataset.write_header().unwrap();
        drop(dataset);
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("Brightness (31)"));
    }

    #[test]
    fn test_rows_reach_disk_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.csv");

        let mut dataset = DatasetWriter::create(&path, false).unwrap();
        dataset.write_header().unwrap();
        dataset.write_observation(&observation()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        drop(dataset);
    }
}
