//! Side-channel outputs written after a run: solar phase log and the
//! seasonal series.
//!
//! Failures here never abort a simulation; the engine logs and moves on.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Destination for named diagnostic artifacts.
pub trait DiagnosticsSink {
    /// Stores a free-form text artifact.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the artifact cannot be written.
    fn write_text(&mut self, name: &str, text: &str) -> io::Result<()>;

    /// Stores a numeric series as `hour;value` rows.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the artifact cannot be written.
    fn write_series(&mut self, name: &str, values: &[f64]) -> io::Result<()>;
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn write_text(&mut self, _name: &str, _text: &str) -> io::Result<()> {
        Ok(())
    }

    fn write_series(&mut self, _name: &str, _values: &[f64]) -> io::Result<()> {
        Ok(())
    }
}

/// Writes each artifact as a file under one directory.
#[derive(Debug, Clone)]
pub struct LogDirSink {
    dir: PathBuf,
}

impl LogDirSink {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn create(&self, name: &str) -> io::Result<BufWriter<File>> {
        fs::create_dir_all(&self.dir)?;
        Ok(BufWriter::new(File::create(self.dir.join(name))?))
    }
}

impl DiagnosticsSink for LogDirSink {
    fn write_text(&mut self, name: &str, text: &str) -> io::Result<()> {
        let mut out = self.create(name)?;
        out.write_all(text.as_bytes())?;
        if !text.is_empty() && !text.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.flush()
    }

    fn write_series(&mut self, name: &str, values: &[f64]) -> io::Result<()> {
        write_series_csv(values, self.create(name)?)
    }
}

/// Writes `values` as headerless `hour;value` rows.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_series_csv(values: &[f64], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(writer);
    for (hour, value) in values.iter().enumerate() {
        wtr.write_record(&[hour.to_string(), format!("{value:.4}")])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_rows_are_hour_value_pairs() {
        let mut buf = Vec::new();
        write_series_csv(&[0.5, 1.25], &mut buf).expect("series export should succeed");
        let text = String::from_utf8(buf).expect("output should be valid UTF-8");
        assert_eq!(text, "0;0.5000\n1;1.2500\n");
    }

    #[test]
    fn log_dir_sink_creates_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sink = LogDirSink::new(dir.path().join("logs"));
        sink.write_text("solar.log", "a\nb").expect("text write");
        sink.write_series("levels.csv", &[1.0, 2.0, 3.0])
            .expect("series write");

        let log = fs::read_to_string(sink.dir().join("solar.log")).expect("read log");
        assert_eq!(log, "a\nb\n");
        let series = fs::read_to_string(sink.dir().join("levels.csv")).expect("read series");
        assert_eq!(series.lines().count(), 3);
    }

    #[test]
    fn log_dir_sink_reports_unwritable_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").expect("write blocker");
        let mut sink = LogDirSink::new(blocker.join("sub"));
        assert!(sink.write_text("x.log", "y").is_err());
    }
}
