//! Plain-text run transcript
//!
//! One header line followed by one whitespace-separated line per step:
//!
//! ```text
//! time rainfall infiltrationRate subsurfFlow drainage soilMoist overlandFlow
//! 0 20 20.5 0.000000043298321617172016 0.0000004949020807060583 20.333333324363327 0
//! ```

use super::output::{OutputError, StepRecord, StepSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column names written as the first line of every transcript
pub const TRANSCRIPT_HEADER: &str =
    "time rainfall infiltrationRate subsurfFlow drainage soilMoist overlandFlow";

/// Step sink writing the line-oriented transcript format
pub struct TranscriptWriter<W: Write> {
    writer: W,
}

impl TranscriptWriter<BufWriter<File>> {
    /// Create (or truncate) a transcript file and write its header
    ///
    /// # Errors
    /// Returns [`OutputError::Io`] if the file cannot be created or written.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, OutputError> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> TranscriptWriter<W> {
    /// Wrap a writer and emit the header line
    ///
    /// # Errors
    /// Returns [`OutputError::Io`] if the header cannot be written.
    pub fn new(mut writer: W) -> Result<Self, OutputError> {
        writeln!(writer, "{TRANSCRIPT_HEADER}")?;
        Ok(Self { writer })
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StepSink for TranscriptWriter<W> {
    fn record(&mut self, record: &StepRecord) -> Result<(), OutputError> {
        let r = &record.result;
        writeln!(
            self.writer,
            "{} {} {} {} {} {} {}",
            record.step,
            record.rainfall,
            r.infiltration_rate,
            r.subsurface_flow,
            r.drainage,
            r.soil_moisture,
            r.overland_flow
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}
