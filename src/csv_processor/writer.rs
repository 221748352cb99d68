use crate::utils::Result;
use csv::Writer;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Status reported for one monitored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub key: String,
    pub status: String,
}

impl OutcomeRecord {
    pub fn new(key: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: status.into(),
        }
    }
}

/// Append-only `key,status` log of processed monitored objects. The file
/// is truncated on creation and the buffer is flushed when dropped.
pub struct OutcomeLog {
    path: PathBuf,
    writer: Writer<File>,
    records_written: usize,
}

impl OutcomeLog {
    pub const HEADERS: [&'static str; 2] = ["key", "status"];

    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let mut writer = Writer::from_writer(file);
        writer.write_record(Self::HEADERS)?;
        writer.flush()?;

        Ok(Self {
            path,
            writer,
            records_written: 0,
        })
    }

    pub fn record(&mut self, outcome: &OutcomeRecord) -> Result<()> {
        self.writer
            .write_record([outcome.key.as_str(), outcome.status.as_str()])?;
        self.records_written += 1;
        Ok(())
    }

    pub fn record_all(&mut self, outcomes: &[OutcomeRecord]) -> Result<()> {
        for outcome in outcomes {
            self.record(outcome)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.flush()?;
        Ok(self.records_written)
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
