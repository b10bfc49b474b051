use crate::crawler::ExtractedRecord;
use crate::output::traits::{RecordSink, SinkError, SinkResult};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Append-only CSV file sink
///
/// The header row is written when the file is opened. Every record is
/// flushed and synced to disk before `write` returns.
pub struct CsvRecordSink {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    rows: u64,
}

impl CsvRecordSink {
    /// Creates a new file and writes the header row
    ///
    /// Fails if the file already exists, so a previous run's output is never
    /// overwritten.
    pub fn open(path: &Path) -> SinkResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(ExtractedRecord::FIELDS)?;

        let mut sink = Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            rows: 0,
        };
        sink.persist()?;

        tracing::debug!("Opened output file {}", path.display());
        Ok(sink)
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Pushes buffered rows through to the disk
    fn persist(&mut self) -> SinkResult<()> {
        let writer = self.writer.as_mut().ok_or_else(|| SinkError::Closed {
            path: self.path.clone(),
        })?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }
}

impl RecordSink for CsvRecordSink {
    fn write(&mut self, record: &ExtractedRecord) -> SinkResult<()> {
        let writer = self.writer.as_mut().ok_or_else(|| SinkError::Closed {
            path: self.path.clone(),
        })?;
        writer.serialize(record)?;
        self.persist()?;
        self.rows += 1;
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
            tracing::debug!(
                "Closed output file {} with {} rows",
                self.path.display(),
                self.rows
            );
        }
        Ok(())
    }

    fn rows_written(&self) -> u64 {
        self.rows
    }
}

impl Drop for CsvRecordSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close {}: {}", self.path.display(), e);
        }
    }
}
