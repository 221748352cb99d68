use crate::utils::Result;
use csv::StringRecord;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Lazily streams rows from a metadata CSV. The header row is consumed on
/// open; rows are read one at a time as the iterator is driven.
pub struct CsvStreamReader {
    path: PathBuf,
    headers: StringRecord,
    reader: csv::Reader<File>,
}

impl CsvStreamReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        // Field counts are checked per row by the entry builder.
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .flexible(true)
            .from_reader(file);
        let headers = reader.headers()?.clone();

        Ok(Self {
            path,
            headers,
            reader,
        })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_records(self) -> CsvRecordIterator {
        CsvRecordIterator {
            records: self.reader.into_records(),
        }
    }
}

pub struct CsvRecordIterator {
    records: csv::StringRecordsIntoIter<File>,
}

impl Iterator for CsvRecordIterator {
    /// The line number of the row within the file, alongside the row itself.
    type Item = std::result::Result<(u64, StringRecord), csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|result| {
            result.map(|record| {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                (line, record)
            })
        })
    }
}
