pub mod batcher;
pub mod entry;
pub mod reader;
pub mod writer;

pub use batcher::{Batch, Batcher, Batches};
pub use entry::{EntryBuilder, MetadataRecord};
pub use reader::{CsvRecordIterator, CsvStreamReader};
pub use writer::{OutcomeLog, OutcomeRecord};
