use crate::csv_processor::entry::MetadataRecord;
use std::num::NonZeroUsize;

/// A run of consecutive records sent in one bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T = MetadataRecord> {
    /// 1-based position of the batch within the input.
    pub index: usize,
    pub records: Vec<T>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    batch_size: NonZeroUsize,
}

impl Batcher {
    pub fn new(batch_size: NonZeroUsize) -> Self {
        Self { batch_size }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Every batch holds exactly `batch_size` records except possibly the last.
    pub fn batches<I: IntoIterator>(&self, rows: I) -> Batches<I::IntoIter> {
        Batches {
            rows: rows.into_iter(),
            batch_size: self.batch_size.get(),
            rows_seen: 0,
        }
    }
}

pub struct Batches<I> {
    rows: I,
    batch_size: usize,
    rows_seen: usize,
}

impl<I> Batches<I> {
    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Batch<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let records: Vec<I::Item> = self.rows.by_ref().take(self.batch_size).collect();
        if records.is_empty() {
            return None;
        }

        self.rows_seen += records.len();

        Some(Batch {
            index: self.rows_seen.div_ceil(self.batch_size),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batcher(size: usize) -> Batcher {
        Batcher::new(NonZeroUsize::new(size).unwrap())
    }

    #[test]
    fn seven_rows_in_batches_of_three() {
        let batches: Vec<Batch<usize>> = batcher(3).batches(1..=7).collect();

        let shape: Vec<(usize, usize)> = batches.iter().map(|b| (b.index, b.len())).collect();
        assert_eq!(shape, vec![(1, 3), (2, 3), (3, 1)]);
        assert_eq!(batches[2].records, vec![7]);
    }

    #[test]
    fn partitions_input_without_reordering() {
        for total in 0..25usize {
            for size in 1..8usize {
                let rows: Vec<usize> = (0..total).collect();
                let batches: Vec<Batch<usize>> = batcher(size).batches(rows.clone()).collect();

                assert_eq!(batches.len(), total.div_ceil(size), "n={} b={}", total, size);

                for (i, batch) in batches.iter().enumerate() {
                    assert_eq!(batch.index, i + 1);
                    if i + 1 < batches.len() {
                        assert_eq!(batch.len(), size);
                    }
                }

                if let Some(last) = batches.last() {
                    let expected = if total % size == 0 { size } else { total % size };
                    assert_eq!(last.len(), expected);
                }

                let rejoined: Vec<usize> = batches.into_iter().flat_map(|b| b.records).collect();
                assert_eq!(rejoined, rows);
            }
        }
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let mut batches = batcher(4).batches(Vec::<usize>::new());
        assert!(batches.next().is_none());
        assert_eq!(batches.rows_seen(), 0);
    }

    #[test]
    fn pulls_rows_lazily() {
        let mut pulled = 0;
        let rows = std::iter::from_fn(|| {
            pulled += 1;
            Some(pulled)
        });

        let mut batches = batcher(2).batches(rows);
        let first = batches.next().unwrap();
        assert_eq!(first.records, vec![1, 2]);
        assert_eq!(batches.rows_seen(), 2);
    }
}
