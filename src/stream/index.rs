//! Random access into the event file by distinct timestamp.
//!
//! One streaming pass over `deltas.csv` records, for each distinct
//! timestamp, the byte offset of its first row. Afterwards any tick's
//! deltas can be read by seeking straight to that offset and parsing
//! rows until the timestamp changes; no other state is kept between
//! calls, so the index costs two parallel arrays regardless of file
//! size. The file is re-opened per read, which keeps the index usable
//! from serial callers that assume their own file handle.
//!
//! The index relies on the writer's guarantee that rows are sorted by
//! `(timestamp, sequence_num)`, i.e. equal timestamps are contiguous.

use super::delta::{DELTA_COLUMNS, Delta, DeltaRow};
use super::error::StreamError;
use super::reader::require_columns;
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Timestamp-to-offset index over one event file.
#[derive(Debug, Clone)]
pub struct ReplayIndex {
    path: PathBuf,
    headers: StringRecord,
    /// k-th distinct timestamp, ascending by construction.
    timestamps: Vec<u64>,
    /// Byte offset of the first row carrying `timestamps[k]`.
    offsets: Vec<u64>,
    /// Byte offset of the first data row (end of the header line).
    data_start: u64,
}

impl ReplayIndex {
    /// Build the index in one pass over the event file.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, the header lacks a required
    /// column, or any row's timestamp fails to parse.
    pub fn build(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StreamError::MissingInput {
                path: path.to_path_buf(),
            });
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        require_columns(&headers, &DELTA_COLUMNS, path)?;
        let ts_column = headers
            .iter()
            .position(|h| h == "timestamp")
            .unwrap_or_default();
        let data_start = reader.position().byte();

        let mut timestamps: Vec<u64> = Vec::new();
        let mut offsets: Vec<u64> = Vec::new();
        let mut record = StringRecord::new();
        let mut row_start = data_start;
        while reader.read_record(&mut record)? {
            let ts: u64 = record
                .get(ts_column)
                .unwrap_or_default()
                .parse()
                .map_err(|_| {
                    StreamError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("unparsable timestamp at byte {row_start}"),
                    ))
                })?;
            if timestamps.last() != Some(&ts) {
                timestamps.push(ts);
                offsets.push(row_start);
            }
            row_start = reader.position().byte();
        }

        debug!(
            target: "bookreplay::stream",
            path = %path.display(),
            ticks = timestamps.len(),
            "built replay index"
        );
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            timestamps,
            offsets,
            data_start,
        })
    }

    /// Number of distinct timestamps in the file.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True when the file holds no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The distinct timestamps, ascending.
    #[must_use]
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    /// The k-th distinct timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::IndexOutOfBounds`] when `k >= len()`.
    pub fn timestamp_at(&self, k: usize) -> Result<u64, StreamError> {
        self.timestamps
            .get(k)
            .copied()
            .ok_or(StreamError::IndexOutOfBounds {
                index: k,
                len: self.timestamps.len(),
            })
    }

    fn reader_at(&self, offset: u64) -> Result<csv::Reader<BufReader<File>>, StreamError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        Ok(ReaderBuilder::new()
            .has_headers(false)
            .from_reader(BufReader::new(file)))
    }

    fn read_while(
        &self,
        offset: u64,
        mut keep: impl FnMut(u64) -> bool,
    ) -> Result<Vec<Delta>, StreamError> {
        let mut reader = self.reader_at(offset)?;
        let mut deltas = Vec::new();
        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            let row: DeltaRow = record.deserialize(Some(&self.headers))?;
            if !keep(row.timestamp) {
                break;
            }
            deltas.push(row.into());
        }
        Ok(deltas)
    }

    /// All deltas whose timestamp equals the k-th distinct timestamp.
    ///
    /// Seeks straight to the tick's first row and stops at the first row
    /// of a different timestamp, so the cost is proportional to the
    /// tick's own row count.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::IndexOutOfBounds`] when `k >= len()`, or an
    /// I/O / parse error from re-reading the file.
    pub fn read_at(&self, k: usize) -> Result<Vec<Delta>, StreamError> {
        let target = self.timestamp_at(k)?;
        self.read_while(self.offsets[k], |ts| ts == target)
    }

    /// All deltas from the start of the file through the end of the k-th
    /// distinct timestamp, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::IndexOutOfBounds`] when `k >= len()`, or an
    /// I/O / parse error from re-reading the file.
    pub fn read_up_to(&self, k: usize) -> Result<Vec<Delta>, StreamError> {
        let target = self.timestamp_at(k)?;
        self.read_while(self.data_start, |ts| ts <= target)
    }

    /// Index of the distinct timestamp closest to `ts`.
    ///
    /// Exact matches win; otherwise the closest timestamp by absolute
    /// difference is chosen, and an equidistant tie resolves to the lower
    /// index. Returns `None` only for an empty index.
    #[must_use]
    pub fn find_index(&self, ts: u64) -> Option<usize> {
        if self.timestamps.is_empty() {
            return None;
        }
        let after = self.timestamps.partition_point(|&t| t < ts);
        if after == 0 {
            return Some(0);
        }
        if after == self.timestamps.len() {
            return Some(after - 1);
        }
        let below = ts - self.timestamps[after - 1];
        let above = self.timestamps[after] - ts;
        if below <= above {
            Some(after - 1)
        } else {
            Some(after)
        }
    }
}
