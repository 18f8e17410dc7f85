//! Bounded batching of bet records read from an agency file
//!
//! Input lines look like `first,last,document,birthdate,number`. Lines that
//! do not parse are skipped with a warning and never take a batch slot.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::common::errors::{ClientError, Result};
use crate::common::types::{WagerBatch, WagerRecord};

/// Field separator of the input file
pub const FIELD_SEPARATOR: char = ',';

/// Fields expected per input line
pub const FIELDS_PER_LINE: usize = 5;

/// Parse one input line into a record for `agency_id`
pub fn parse_line(agency_id: u32, line: &str) -> Result<WagerRecord> {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

    let [first_name, last_name, document, birthdate, number] = fields.as_slice() else {
        return Err(ClientError::MalformedRecord(format!(
            "expected {FIELDS_PER_LINE} fields, got {}",
            fields.len()
        )));
    };

    let number = number
        .trim()
        .parse::<u32>()
        .map_err(|_| ClientError::MalformedRecord(format!("number {number:?} is not numeric")))?;

    WagerRecord::new(agency_id, first_name, last_name, document, birthdate, number)
}

/// Produces batches of at most `max_batch_amount` records
pub struct BatchSource<R> {
    /// `None` once closed
    reader: Option<R>,
    agency_id: u32,
    max_batch_amount: usize,
    line_number: u64,
    skipped: u64,
}

impl BatchSource<BufReader<File>> {
    /// Open the bet file at `path`
    pub async fn open(
        path: impl AsRef<Path>,
        agency_id: u32,
        max_batch_amount: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|e| {
            ClientError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        debug!("Opened bet file {}", path.display());
        Ok(Self::new(BufReader::new(file), agency_id, max_batch_amount))
    }
}

impl<R> BatchSource<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Wrap a line-oriented reader
    pub fn new(reader: R, agency_id: u32, max_batch_amount: usize) -> Self {
        Self {
            reader: Some(reader),
            agency_id,
            max_batch_amount: max_batch_amount.max(1),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Lines skipped so far because they did not parse
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Check whether the input is still held
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Read the next batch.
    ///
    /// Returns the records plus whether more input may follow. Once the
    /// input is exhausted the flag is `false` and the batch holds whatever
    /// was collected, possibly nothing.
    pub async fn next_batch(&mut self) -> Result<(WagerBatch, bool)> {
        let mut batch = WagerBatch::with_capacity(self.max_batch_amount);
        let Some(reader) = self.reader.as_mut() else {
            return Ok((batch, false));
        };

        let mut buf = Vec::new();
        while batch.len() < self.max_batch_amount {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok((batch, false));
            }
            self.line_number += 1;

            let line = String::from_utf8_lossy(&buf);
            match parse_line(self.agency_id, &line) {
                Ok(record) => batch.push(record),
                Err(e) => {
                    self.skipped += 1;
                    warn!(
                        action = "read_bet",
                        result = "fail",
                        line = self.line_number,
                        error = %e,
                        "Skipping malformed bet line"
                    );
                }
            }
        }

        Ok((batch, true))
    }

    /// Release the input. Later calls do nothing.
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("Closed bet input after {} lines", self.line_number);
        }
    }
}
