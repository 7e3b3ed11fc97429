use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::core::RawRow;
use crate::error::{ChartError, ChartResult};

/// Rows decoded from one CSV document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRows {
    pub rows: Vec<RawRow>,
    /// Records the CSV reader could not decode.
    pub skipped: usize,
}

/// Parses a comma-separated document with a required header row.
///
/// Headers are trimmed, values are kept verbatim. Records shorter than the
/// header simply lack the trailing columns; longer ones lose the extras.
pub fn parse_csv_rows(content: &str) -> ChartResult<ParsedRows> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ChartError::InvalidData(format!("failed to read csv header: {e}")))?
        .clone();
    if headers.iter().all(str::is_empty) {
        return Err(ChartError::InvalidData("csv header row is missing".to_owned()));
    }

    let mut parsed = ParsedRows::default();
    for (index, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                parsed.rows.push(RawRow::from_pairs(
                    headers.iter().zip(record.iter()),
                ));
            }
            Err(err) => {
                debug!(line = index + 2, error = %err, "skipping undecodable csv record");
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}
