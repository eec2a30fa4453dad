//! CSV manifest parsing
//!
//! Columns are located by header name; extra columns are ignored. Every
//! conversion failure aborts the whole upload.

use super::record::ShipmentRow;
use crate::error::{IngestError, IngestResult};
use csv::{ReaderBuilder, StringRecord, Trim};

pub const TRAILER_ID: &str = "TrailerID";
pub const SID: &str = "SID";
pub const CISCO_ID: &str = "CiscoID";
pub const PART_NUMBER: &str = "PartNumber";
pub const QUANTITY: &str = "Quantity";

/// Columns every manifest must carry
pub const REQUIRED_COLUMNS: [&str; 5] = [TRAILER_ID, SID, CISCO_ID, PART_NUMBER, QUANTITY];

/// Positions of the required columns within a header row
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    trailer_id: usize,
    sid: usize,
    cisco_id: usize,
    part_number: usize,
    quantity: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> IngestResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| IngestError::Data {
                    line: 1,
                    message: format!("missing required column '{}'", name),
                })
        };

        Ok(ColumnIndex {
            trailer_id: find(TRAILER_ID)?,
            sid: find(SID)?,
            cisco_id: find(CISCO_ID)?,
            part_number: find(PART_NUMBER)?,
            quantity: find(QUANTITY)?,
        })
    }

    fn row(&self, record: &StringRecord, line: u64) -> IngestResult<ShipmentRow> {
        let field = |idx: usize, name: &str| -> IngestResult<String> {
            match record.get(idx) {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => Err(IngestError::Data {
                    line,
                    message: format!("column '{}' is empty", name),
                }),
            }
        };

        let raw_quantity = field(self.quantity, QUANTITY)?;
        let quantity = raw_quantity.parse::<i64>().map_err(|_| IngestError::Data {
            line,
            message: format!("{} '{}' is not an integer", QUANTITY, raw_quantity),
        })?;

        Ok(ShipmentRow {
            trailer_id: field(self.trailer_id, TRAILER_ID)?,
            sid: field(self.sid, SID)?,
            cisco_id: field(self.cisco_id, CISCO_ID)?,
            part_number: field(self.part_number, PART_NUMBER)?,
            quantity,
        })
    }
}

fn csv_error(err: csv::Error) -> IngestError {
    IngestError::Data {
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: format!("malformed CSV: {}", err),
    }
}

/// Parse a manifest with a header row into validated rows
pub fn parse_rows(bytes: &[u8]) -> IngestResult<Vec<ShipmentRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let columns = ColumnIndex::resolve(&headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push(columns.row(&record, line)?);
    }
    Ok(rows)
}
