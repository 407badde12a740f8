//! Positional fallback layout
//!
//! Used when no known header is present: columns 0..=3 are tracking,
//! address, city and postal code.

use super::sheet::{cell, SheetTable};
use super::{accept_tracking, clean_field, ParsedParcel};

pub fn parse(table: &SheetTable) -> Vec<ParsedParcel> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let tracking_code = accept_tracking(cell(row, Some(0))?)?;
            Some(ParsedParcel {
                tracking_code,
                address: clean_field(cell(row, Some(1))),
                city: clean_field(cell(row, Some(2))),
                postal_code: clean_field(cell(row, Some(3))),
                region: None,
            })
        })
        .collect()
}
