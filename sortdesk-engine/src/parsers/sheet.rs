//! Tabular source reader
//!
//! Reads the first worksheet of an xlsx/xls/ods workbook, or a CSV file, into
//! a plain string grid. The first row is the header row.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::{accept_tracking, clean_field, ParseError, ParsedParcel, RawDocument};

/// First worksheet as strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from string literals (fixtures, text exports)
    pub fn from_rows<S: AsRef<str>>(headers: &[S], rows: &[Vec<S>]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.as_ref().to_string()).collect())
                .collect(),
        }
    }

    /// Index of a header, compared trimmed and case-insensitively
    pub fn column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cell at `idx`, if the column exists and the row is long enough
pub(crate) fn cell(row: &[String], idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| row.get(i)).map(String::as_str)
}

/// Column layout for a header-driven grammar
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnLayout {
    pub tracking: &'static str,
    pub address: &'static str,
    pub city: &'static str,
    pub postal_code: Option<&'static str>,
    pub region: Option<&'static str>,
}

/// Extract parcels by header name; rows without a usable tracking code are dropped
pub(crate) fn extract_by_columns(table: &SheetTable, layout: &ColumnLayout) -> Vec<ParsedParcel> {
    let Some(tracking_idx) = table.column(layout.tracking) else {
        return Vec::new();
    };
    let address_idx = table.column(layout.address);
    let city_idx = table.column(layout.city);
    let postal_idx = layout.postal_code.and_then(|name| table.column(name));
    let region_idx = layout.region.and_then(|name| table.column(name));

    table
        .rows
        .iter()
        .filter_map(|row| {
            let tracking_code = accept_tracking(cell(row, Some(tracking_idx))?)?;
            Some(ParsedParcel {
                tracking_code,
                address: clean_field(cell(row, address_idx)),
                city: clean_field(cell(row, city_idx)),
                postal_code: clean_field(cell(row, postal_idx)),
                region: clean_field(cell(row, region_idx)),
            })
        })
        .collect()
}

/// Read the whole first sheet
pub fn read_sheet(document: &RawDocument) -> Result<SheetTable, ParseError> {
    match document.extension().as_deref() {
        Some("csv") => read_csv(&document.bytes),
        _ => read_workbook(&document.bytes),
    }
}

fn read_workbook(bytes: &[u8]) -> Result<SheetTable, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::NoWorksheet)?
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_string).collect::<Vec<_>>());

    let headers = rows.next().unwrap_or_default();
    let body = rows
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    Ok(SheetTable::new(headers, body))
}

fn read_csv(bytes: &[u8]) -> Result<SheetTable, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();
    let headers = match records.next() {
        Some(record) => {
            let record = record.map_err(|e| ParseError::Csv(e.to_string()))?;
            record
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    if i == 0 {
                        h.trim_start_matches('\u{feff}').to_string()
                    } else {
                        h.to_string()
                    }
                })
                .collect()
        }
        None => Vec::new(),
    };

    let mut body = Vec::new();
    for record in records {
        let record = record.map_err(|e| ParseError::Csv(e.to_string()))?;
        let row: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        if row.iter().any(|c| !c.is_empty()) {
            body.push(row);
        }
    }

    Ok(SheetTable::new(headers, body))
}

/// Stringify a cell; integral floats lose the ".0" so numeric tracking codes survive
fn cell_string(data: &Data) -> String {
    match data {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = SheetTable::from_rows(&["Tracking No.", " Receiver's City "], &[]);
        assert_eq!(table.column("tracking no."), Some(0));
        assert_eq!(table.column("Receiver's City"), Some(1));
        assert_eq!(table.column("Sort Code"), None);
    }

    #[test]
    fn test_csv_reader_skips_blank_rows_and_bom() {
        let doc = RawDocument::new(
            "export.csv",
            "\u{feff}data.waybillNo,data.toCity\nGFFR0001,Reims\n,\nGFFR0002,Paris\n"
                .as_bytes()
                .to_vec(),
        );
        let table = read_sheet(&doc).unwrap();
        assert_eq!(table.headers, vec!["data.waybillNo", "data.toCity"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["GFFR0002", "Paris"]);
    }

    #[test]
    fn test_xlsx_roundtrip_through_calamine() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "data.waybillNo").unwrap();
        sheet.write_string(0, 1, "data.toCity").unwrap();
        sheet.write_string(1, 0, "GFFR00000000000001").unwrap();
        sheet.write_string(1, 1, "Reims").unwrap();
        sheet.write_number(2, 0, 123456789.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = read_sheet(&RawDocument::new("upload.xlsx", bytes)).unwrap();
        assert_eq!(table.headers, vec!["data.waybillNo", "data.toCity"]);
        assert_eq!(table.rows[0][0], "GFFR00000000000001");
        assert_eq!(table.rows[1][0], "123456789");
    }

    #[test]
    fn test_garbage_bytes_are_workbook_error() {
        let doc = RawDocument::new("upload.xlsx", b"not a workbook".to_vec());
        assert!(matches!(read_sheet(&doc), Err(ParseError::Workbook(_))));
    }

    #[test]
    fn test_extract_drops_rows_without_tracking() {
        let table = SheetTable::from_rows(
            &["code", "street", "town"],
            &[
                vec!["gffr0001", "1 rue A", "Reims"],
                vec!["", "2 rue B", "Reims"],
                vec!["tot", "", ""],
            ],
        );
        let layout = ColumnLayout {
            tracking: "code",
            address: "street",
            city: "town",
            postal_code: None,
            region: None,
        };
        let parcels = extract_by_columns(&table, &layout);
        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].tracking_code, "GFFR0001");
        assert_eq!(parcels[0].postal_code, None);
    }
}
