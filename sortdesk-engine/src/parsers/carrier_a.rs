//! Carrier A platform export
//!
//! Header-named columns; the export carries no postal code column.

use super::sheet::{extract_by_columns, ColumnLayout, SheetTable};
use super::ParsedParcel;

/// Header that identifies this layout
pub const TRACKING_COLUMN: &str = "data.waybillNo";

const LAYOUT: ColumnLayout = ColumnLayout {
    tracking: TRACKING_COLUMN,
    address: "data.toStreet",
    city: "data.toCity",
    postal_code: None,
    region: Some("data.toState"),
};

pub fn parse(table: &SheetTable) -> Vec<ParsedParcel> {
    extract_by_columns(table, &LAYOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[Vec<&str>]) -> SheetTable {
        SheetTable::from_rows(
            &["data.waybillNo", "data.toStreet", "data.toCity", "data.toState"],
            rows,
        )
    }

    #[test]
    fn test_parse_maps_named_columns() {
        let parsed = parse(&table(&[vec![" gffr00000000000001 ", "12 rue de Vesle", "Reims", "Grand Est"]]));

        assert_eq!(
            parsed,
            vec![ParsedParcel {
                tracking_code: "GFFR00000000000001".to_string(),
                address: Some("12 rue de Vesle".to_string()),
                city: Some("Reims".to_string()),
                postal_code: None,
                region: Some("Grand Est".to_string()),
            }]
        );
    }

    #[test]
    fn test_short_tracking_rows_are_skipped() {
        let parsed = parse(&table(&[
            vec!["GFFR0001", "", "", ""],
            vec!["1234", "Total", "", ""],
        ]));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].address, None);
    }

    #[test]
    fn test_header_only_sheet_is_empty() {
        assert!(parse(&table(&[])).is_empty());
    }

    #[test]
    fn test_missing_tracking_column_yields_nothing() {
        let other = SheetTable::from_rows(&["Tracking No."], &[vec!["GFFR0001"]]);
        assert!(parse(&other).is_empty());
    }
}
