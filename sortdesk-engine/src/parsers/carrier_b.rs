//! Carrier B platform export

use super::sheet::{extract_by_columns, ColumnLayout, SheetTable};
use super::ParsedParcel;

/// Header that identifies this layout
pub const TRACKING_COLUMN: &str = "Tracking No.";

const LAYOUT: ColumnLayout = ColumnLayout {
    tracking: TRACKING_COLUMN,
    address: "Receiver's Detail Address",
    city: "Receiver's City",
    postal_code: Some("Sort Code"),
    region: Some("Receiver's Region/Province"),
};

pub fn parse(table: &SheetTable) -> Vec<ParsedParcel> {
    extract_by_columns(table, &LAYOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_maps_named_columns_in_any_order() {
        let table = SheetTable::from_rows(
            &[
                "Receiver's City",
                "Tracking No.",
                "Receiver's Detail Address",
                "Sort Code",
                "Receiver's Region/Province",
            ],
            &[
                vec!["Epernay", "cnfr1234567890hd", "4 avenue de Champagne", "51200", "Marne"],
                vec!["", "", "", "", ""],
            ],
        );

        let parsed = parse(&table);
        assert_eq!(parsed.len(), 1);
        let parcel = &parsed[0];
        assert_eq!(parcel.tracking_code, "CNFR1234567890HD");
        assert_eq!(parcel.address.as_deref(), Some("4 avenue de Champagne"));
        assert_eq!(parcel.city.as_deref(), Some("Epernay"));
        assert_eq!(parcel.postal_code.as_deref(), Some("51200"));
        assert_eq!(parcel.region.as_deref(), Some("Marne"));
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let table = SheetTable::from_rows(&["Tracking No."], &[vec!["CNFR1234567890HD"]]);
        let parsed = parse(&table);
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].city.is_none());
    }
}
