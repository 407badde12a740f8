//! Spreadsheet format detection
//!
//! Detection looks at the header row only. Carrier A wins over carrier B when
//! both markers appear; anything else falls back to the positional layout.

use sortdesk_common::db::DocumentFormat;

use crate::parsers::{sheet, DocumentParser, ParseError, ParsedParcel, RawDocument};

/// Detected format and the parcels read with the matching grammar
#[derive(Debug, Clone)]
pub struct ClassifiedDocument {
    pub format: DocumentFormat,
    pub parcels: Vec<ParsedParcel>,
}

/// Parser for a header row
pub fn classify_headers<S: AsRef<str>>(headers: &[S]) -> DocumentParser {
    let joined = headers
        .iter()
        .map(|h| h.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join("|");

    if joined.contains("waybillno") {
        DocumentParser::CarrierA
    } else if joined.contains("tracking no") {
        DocumentParser::CarrierB
    } else {
        DocumentParser::Generic
    }
}

/// Detect the format and parse with the matching grammar
pub fn parse_auto(document: &RawDocument) -> Result<ClassifiedDocument, ParseError> {
    let table = sheet::read_sheet(document)?;
    let parser = classify_headers(&table.headers);
    let parcels = match parser {
        DocumentParser::CarrierA => crate::parsers::carrier_a::parse(&table),
        DocumentParser::CarrierB => crate::parsers::carrier_b::parse(&table),
        _ => crate::parsers::generic::parse(&table),
    };

    tracing::debug!(
        file = %document.file_name,
        format = %parser.format(),
        parcels = parcels.len(),
        "Classified spreadsheet"
    );

    Ok(ClassifiedDocument {
        format: parser.format(),
        parcels,
    })
}
