//! Document parsers
//!
//! Each carrier layout is a small grammar behind one [`DocumentParser`] entry
//! point. Spreadsheet layouts (carrier A, carrier B, positional fallback) are
//! column grammars over a [`sheet::SheetTable`]; sequencing manifests are
//! line grammars over text extracted from a layout document.
//!
//! Parsers never touch the store. A sheet without data rows yields an empty
//! list; only violated structural assumptions raise a [`ParseError`].

use serde::{Deserialize, Serialize};
use sortdesk_common::db::DocumentFormat;
use thiserror::Error;

pub mod address;
pub mod carrier_a;
pub mod carrier_b;
pub mod generic;
pub mod sequencing_multi;
pub mod sequencing_single;
pub mod sheet;

pub use sequencing_multi::{DriverManifest, SequencedParcel};
pub use sequencing_single::SequenceEntry;
pub use sheet::SheetTable;

/// Tracking tokens shorter than this are noise rows (totals, blank lines)
pub const MIN_TRACKING_LEN: usize = 5;

/// Structural parse failure
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Cannot open workbook: {0}")]
    Workbook(String),

    #[error("Workbook has no worksheet")]
    NoWorksheet,

    #[error("Cannot read CSV: {0}")]
    Csv(String),

    #[error("Document is not UTF-8 text")]
    NotText,

    #[error("Unrecognized sequencing document: no driver ranges found in header")]
    MissingDriverRanges,
}

/// Normalized parcel record produced by the spreadsheet parsers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedParcel {
    /// Trimmed, uppercased, at least [`MIN_TRACKING_LEN`] characters
    pub tracking_code: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub region: Option<String>,
}

/// An uploaded document: original file name plus raw bytes
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lowercased extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// File name without directory or extension (the driver name for carrier uploads)
    pub fn stem(&self) -> String {
        std::path::Path::new(&self.file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Document body as text (for manifests already converted from layout documents)
    pub fn text(&self) -> Result<&str, ParseError> {
        std::str::from_utf8(&self.bytes).map_err(|_| ParseError::NotText)
    }
}

/// The five supported layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentParser {
    CarrierA,
    CarrierB,
    Generic,
    SequencingMulti,
    SequencingSingle,
}

/// Parser output, one variant per grammar family
#[derive(Debug, Clone)]
pub enum ParsedDocument {
    Parcels(Vec<ParsedParcel>),
    Manifest(Vec<DriverManifest>),
    Sequence(Vec<SequenceEntry>),
}

impl ParsedDocument {
    /// Number of extracted records
    pub fn len(&self) -> usize {
        match self {
            ParsedDocument::Parcels(parcels) => parcels.len(),
            ParsedDocument::Manifest(drivers) => drivers.iter().map(|d| d.parcels.len()).sum(),
            ParsedDocument::Sequence(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentParser {
    /// Format tag recorded for documents read by this parser
    pub fn format(&self) -> DocumentFormat {
        match self {
            DocumentParser::CarrierA => DocumentFormat::CarrierA,
            DocumentParser::CarrierB => DocumentFormat::CarrierB,
            DocumentParser::Generic => DocumentFormat::Unknown,
            DocumentParser::SequencingMulti => DocumentFormat::SequencingMulti,
            DocumentParser::SequencingSingle => DocumentFormat::SequencingSingle,
        }
    }

    pub fn parse(&self, document: &RawDocument) -> Result<ParsedDocument, ParseError> {
        match self {
            DocumentParser::CarrierA => {
                let table = sheet::read_sheet(document)?;
                Ok(ParsedDocument::Parcels(carrier_a::parse(&table)))
            }
            DocumentParser::CarrierB => {
                let table = sheet::read_sheet(document)?;
                Ok(ParsedDocument::Parcels(carrier_b::parse(&table)))
            }
            DocumentParser::Generic => {
                let table = sheet::read_sheet(document)?;
                Ok(ParsedDocument::Parcels(generic::parse(&table)))
            }
            DocumentParser::SequencingMulti => {
                let drivers = sequencing_multi::parse(document.text()?)?;
                Ok(ParsedDocument::Manifest(drivers))
            }
            DocumentParser::SequencingSingle => {
                Ok(ParsedDocument::Sequence(sequencing_single::parse(document.text()?)))
            }
        }
    }
}

/// Trim and uppercase a tracking code
pub fn normalize_tracking(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Normalized tracking code, or `None` for noise values
pub(crate) fn accept_tracking(raw: &str) -> Option<String> {
    let tracking = normalize_tracking(raw);
    if tracking.chars().count() < MIN_TRACKING_LEN {
        return None;
    }
    Some(tracking)
}

/// Trimmed field, empty becomes `None`
pub(crate) fn clean_field(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
