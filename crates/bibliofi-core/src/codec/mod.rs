//! # Codecs
//!
//! Bidirectional mapping between a byte stream and an ordered sequence of
//! [`Record`]s. Two interchangeable implementations exist:
//!
//! - [`CsvCodec`] — the delimited-text format with the two-line fixed header
//! - [`JsonCodec`] — the structured-text (JSON array) format
//!
//! Both validate structure strictly on decode and construct records only
//! after the whole document has passed; a decode either yields every record
//! or none.

mod csv;
mod json;

pub use csv::{CSV_HEADER_FIELDS, CSV_HEADER_LABELS, CsvCodec};
pub use json::JsonCodec;

use crate::error::FormatError;
use crate::record::Record;

// =============================================================================
// CODEC CONTRACT
// =============================================================================

/// A pure, stateless converter between bytes and record sequences.
///
/// Implementations must round-trip: `decode(encode(xs)) == xs` for every
/// valid record sequence, modulo invariant float formatting.
pub trait Codec: Send + Sync {
    /// Serialize the records into the codec's wire format.
    fn encode(&self, records: &[Record]) -> Result<Vec<u8>, FormatError>;

    /// Parse the byte stream, validating structure before building records.
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Record>, FormatError>;
}

// =============================================================================
// ENCODING TAG
// =============================================================================

/// Which wire format a stored upload (or a requested download) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Csv,
    Json,
}

impl Encoding {
    /// Derive the encoding from an attachment file name, case-insensitively.
    ///
    /// Returns `None` for any suffix other than `.csv`/`.json`.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else if lower.ends_with(".json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// The codec implementing this encoding.
    #[must_use]
    pub fn codec(self) -> &'static dyn Codec {
        match self {
            Self::Csv => &CsvCodec,
            Self::Json => &JsonCodec,
        }
    }

    /// File extension for downloads in this encoding.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
