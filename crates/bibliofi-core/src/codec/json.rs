//! # Structured-Text Codec
//!
//! The JSON rendition of the dataset: a pretty-printed array of objects
//! keyed by the canonical wire names, order-preserving, one object per
//! record. Non-ASCII text (the dataset is largely Cyrillic) is emitted
//! unescaped.
//!
//! Decode parses into the unvalidated wire shape first and then runs every
//! element through record construction, so a structural mismatch surfaces as
//! [`FormatError::Malformed`] and a constraint violation as
//! [`FormatError::Invalid`] — either way the whole decode aborts.

use crate::codec::Codec;
use crate::error::FormatError;
use crate::record::{RawRecord, Record};

/// The structured-text implementation of [`Codec`].
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, records: &[Record]) -> Result<Vec<u8>, FormatError> {
        serde_json::to_vec_pretty(records).map_err(|e| FormatError::Malformed(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Record>, FormatError> {
        let raw: Vec<RawRecord> =
            serde_json::from_slice(bytes).map_err(|e| FormatError::Malformed(e.to_string()))?;
        raw.into_iter()
            .map(|r| Record::try_from(r).map_err(FormatError::from))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
