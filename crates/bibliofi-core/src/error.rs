//! # Error Types
//!
//! The three recoverable error classes of the conversation boundary:
//!
//! - [`ValidationError`] — a single record field violates its domain
//!   constraint
//! - [`FormatError`] — a byte stream is structurally not a dataset file
//! - [`ChatError`] — an inbound message is not legal for the current
//!   conversation state, or references data the session does not hold
//!
//! No error in this crate is fatal: every variant maps to a user-facing
//! diagnostic via [`ChatError::user_message`], and the app layer keeps the
//! receive loop running regardless of what a handler returns.

use thiserror::Error;

// =============================================================================
// VALIDATION
// =============================================================================

/// A single record field fails its constraint.
///
/// Carries the wire name of the first offending field; construction is
/// all-or-nothing, so no partially-valid record can be observed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A numeric field that must be non-negative is negative (or NaN).
    #[error("field {0} must not be negative")]
    Negative(&'static str),

    /// A coordinate field is outside its closed range.
    #[error("field {field} must be within [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
}

// =============================================================================
// FORMAT
// =============================================================================

/// A byte stream failed structural validation in a codec.
///
/// Structural checks run over the whole document before any record is
/// constructed; a [`ValidationError`] raised while building records aborts
/// the decode and surfaces here as [`FormatError::Invalid`].
#[derive(Debug, Error)]
pub enum FormatError {
    /// The stream contains no lines at all.
    #[error("empty input")]
    Empty,

    /// One of the two fixed header lines does not match byte-for-byte.
    #[error("line {0} does not match the expected dataset header")]
    HeaderMismatch(usize),

    /// A data row does not split into exactly sixteen fields.
    #[error("line {line}: expected 16 fields, found {found}")]
    FieldCount { line: usize, found: usize },

    /// A token in a numeric position is neither empty nor a number.
    #[error("line {line}, field {field}: {value:?} is not a number")]
    NumericField {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// The document is not parseable at all (malformed JSON, bad integer).
    #[error("malformed document: {0}")]
    Malformed(String),

    /// A structurally valid row produced an out-of-constraint record.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

// =============================================================================
// CONVERSATION
// =============================================================================

/// An inbound message could not be honored by the conversation router.
///
/// `State`-class and `NotFound`-class variants leave the session untouched;
/// `Format` is raised when decoding a stored upload fails, after the router
/// has moved the session back to its recovery point.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The input is not a command that is legal in the current state.
    #[error("input {input:?} is not supported in the current state")]
    State { input: String },

    /// `/uploadFile` was sent although a file is already stored.
    #[error("a file has already been uploaded")]
    AlreadyUploaded,

    /// A command that needs an uploaded file arrived before any upload.
    #[error("no uploaded file for this session")]
    UploadRequired,

    /// An attachment with a suffix other than `.csv`/`.json` was sent.
    #[error("unsupported attachment type")]
    UnsupportedFile,

    /// `/download` arrived while the session holds no working record set.
    #[error("no processed record set for this session")]
    NothingToDownload,

    /// Decoding or encoding the dataset failed.
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl ChatError {
    /// The exact text shown to the chat user for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::State { .. } => {
                "The command is not supported or not available right now. \
                 Use /help to list the available commands."
                    .to_string()
            }
            Self::AlreadyUploaded => "You have already uploaded a file.".to_string(),
            Self::UploadRequired => "Upload a matching dataset file first.".to_string(),
            Self::UnsupportedFile => "Please upload a file in CSV or JSON format.".to_string(),
            Self::NothingToDownload => "No processed data found.".to_string(),
            Self::Format(e) => format!("{e}\nUse /start to restart the bot."),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_display_is_stable() {
        // The wording is part of the decode contract.
        assert_eq!(FormatError::Empty.to_string(), "empty input");
    }

    #[test]
    fn validation_error_names_the_field() {
        let err = ValidationError::Negative("NumberOfAccessPoints");
        assert!(err.to_string().contains("NumberOfAccessPoints"));
    }

    #[test]
    fn format_errors_tell_the_user_to_restart() {
        let err = ChatError::from(FormatError::Empty);
        assert!(err.user_message().contains("/start"));
    }

    #[test]
    fn state_error_keeps_generic_user_text() {
        let err = ChatError::State {
            input: "/CSV".to_string(),
        };
        assert!(err.user_message().contains("/help"));
        assert!(!err.user_message().contains("/CSV"));
    }
}
