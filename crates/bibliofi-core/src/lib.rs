//! # bibliofi-core
//!
//! The deterministic engine of the bibliofi bot - THE LOGIC.
//!
//! This crate implements everything that can be computed without touching
//! the outside world: the validated dataset [`Record`], the two wire codecs
//! (delimited text and JSON), the filter/sort query engine, the per-user
//! [`Session`] aggregate, and the conversation [`router`] that turns an
//! inbound message into a session mutation plus ordered replies.
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network, NO filesystem, NO clock — the app crate owns all
//!   of those
//! - Deterministic: identical (session, message) pairs produce identical
//!   replies
//! - Every error is a typed value ([`ValidationError`], [`FormatError`],
//!   [`ChatError`]) that the conversation boundary renders as user text;
//!   nothing here panics

// =============================================================================
// MODULES
// =============================================================================

pub mod codec;
pub mod error;
pub mod query;
pub mod record;
pub mod router;
pub mod session;

// =============================================================================
// RE-EXPORTS: Data pipeline
// =============================================================================

pub use codec::{CSV_HEADER_FIELDS, CSV_HEADER_LABELS, Codec, CsvCodec, Encoding, JsonCodec};
pub use error::{ChatError, FormatError, ValidationError};
pub use record::{Record, WIRE_NAMES};

// =============================================================================
// RE-EXPORTS: Conversation engine
// =============================================================================

pub use router::{Command, Keyboard, Reply, handle_document, handle_text};
pub use session::{ChatState, Session, Upload};
