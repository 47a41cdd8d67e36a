//! # Session
//!
//! The per-user conversation aggregate: one `Session` replaces the four
//! parallel per-user maps of the upstream design (state, file, field,
//! working set), so the pieces cannot drift apart.
//!
//! A session is created lazily on a user's first message and lives for the
//! process lifetime; nothing here is persisted. The app layer owns the keyed
//! store and serializes access per user — within this crate a session is
//! just plain mutable data.

use crate::codec::Encoding;
use crate::error::{ChatError, FormatError};
use crate::record::Record;

// =============================================================================
// CONVERSATION STATE
// =============================================================================

/// Where the conversation with one user currently stands.
///
/// No state is absorbing: `/start` is reachable from everywhere and resets
/// to `Initial`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatState {
    /// First contact, or after `/start`.
    #[default]
    Initial,
    /// `/uploadFile` was sent; the next attachment is the dataset.
    AwaitingFileUpload,
    /// A dataset file is stored; `/select` or `/sort` may proceed.
    FileUploaded,
    /// `/select` was sent; a filter-field command is expected.
    AwaitingSelection,
    /// A filter field was picked; the next free text carries the values.
    AwaitingFieldValue,
    /// `/sort` was sent; a sort-field command is expected.
    AwaitingSorting,
    /// A filter/sort completed; the working set is ready for `/download`.
    ProcessingCompleted,
    /// `/download` was sent; a format command (`/CSV`, `/JSON`) is expected.
    AwaitingDownloading,
}

// =============================================================================
// UPLOAD
// =============================================================================

/// A stored dataset upload: the raw bytes plus the encoding derived from the
/// attachment's file name. The working set is always encoding-agnostic; the
/// encoding belongs to the upload alone.
#[derive(Debug, Clone)]
pub struct Upload {
    bytes: Vec<u8>,
    encoding: Encoding,
}

impl Upload {
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Conversation state plus the data currently in flight for one user.
#[derive(Debug, Default)]
pub struct Session {
    state: ChatState,
    upload: Option<Upload>,
    /// Filter field picked in `AwaitingSelection`; transient, only
    /// meaningful while the state is `AwaitingFieldValue`.
    field: Option<&'static str>,
    working_set: Option<Vec<Record>>,
}

impl Session {
    /// A fresh session in `Initial`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn set_state(&mut self, state: ChatState) {
        self.state = state;
    }

    /// Store an upload, replacing any previous one (last write wins).
    pub fn store_upload(&mut self, bytes: Vec<u8>, encoding: Encoding) {
        self.upload = Some(Upload { bytes, encoding });
    }

    #[must_use]
    pub fn upload(&self) -> Option<&Upload> {
        self.upload.as_ref()
    }

    pub fn set_field(&mut self, field: &'static str) {
        self.field = Some(field);
    }

    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    pub fn clear_field(&mut self) {
        self.field = None;
    }

    /// Replace the working set with the outcome of a filter/sort.
    pub fn set_working_set(&mut self, records: Vec<Record>) {
        self.working_set = Some(records);
    }

    #[must_use]
    pub fn working_set(&self) -> Option<&[Record]> {
        self.working_set.as_deref()
    }

    /// `/start`: back to `Initial`, transient selections cleared. The stored
    /// upload and working set stay; both are last-write-wins.
    pub fn reset(&mut self) {
        self.state = ChatState::Initial;
        self.field = None;
    }

    /// Decode the stored upload with its own codec.
    ///
    /// A missing upload is a `NotFound`-class error; a zero-length upload is
    /// rejected here, before any codec runs.
    pub fn decode_upload(&self) -> Result<Vec<Record>, ChatError> {
        let upload = self.upload.as_ref().ok_or(ChatError::UploadRequired)?;
        if upload.bytes.is_empty() {
            return Err(ChatError::Format(FormatError::Empty));
        }
        Ok(upload.encoding.codec().decode(&upload.bytes)?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_initial_and_empty() {
        let session = Session::new();
        assert_eq!(session.state(), ChatState::Initial);
        assert!(session.upload().is_none());
        assert!(session.field().is_none());
        assert!(session.working_set().is_none());
    }

    #[test]
    fn reset_clears_state_and_field_but_keeps_data() {
        let mut session = Session::new();
        session.store_upload(b"x".to_vec(), Encoding::Csv);
        session.set_field("AdmArea");
        session.set_working_set(vec![]);
        session.set_state(ChatState::AwaitingFieldValue);

        session.reset();

        assert_eq!(session.state(), ChatState::Initial);
        assert!(session.field().is_none());
        assert!(session.upload().is_some());
        assert!(session.working_set().is_some());
    }

    #[test]
    fn decode_without_upload_is_upload_required() {
        let session = Session::new();
        assert!(matches!(
            session.decode_upload(),
            Err(ChatError::UploadRequired)
        ));
    }

    #[test]
    fn zero_length_upload_is_rejected_before_the_codec() {
        let mut session = Session::new();
        session.store_upload(Vec::new(), Encoding::Json);
        assert!(matches!(
            session.decode_upload(),
            Err(ChatError::Format(FormatError::Empty))
        ));
    }

    #[test]
    fn upload_is_last_write_wins() {
        let mut session = Session::new();
        session.store_upload(b"old".to_vec(), Encoding::Csv);
        session.store_upload(b"new".to_vec(), Encoding::Json);
        let upload = session.upload().expect("stored");
        assert_eq!(upload.bytes(), b"new");
        assert_eq!(upload.encoding(), Encoding::Json);
    }
}
