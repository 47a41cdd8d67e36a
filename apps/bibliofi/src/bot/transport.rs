//! # Transport Contract
//!
//! The narrow interface the bot consumes to talk to the outside chat
//! service. The dispatcher and the conversation flow only ever see this
//! trait, so the whole update-handling path runs against an in-memory
//! double in tests.

use async_trait::async_trait;
use bibliofi_core::Keyboard;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// ERRORS
// =============================================================================

/// A transport operation failed.
///
/// Never fatal: the polling loop logs and continues, and a failed send is
/// logged against the affected user only.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP request itself failed (connect, timeout, TLS).
    #[error("transport request failed: {0}")]
    Http(String),

    /// The chat service answered with an API-level error.
    #[error("chat API error {code}: {description}")]
    Api { code: i64, description: String },

    /// The response body did not have the promised shape.
    #[error("malformed transport payload: {0}")]
    Payload(String),
}

// =============================================================================
// INBOUND TYPES
// =============================================================================

/// One polled update from the chat service.
#[derive(Debug, Clone)]
pub struct Update {
    /// Monotonic update identifier; the poll offset advances past it.
    pub update_id: i64,
    /// The message payload, if this update carries one from a known user.
    pub message: Option<IncomingMessage>,
}

/// A user message: text, an attachment, or (rarely) neither.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub user_id: i64,
    pub chat_id: i64,
    pub text: Option<String>,
    pub document: Option<IncomingDocument>,
}

/// An attachment reference; the bytes are fetched separately.
#[derive(Debug, Clone)]
pub struct IncomingDocument {
    pub file_id: String,
    pub file_name: Option<String>,
}

/// Who the bot is, as reported by the chat service.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub username: String,
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// Everything the bot needs from the chat service.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Identify the bot account.
    async fn get_me(&self) -> Result<BotIdentity, TransportError>;

    /// Long-poll for updates after `offset`, waiting up to `timeout`.
    async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TransportError>;

    /// Send a text message, optionally with a reply keyboard.
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), TransportError>;

    /// Send a document attachment with a caption.
    async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        caption: &str,
        bytes: Vec<u8>,
    ) -> Result<(), TransportError>;

    /// Fetch the bytes of an attachment the user sent.
    async fn get_file(&self, file_id: &str) -> Result<Vec<u8>, TransportError>;
}
