//! # Update Dispatcher
//!
//! The receive loop binding the transport to the conversation router.
//!
//! One logical poller long-polls the chat service; every received update is
//! handled in its own task while holding the sending user's session lock, so
//! a user's messages apply in order and distinct users never wait on each
//! other. Polling errors are logged and swallowed — the loop must outlive
//! any transport hiccup and any one user's failure. Shutdown is cooperative:
//! cancelling the token stops polling and the loop then waits for in-flight
//! handlers, which mutate sessions only after their pure work completed.

use crate::bot::transport::{ChatTransport, IncomingDocument, IncomingMessage, TransportError, Update};
use crate::store::SessionStore;
use bibliofi_core::{ChatError, ChatState, Encoding, Keyboard, Reply, Session, router};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Pause before the next poll after a transport error.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

// =============================================================================
// DISPATCHER
// =============================================================================

/// Owns the polling loop; everything else is borrowed per update.
pub struct Dispatcher<T> {
    transport: Arc<T>,
    store: Arc<SessionStore>,
}

impl<T: ChatTransport + 'static> Dispatcher<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, store: Arc<SessionStore>) -> Self {
        Self { transport, store }
    }

    /// Poll for updates until the token is cancelled.
    ///
    /// Fails only if the bot cannot identify itself at startup; from then on
    /// every error is logged and absorbed.
    pub async fn run(
        &self,
        cancel: CancellationToken,
        poll_timeout: Duration,
    ) -> Result<(), TransportError> {
        let me = self.transport.get_me().await?;
        tracing::info!("start listening for @{}", me.username);

        let tracker = TaskTracker::new();
        let mut offset = 0i64;

        loop {
            let batch = tokio::select! {
                () = cancel.cancelled() => break,
                result = self.transport.get_updates(offset, poll_timeout) => result,
            };
            match batch {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let transport = Arc::clone(&self.transport);
                        let store = Arc::clone(&self.store);
                        tracker.spawn(async move {
                            handle_update(transport.as_ref(), store.as_ref(), update).await;
                        });
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, "update polling failed; retrying");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                    }
                }
            }
        }

        tracing::info!("receive loop stopped; waiting for in-flight updates");
        tracker.close();
        tracker.wait().await;
        Ok(())
    }
}

// =============================================================================
// UPDATE HANDLING
// =============================================================================

/// Handle one polled update end to end.
///
/// Takes the per-user session lock for the whole handling, serializing
/// same-user updates; the lock also covers the attachment download so a
/// second message cannot interleave mid-upload.
pub async fn handle_update<T: ChatTransport + ?Sized>(
    transport: &T,
    store: &SessionStore,
    update: Update,
) {
    let Some(message) = update.message else {
        return;
    };
    let session = store.session(message.user_id).await;
    let mut session = session.lock().await;

    if let Some(document) = message.document.clone() {
        handle_document_message(transport, &mut session, &message, &document).await;
    } else if let Some(text) = message.text.clone() {
        handle_text_message(transport, &mut session, &message, &text).await;
    } else {
        tracing::warn!(user_id = message.user_id, "message type cannot be processed");
        send_plain(transport, message.chat_id, router::UNSUPPORTED_MESSAGE_TYPE, None).await;
    }
}

async fn handle_document_message<T: ChatTransport + ?Sized>(
    transport: &T,
    session: &mut Session,
    message: &IncomingMessage,
    document: &IncomingDocument,
) {
    tracing::info!(
        user_id = message.user_id,
        file_name = ?document.file_name,
        "received document"
    );

    if session.state() != ChatState::AwaitingFileUpload {
        tracing::warn!(user_id = message.user_id, "document outside the upload step");
        send_plain(transport, message.chat_id, router::UNSUPPORTED_MESSAGE_TYPE, None).await;
        return;
    }
    let Some(file_name) = document.file_name.clone() else {
        // No file name means no way to pick a codec.
        send_plain(
            transport,
            message.chat_id,
            &ChatError::UnsupportedFile.user_message(),
            None,
        )
        .await;
        return;
    };
    let bytes = match transport.get_file(&document.file_id).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(user_id = message.user_id, error = %err, "attachment download failed");
            return;
        }
    };

    match router::handle_document(session, &file_name, bytes) {
        Ok(replies) => deliver(transport, message.chat_id, replies).await,
        Err(err) => reject(transport, message, &err).await,
    }
}

async fn handle_text_message<T: ChatTransport + ?Sized>(
    transport: &T,
    session: &mut Session,
    message: &IncomingMessage,
    text: &str,
) {
    tracing::info!(user_id = message.user_id, text, "message received");

    match router::handle_text(session, text) {
        Ok(replies) => deliver(transport, message.chat_id, replies).await,
        Err(err) => reject(transport, message, &err).await,
    }
}

// =============================================================================
// REPLY DELIVERY
// =============================================================================

async fn deliver<T: ChatTransport + ?Sized>(transport: &T, chat_id: i64, replies: Vec<Reply>) {
    for reply in replies {
        let outcome = match reply {
            Reply::Text { text, keyboard } => transport.send_text(chat_id, &text, keyboard).await,
            Reply::Document { encoding, bytes } => {
                transport
                    .send_document(
                        chat_id,
                        &download_file_name(encoding),
                        router::DOWNLOAD_CAPTION,
                        bytes,
                    )
                    .await
            }
        };
        if let Err(err) = outcome {
            tracing::error!(chat_id, error = %err, "reply delivery failed");
        }
    }
}

/// Log the rejection and show the user its diagnostic text.
async fn reject<T: ChatTransport + ?Sized>(
    transport: &T,
    message: &IncomingMessage,
    err: &ChatError,
) {
    tracing::error!(user_id = message.user_id, error = %err, "message rejected");
    send_plain(transport, message.chat_id, &err.user_message(), None).await;
}

async fn send_plain<T: ChatTransport + ?Sized>(
    transport: &T,
    chat_id: i64,
    text: &str,
    keyboard: Option<Keyboard>,
) {
    if let Err(err) = transport.send_text(chat_id, text, keyboard).await {
        tracing::error!(chat_id, error = %err, "reply delivery failed");
    }
}

/// `wifi-library_<yyyyMMddHHmmss>.<ext>`, stamped at send time.
fn download_file_name(encoding: Encoding) -> String {
    format!(
        "{}_{}.{}",
        router::DOWNLOAD_FILE_STEM,
        Local::now().format("%Y%m%d%H%M%S"),
        encoding.extension()
    )
}
