//! # Telegram Bot API Client
//!
//! [`ChatTransport`] implemented over the Bot API: JSON method calls via
//! POST, long polling through `getUpdates`, reply keyboards on text sends,
//! multipart upload for `sendDocument`, and the two-step `getFile` +
//! download for attachments.
//!
//! Only the fields the bot reads are modeled; the API's remaining payload is
//! ignored on deserialization.

use crate::bot::transport::{
    BotIdentity, ChatTransport, IncomingDocument, IncomingMessage, TransportError, Update,
};
use async_trait::async_trait;
use bibliofi_core::Keyboard;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The public Bot API host; overridable for tests and proxies.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

// =============================================================================
// CLIENT
// =============================================================================

/// A Bot API client bound to one bot token.
pub struct TelegramApi {
    client: Client,
    /// `{api_url}/bot{token}` — method calls are POSTed under this root.
    method_root: String,
    /// `{api_url}/file/bot{token}` — attachment downloads live here.
    file_root: String,
}

impl TelegramApi {
    #[must_use]
    pub fn new(api_url: &str, token: &str) -> Self {
        let api_url = api_url.trim_end_matches('/');
        Self {
            client: Client::new(),
            method_root: format!("{api_url}/bot{token}"),
            file_root: format!("{api_url}/file/bot{token}"),
        }
    }

    /// POST a method call and unwrap the API envelope.
    async fn call<T, P>(&self, method: &str, payload: &P) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.method_root))
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::Payload(e.to_string()))?;
        envelope.into_result()
    }
}

#[async_trait]
impl ChatTransport for TelegramApi {
    async fn get_me(&self) -> Result<BotIdentity, TransportError> {
        let me: WireMe = self.call("getMe", &serde_json::json!({})).await?;
        let username = me
            .username
            .ok_or_else(|| TransportError::Payload("bot account has no username".to_string()))?;
        Ok(BotIdentity { username })
    }

    async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        let payload = GetUpdatesPayload {
            offset,
            timeout: timeout.as_secs(),
            // Empty list: every update type except the chat-member noise.
            allowed_updates: &[],
        };
        let updates: Vec<WireUpdate> = self.call("getUpdates", &payload).await?;
        Ok(updates.into_iter().map(WireUpdate::into_update).collect())
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), TransportError> {
        let payload = SendMessagePayload {
            chat_id,
            text,
            reply_markup: keyboard.map(ReplyKeyboardMarkup::from_rows),
        };
        let _: serde_json::Value = self.call("sendMessage", &payload).await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        caption: &str,
        bytes: Vec<u8>,
    ) -> Result<(), TransportError> {
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part(
                "document",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string()),
            );
        let response = self
            .client
            .post(format!("{}/sendDocument", self.method_root))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let envelope: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| TransportError::Payload(e.to_string()))?;
        envelope.into_result().map(|_| ())
    }

    async fn get_file(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        let info: WireFile = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;
        let path = info
            .file_path
            .ok_or_else(|| TransportError::Payload("file has no download path".to_string()))?;
        let response = self
            .client
            .get(format!("{}/{path}", self.file_root))
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(TransportError::Api {
                code: i64::from(response.status().as_u16()),
                description: "file download failed".to_string(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// The Bot API response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, TransportError> {
        if self.ok {
            self.result
                .ok_or_else(|| TransportError::Payload("ok response without result".to_string()))
        } else {
            Err(TransportError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMe {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<WireMessage>,
}

impl WireUpdate {
    /// Messages without a sender are dropped here; the dispatcher never
    /// sees them.
    fn into_update(self) -> Update {
        let message = self.message.and_then(|m| {
            let from = m.from?;
            Some(IncomingMessage {
                user_id: from.id,
                chat_id: m.chat.id,
                text: m.text,
                document: m.document.map(|d| IncomingDocument {
                    file_id: d.file_id,
                    file_name: d.file_name,
                }),
            })
        });
        Update {
            update_id: self.update_id,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    from: Option<WireUser>,
    chat: WireChat,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    document: Option<WireDocument>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct WireChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    file_id: String,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireFile {
    #[serde(default)]
    file_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesPayload {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyKeyboardMarkup>,
}

/// The one-time, auto-resizing reply keyboard the bot offers after most
/// prompts, mirroring the command buttons of the conversation flow.
#[derive(Debug, Serialize)]
struct ReplyKeyboardMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
    one_time_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    fn from_rows(rows: Keyboard) -> Self {
        Self {
            keyboard: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|label| KeyboardButton {
                            text: (*label).to_string(),
                        })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
            one_time_keyboard: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct KeyboardButton {
    text: String,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_envelope_becomes_a_typed_error() {
        let raw = r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;
        let envelope: ApiResponse<serde_json::Value> =
            serde_json::from_str(raw).expect("envelope parses");
        let err = envelope.into_result().expect_err("must fail");
        assert!(matches!(err, TransportError::Api { code: 401, .. }));
    }

    #[test]
    fn updates_without_sender_are_dropped() {
        let raw = r#"{"update_id":7,"message":{"chat":{"id":5},"text":"hi"}}"#;
        let wire: WireUpdate = serde_json::from_str(raw).expect("update parses");
        let update = wire.into_update();
        assert_eq!(update.update_id, 7);
        assert!(update.message.is_none());
    }

    #[test]
    fn document_updates_carry_the_file_reference() {
        let raw = r#"{
            "update_id":8,
            "message":{
                "from":{"id":42},
                "chat":{"id":42},
                "document":{"file_id":"abc","file_name":"wifi.csv"}
            }
        }"#;
        let update: WireUpdate = serde_json::from_str(raw).expect("update parses");
        let message = update.into_update().message.expect("has sender");
        let document = message.document.expect("has document");
        assert_eq!(document.file_id, "abc");
        assert_eq!(document.file_name.as_deref(), Some("wifi.csv"));
    }

    #[test]
    fn keyboard_markup_serializes_button_rows() {
        let markup = ReplyKeyboardMarkup::from_rows(&[&["/select", "/sort"], &["/start"]]);
        let json = serde_json::to_value(&markup).expect("serialize");
        assert_eq!(json["keyboard"][0][0]["text"], "/select");
        assert_eq!(json["keyboard"][1][0]["text"], "/start");
        assert_eq!(json["resize_keyboard"], true);
        assert_eq!(json["one_time_keyboard"], true);
    }

    #[test]
    fn method_urls_embed_the_token_once() {
        let api = TelegramApi::new("https://api.telegram.org/", "123:abc");
        assert_eq!(api.method_root, "https://api.telegram.org/bot123:abc");
        assert_eq!(api.file_root, "https://api.telegram.org/file/bot123:abc");
    }
}
