//! # Bot Module
//!
//! The async half of bibliofi: the [`ChatTransport`] contract, its Telegram
//! Bot API implementation, and the [`Dispatcher`] that pumps updates from
//! the transport into the pure conversation router.

pub mod dispatcher;
pub mod telegram;
pub mod transport;

pub use dispatcher::{Dispatcher, handle_update};
pub use telegram::{DEFAULT_API_URL, TelegramApi};
pub use transport::{
    BotIdentity, ChatTransport, IncomingDocument, IncomingMessage, TransportError, Update,
};
