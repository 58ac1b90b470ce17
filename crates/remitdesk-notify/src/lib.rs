//! Best-effort requester notifications over the Telegram Bot API.
//!
//! A successful submission produces exactly one outbound `sendMessage` call.
//! The call runs as a detached task after the submission is committed; its
//! outcome is logged and never reported back to the HTTP caller.
//!
//! # Example
//!
//! ```no_run
//! use remitdesk_notify::{ClientConfig, RecipientId, TelegramNotifier};
//!
//! # fn example() -> remitdesk_notify::Result<()> {
//! let notifier = TelegramNotifier::new(ClientConfig {
//!     bot_token: "123456:ABC".to_string(),
//!     ..Default::default()
//! })?;
//!
//! // Fire-and-forget: the handle may be dropped.
//! let _ = notifier.dispatch(RecipientId::Chat(42), "Your request was received".to_string());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;

pub use client::{ClientConfig, RecipientId, TelegramNotifier, DEFAULT_API_BASE};
pub use error::{NotifyError, Result};
