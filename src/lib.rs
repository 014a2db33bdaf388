//! Telegram Session Manager Library
//!
//! This library provides tools to:
//! - Keep several Telegram accounts' credentials in one JSON session file
//! - Connect to a selected account and list its conversations
//! - Bulk-delete chats and channels, leave groups, or clear everything
//! - Send a message to a group and view unread-message statistics

pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod metrics;
pub mod session;

// Re-export common types
pub use client::{AccountClient, Connector, Dialog, DialogKind, EntityHandle, TelegramConnector};
pub use config::Config;
pub use console::{Console, TerminalConsole};
pub use error::{Error, Result};
pub use session::{JsonFileStore, MemoryStore, SessionRecord, SessionStorage};

// Commands module uses re-exported types, so it must be declared after the re-exports
pub mod commands;
