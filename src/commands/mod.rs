//! Command implementations
//!
//! The interactive flow is split by layer:
//! - `intake`: collecting credentials for a new account
//! - `actions`: the per-menu-option handlers
//! - `menu`: option table and dispatch for one connected session
//! - `manager`: the top-level session selection loop

pub mod actions;
pub mod intake;
pub mod manager;
pub mod menu;

// Re-export commonly used types
pub use actions::{BulkReport, InteractionStats, ItemFailure, SendReport};
pub use intake::add_new_session;
pub use manager::run;
pub use menu::{manage_session, MenuOption};
