//! # elitechlog-core
//!
//! Presents one logical data-logger session over the COM and USB adapters.
//!
//! ## Key Types
//!
//! - [`SessionCoordinator`] - Owns the adapters and runs the event loop
//! - [`SessionHandle`] - Issues commands and stops the loop from anywhere
//! - [`SessionListener`] - Receives connect, download and disconnect notifications
//! - [`SettingsChange`] - Validated configuration edits for the bound device

mod coordinator;
mod error;
mod listener;
mod settings;

pub use coordinator::{SessionCoordinator, SessionHandle};
pub use error::{SessionError, ValidationError};
pub use listener::SessionListener;
pub use settings::{check_resettable, SettingsChange};
