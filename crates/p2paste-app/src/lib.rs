//! Application layer for p2paste
//!
//! Pure state machines and a generic runtime that decide when a room session
//! runs relative to the hosting page, and glue the shared document to a text
//! control. The same code runs in production and in deterministic simulation.
//!
//! # Components
//!
//! - [`Lifecycle`]: starts and stops one [`p2paste_core::RoomSession`] per
//!   page view (idle gating, duplicate-start suppression, page-hide teardown)
//! - [`TextBinding`]: two-way glue between the document and a text control
//! - [`JoinForm`]: hand-typed room link entry
//! - [`CopyLink`]: clipboard writes with fallbacks
//! - [`Driver`]: trait for platform-specific I/O
//! - [`Runtime`]: generic orchestration loop using a Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod binding;
mod clipboard;
mod config;
mod driver;
mod error;
mod event;
mod join;
mod lifecycle;
mod runtime;
mod state;

pub use action::{LifecycleAction, TransportCommand};
pub use binding::TextBinding;
pub use clipboard::{Clipboard, CopyLink, CopyOutcome, MemoryClipboard};
pub use config::{DEFAULT_SETTLE_DELAY, DEFAULT_SIGNALING, LifecycleConfig};
pub use driver::Driver;
pub use error::{ClipboardError, JoinError, LifecycleError};
pub use event::{LifecycleEvent, StartTicket};
pub use join::{CODE_MAX_LEN, JoinForm};
pub use lifecycle::{Lifecycle, PendingStart, Phase, SessionHandle};
pub use runtime::Runtime;
pub use state::{ConnectionStatus, RoomView};
