//! Command-line front end for p2paste.
//!
//! Creates and checks room links, and runs a simulated room in-process to
//! show the synchronization protocol end to end.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod clipboard;
pub mod commands;
mod error;
pub mod system_env;

pub use clipboard::{CommandClipboard, system_chain};
pub use commands::{DemoOptions, demo, join_room, new_room, room_link};
pub use error::CliError;
pub use system_env::SystemEnv;
