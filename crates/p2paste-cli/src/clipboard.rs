//! Clipboard backends that shell out to platform tools.

use std::{
    io::{ErrorKind, Write},
    process::{Command, Stdio},
};

use p2paste_app::{Clipboard, ClipboardError, CopyLink};

/// Clipboard backed by an external program reading the text on stdin.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    name: &'static str,
    program: &'static str,
    args: &'static [&'static str],
}

impl CommandClipboard {
    /// Backend running `program` with `args`.
    pub const fn new(
        name: &'static str,
        program: &'static str,
        args: &'static [&'static str],
    ) -> Self {
        Self { name, program, args }
    }

    /// Wayland.
    pub const fn wayland() -> Self {
        Self::new("wl-copy", "wl-copy", &[])
    }

    /// X11.
    pub const fn x11() -> Self {
        Self::new("xclip", "xclip", &["-selection", "clipboard"])
    }

    /// macOS.
    pub const fn macos() -> Self {
        Self::new("pbcopy", "pbcopy", &[])
    }
}

impl Clipboard for CommandClipboard {
    fn name(&self) -> &'static str {
        self.name
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let failed = |reason: String| ClipboardError::Failed { reason };

        let mut child = Command::new(self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ClipboardError::Unavailable,
                _ => failed(e.to_string()),
            })?;

        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(text.as_bytes())
        {
            // Close the pipe and reap the tool before reporting.
            drop(stdin);
            let _ = child.kill();
            let _ = child.wait();
            return Err(failed(format!("{}: {e}", self.program)));
        }

        let status = child.wait().map_err(|e| failed(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(failed(format!("{} exited with {status}", self.program)))
        }
    }
}

/// Fallback chain of the platform clipboard tools.
pub fn system_chain() -> CopyLink {
    CopyLink::new()
        .with(CommandClipboard::wayland())
        .with(CommandClipboard::x11())
        .with(CommandClipboard::macos())
}
