//! Shared output layer: every command renders either human-readable text or
//! stable JSON, selected by the global `--json` flag.
//!
//! Command handlers build a `Serialize` payload and pass a closure for the
//! human rendering:
//!
//! ```ignore
//! render(mode, &payload, |p, w| writeln!(w, "{} rows", p.rows))
//! ```

use serde::Serialize;
use std::io::{self, Write};

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable pretty-printed JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render `payload` to stdout: pretty JSON, or through the human formatter.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn render<T: Serialize>(
    mode: OutputMode,
    payload: &T,
    human: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut w = stdout.lock();

    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut w, payload)?;
            writeln!(w)?;
        }
        OutputMode::Human => human(payload, &mut w)?,
    }

    Ok(())
}
