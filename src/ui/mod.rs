//! User interface module - formatted status output.
//!
//! - `formatter` - Styled one-line messages and plan rendering
//! - This module - A line sink that forwards subprocess output to stdout

use std::io::{self, Write};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_error, display_header, display_plan, display_status, display_success,
    display_warning, format_configure_summary, format_plan,
};

/// Writer handed to long-running steps; every write goes straight to stdout
///
/// Stdout is line buffered only when attached to a terminal, so each write is
/// flushed to keep output flowing when piped into a container log.
pub struct StdoutSink {
    stdout: io::Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        StdoutSink {
            stdout: io::stdout(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        StdoutSink::new()
    }
}

impl Write for StdoutSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = self.stdout.lock();
        let written = out.write(buf)?;
        out.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.lock().flush()
    }
}
