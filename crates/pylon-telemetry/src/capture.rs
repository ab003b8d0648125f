//! In-memory log capture for tests.
//!
//! ```
//! use pylon_telemetry::CapturedLogs;
//!
//! let logs = CapturedLogs::new();
//! tracing::subscriber::with_default(logs.json_subscriber(), || {
//!     tracing::warn!(request_id = "abc", "slow request");
//! });
//! assert!(logs.contents().contains("slow request"));
//! ```

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// A shared buffer that log output is written into.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Returns the captured output split into lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Discards captured output.
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    /// Builds a JSON subscriber at `TRACE` level that writes into this buffer.
    ///
    /// Use with `tracing::subscriber::with_default` or `set_default`.
    #[must_use]
    pub fn json_subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(self.clone())
            .finish()
    }
}

/// Writer handed out by [`CapturedLogs`].
#[derive(Debug)]
pub struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_json_lines() {
        let logs = CapturedLogs::new();
        tracing::subscriber::with_default(logs.json_subscriber(), || {
            tracing::error!(error = "boom", "request failed");
        });

        let lines = logs.lines();
        assert_eq!(lines.len(), 1);
        let line: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(line["fields"]["error"], "boom");
        assert_eq!(line["level"], "ERROR");
    }

    #[test]
    fn test_clear() {
        let logs = CapturedLogs::new();
        tracing::subscriber::with_default(logs.json_subscriber(), || {
            tracing::info!("one");
        });
        logs.clear();
        assert!(logs.contents().is_empty());
    }
}
