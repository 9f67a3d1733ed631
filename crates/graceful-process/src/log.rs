//! Optional diagnostic sink

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Destination for human readable diagnostic messages.
///
/// Writes are best-effort; the controller ignores any error returned here and never
/// makes control decisions based on the sink.
pub trait LogSink: Send + Sync {
    /// Write a single message
    fn write_message(&self, message: &str) -> io::Result<()>;
}

impl<W: Write + Send> LogSink for Mutex<W> {
    fn write_message(&self, message: &str) -> io::Result<()> {
        let mut writer = self
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log sink poisoned"))?;
        writer.write_all(message.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn write_message(&self, message: &str) -> io::Result<()> {
        (**self).write_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn write_message(&self, _message: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_mutex_writer_appends_lines() {
        let sink = Mutex::new(Vec::new());
        sink.write_message("first").unwrap();
        sink.write_message("second").unwrap();

        let written = sink.into_inner().unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_arc_forwards() {
        let sink: Arc<dyn LogSink> = Arc::new(BrokenSink);
        assert!(sink.write_message("x").is_err());
    }
}
