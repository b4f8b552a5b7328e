use super::{Destination, OutputFlags, OutputMode, Sink};
use crate::error::{KouchError, Result};
use std::io::{self, Write};

/// Writes response bytes exactly as received.
pub struct RawMode;

impl OutputMode for RawMode {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn description(&self) -> &'static str {
        "the response body, unmodified"
    }

    fn new_sink(&self, _flags: &OutputFlags, dest: Destination) -> Result<Box<dyn Sink>> {
        Ok(Box::new(RawSink::new(dest)))
    }
}

pub struct RawSink {
    dest: Destination,
}

impl RawSink {
    pub fn new(dest: Destination) -> Self {
        Self { dest }
    }
}

impl Write for RawSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.dest.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.dest.flush()
    }
}

impl Sink for RawSink {
    fn finish(mut self: Box<Self>) -> Result<()> {
        self.dest.flush().map_err(KouchError::Write)
    }
}
