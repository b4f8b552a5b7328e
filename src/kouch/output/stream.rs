//! Streaming transform shared by the structured output modes.
//!
//! A [`TransformSink`] starts out idle. The first non-empty write spawns one
//! worker thread connected through a bounded channel; the worker decodes the
//! entire byte stream as a single JSON value, then hands it to the mode's
//! [`Format`]. Writes block while the channel is full, so a slow formatter
//! slows the producer instead of buffering the whole response twice.
//!
//! [`Sink::finish`] closes the channel and waits for the worker, returning
//! its result. Nothing reaches the destination when decoding fails. Formats
//! render into memory before writing, so a formatter error also leaves the
//! destination untouched; only an I/O failure of the destination itself can
//! leave partial output behind. Such failures are reported as
//! [`KouchError::Write`].
//!
//! A sink dropped without `finish` disconnects the channel and detaches the
//! worker, which then runs to completion on whatever it had received.

use super::{Destination, Sink};
use crate::error::{KouchError, Result};
use serde_json::Value;
use std::io::{self, BufReader, Read, Write};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

/// Chunks the producer may queue before writes start blocking.
const CHANNEL_CAPACITY: usize = 16;

/// Serializes a decoded value for one output mode.
pub trait Format: Send + 'static {
    fn format(&self, value: &Value, out: &mut dyn Write) -> Result<()>;
}

enum State<F: Format> {
    Idle {
        format: F,
        dest: Destination,
    },
    Active {
        tx: SyncSender<Vec<u8>>,
        worker: JoinHandle<Result<()>>,
    },
    Closed,
}

pub struct TransformSink<F: Format> {
    state: State<F>,
}

impl<F: Format> TransformSink<F> {
    pub fn new(format: F, dest: Destination) -> Self {
        Self {
            state: State::Idle { format, dest },
        }
    }

    fn activate(&mut self) -> io::Result<()> {
        self.state = match std::mem::replace(&mut self.state, State::Closed) {
            State::Idle { format, dest } => {
                let (tx, rx) = sync_channel(CHANNEL_CAPACITY);
                let worker = thread::Builder::new()
                    .name("kouch-output".to_string())
                    .spawn(move || transform(format, rx, dest))?;
                tracing::debug!("output transform started");
                State::Active { tx, worker }
            }
            other => other,
        };
        Ok(())
    }
}

fn transform<F: Format>(format: F, rx: Receiver<Vec<u8>>, mut dest: Destination) -> Result<()> {
    let reader = BufReader::new(ChannelReader::new(rx));
    let value: Value = serde_json::from_reader(reader)?;
    format.format(&value, &mut dest).map_err(KouchError::on_write)?;
    dest.flush().map_err(KouchError::Write)
}

impl<F: Format> Write for TransformSink<F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.activate()?;
        match &self.state {
            State::Active { tx, .. } => {
                tx.send(buf.to_vec()).map_err(|_| {
                    io::Error::new(io::ErrorKind::BrokenPipe, "output transform stopped")
                })?;
                Ok(buf.len())
            }
            _ => Err(io::Error::other("output sink is closed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<F: Format> Sink for TransformSink<F> {
    fn finish(self: Box<Self>) -> Result<()> {
        match self.state {
            State::Idle { .. } | State::Closed => Ok(()),
            State::Active { tx, worker } => {
                drop(tx);
                worker
                    .join()
                    .map_err(|_| KouchError::Output("output transform panicked".to_string()))?
            }
        }
    }
}

/// Reads the chunks sent over a channel as one contiguous stream. The stream
/// ends when every sender is gone.
struct ChannelReader {
    rx: Receiver<Vec<u8>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl ChannelReader {
    fn new(rx: Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            chunk: Vec::new(),
            pos: 0,
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.chunk.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.chunk.len() - self.pos);
        buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
