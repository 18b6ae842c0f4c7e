//! Cassette interface.
//!
//! The tape is a relay-switched byte stream: port 7 bit 7 powers the deck,
//! and the first transfer after power-on decides the direction. The stream
//! itself is an abstract capability ([`TapeMedia`]) so the machine can run
//! against a real file or an in-memory reel under test. I/O failures are
//! never surfaced to the CPU; the deck drops back to idle and reads return
//! 0x00.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Default tape file name, opened in the working directory.
pub const TAPE_FILE: &str = "TAPE";

/// Current mode of the tape stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapeStatus {
    Idle,
    Reading,
    Writing,
}

/// Byte-stream capability backing the deck.
pub trait TapeMedia {
    fn open_read(&mut self) -> std::io::Result<()>;
    fn open_append(&mut self) -> std::io::Result<()>;
    /// `Ok(None)` at end of stream.
    fn read_byte(&mut self) -> std::io::Result<Option<u8>>;
    fn append_byte(&mut self, value: u8) -> std::io::Result<()>;
    fn close(&mut self);
}

/// Tape stream backed by a file (read from the start, append for writes).
pub struct FileTape {
    path: PathBuf,
    file: Option<File>,
}

impl FileTape {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }
}

impl Default for FileTape {
    fn default() -> Self {
        Self::new(TAPE_FILE)
    }
}

impl TapeMedia for FileTape {
    fn open_read(&mut self) -> std::io::Result<()> {
        self.file = Some(File::open(&self.path)?);
        Ok(())
    }

    fn open_append(&mut self) -> std::io::Result<()> {
        self.file = Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?,
        );
        Ok(())
    }

    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };
        let mut byte = [0u8; 1];
        match file.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    fn append_byte(&mut self, value: u8) -> std::io::Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        file.write_all(&[value])
    }

    fn close(&mut self) {
        self.file = None;
    }
}

/// In-memory reel used by tests and headless runs.
#[derive(Default)]
pub struct MemoryTape {
    data: Vec<u8>,
    pos: usize,
}

impl MemoryTape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl TapeMedia for MemoryTape {
    fn open_read(&mut self) -> std::io::Result<()> {
        self.pos = 0;
        Ok(())
    }

    fn open_append(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn append_byte(&mut self, value: u8) -> std::io::Result<()> {
        self.data.push(value);
        Ok(())
    }

    fn close(&mut self) {}
}

/// The deck: stream status plus the media it drives.
///
/// The stream opens lazily on the first transfer while the relay is up and
/// closes deterministically when the relay drops ([`TapeDeck::stop`]).
pub struct TapeDeck {
    status: TapeStatus,
    media: Box<dyn TapeMedia>,
}

impl TapeDeck {
    pub fn new(media: Box<dyn TapeMedia>) -> Self {
        Self {
            status: TapeStatus::Idle,
            media,
        }
    }

    pub fn status(&self) -> TapeStatus {
        self.status
    }

    /// Read one byte, opening the stream for reading if idle.
    /// End of stream and I/O failures both read as 0x00.
    pub fn read_byte(&mut self) -> u8 {
        if self.status == TapeStatus::Idle {
            match self.media.open_read() {
                Ok(()) => self.status = TapeStatus::Reading,
                Err(e) => {
                    log::warn!("tape: cannot open for reading: {e}");
                    return 0x00;
                }
            }
        }
        if self.status != TapeStatus::Reading {
            return 0x00;
        }
        match self.media.read_byte() {
            Ok(Some(byte)) => byte,
            Ok(None) => 0x00,
            Err(e) => {
                log::warn!("tape: read failed: {e}");
                self.stop();
                0x00
            }
        }
    }

    /// Write one byte, opening the stream for appending if idle.
    pub fn write_byte(&mut self, value: u8) {
        if self.status == TapeStatus::Idle {
            match self.media.open_append() {
                Ok(()) => self.status = TapeStatus::Writing,
                Err(e) => {
                    log::warn!("tape: cannot open for writing: {e}");
                    return;
                }
            }
        }
        if self.status != TapeStatus::Writing {
            return;
        }
        if let Err(e) = self.media.append_byte(value) {
            log::warn!("tape: write failed: {e}");
            self.stop();
        }
    }

    /// Close the stream and return to idle. Called on relay drop.
    pub fn stop(&mut self) {
        if self.status != TapeStatus::Idle {
            self.media.close();
            self.status = TapeStatus::Idle;
        }
    }
}

impl Default for TapeDeck {
    fn default() -> Self {
        Self::new(Box::<FileTape>::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryTape, TapeDeck, TapeStatus};

    #[test]
    fn read_opens_lazily_and_hits_eof() {
        let mut deck = TapeDeck::new(Box::new(MemoryTape::with_data(vec![0xaa, 0xbb])));
        assert_eq!(deck.status(), TapeStatus::Idle);
        assert_eq!(deck.read_byte(), 0xaa);
        assert_eq!(deck.status(), TapeStatus::Reading);
        assert_eq!(deck.read_byte(), 0xbb);
        assert_eq!(deck.read_byte(), 0x00);
        assert_eq!(deck.read_byte(), 0x00);
    }

    #[test]
    fn write_then_rewind_reads_back() {
        let mut deck = TapeDeck::new(Box::new(MemoryTape::new()));
        deck.write_byte(0x11);
        deck.write_byte(0x22);
        assert_eq!(deck.status(), TapeStatus::Writing);
        deck.stop();
        assert_eq!(deck.status(), TapeStatus::Idle);
        assert_eq!(deck.read_byte(), 0x11);
        assert_eq!(deck.read_byte(), 0x22);
        assert_eq!(deck.read_byte(), 0x00);
    }

    #[test]
    fn reads_while_writing_yield_zero() {
        let mut deck = TapeDeck::new(Box::new(MemoryTape::new()));
        deck.write_byte(0x7e);
        assert_eq!(deck.read_byte(), 0x00);
        assert_eq!(deck.status(), TapeStatus::Writing);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut deck = TapeDeck::new(Box::new(MemoryTape::new()));
        deck.stop();
        assert_eq!(deck.status(), TapeStatus::Idle);
        deck.write_byte(0x01);
        deck.stop();
        deck.stop();
        assert_eq!(deck.status(), TapeStatus::Idle);
    }
}
