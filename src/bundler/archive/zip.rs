//! Zip backend.

use super::{ArchiveBackend, OpenEntry, entry_mode, no_open_entry};
use crate::bundler::error::{Error, Result};
use ::zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};
use std::io::{Seek, Write};

/// Writes a zip archive entry by entry.
///
/// Entries are deflated; executable entries get Unix mode `0755`, all others
/// `0644`. Entries whose declared size needs ZIP64 are flagged up front.
pub struct ZipBackend<W: Write + Seek> {
    writer: ZipWriter<W>,
    entry: Option<OpenEntry>,
}

impl<W: Write + Seek> ZipBackend<W> {
    /// Starts a zip archive over `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            writer: ZipWriter::new(sink),
            entry: None,
        }
    }
}

impl<W: Write + Seek> ArchiveBackend for ZipBackend<W> {
    fn put_entry(&mut self, path: &str, executable: bool, size: u64) -> Result<()> {
        if let Some(open) = &self.entry {
            return Err(Error::EntryState(format!(
                "cannot start {path} while {} is still open",
                open.path
            )));
        }
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(entry_mode(executable))
            .large_file(size >= u64::from(u32::MAX));
        self.writer.start_file(path, options)?;
        self.entry = Some(OpenEntry::new(path, size));
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let entry = self.entry.as_mut().ok_or_else(|| no_open_entry("write"))?;
        entry.advance(buf.len())?;
        self.writer.write_all(buf)?;
        Ok(())
    }

    fn close_entry(&mut self) -> Result<()> {
        let entry = self.entry.take().ok_or_else(|| no_open_entry("close_entry"))?;
        entry.finish()
    }

    fn close(self: Box<Self>) -> Result<()> {
        let this = *self;
        if let Some(open) = &this.entry {
            return Err(Error::EntryState(format!(
                "archive closed while {} is still open",
                open.path
            )));
        }
        let mut sink = this.writer.finish()?;
        sink.flush()?;
        Ok(())
    }
}
