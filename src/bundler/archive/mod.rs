//! Write-only archive backends.
//!
//! The packager streams every file through the same five calls regardless of
//! the container format:
//!
//! 1. a backend is opened over an output sink ([`ArchiveOpener::open`]),
//! 2. [`ArchiveBackend::put_entry`] starts an entry,
//! 3. [`ArchiveBackend::write`] streams its content (any number of times),
//! 4. [`ArchiveBackend::close_entry`] ends it,
//! 5. [`ArchiveBackend::close`] finalizes the container and releases the sink.
//!
//! Exactly one entry is open between `put_entry` and `close_entry`; writes
//! outside that window are rejected with [`Error::EntryState`].
//!
//! The format is selected from the output file name by
//! [`ArchiveFormat::from_path`]. Resolving a format into an [`ArchiveOpener`]
//! locates any external codec it needs, so a missing codec is reported before
//! the output file is created.

mod bzip2;
mod tar;
mod zip;

pub use self::bzip2::{Bzip2Codec, Bzip2Pipe};
pub use self::tar::{ArchiveSink, TarBackend};
pub use self::zip::ZipBackend;

use crate::bundler::error::{Error, Result};
use flate2::{Compression, write::GzEncoder};
use std::{
    ffi::OsStr,
    fmt,
    fs::File,
    io::{BufWriter, ErrorKind, Read},
    path::Path,
};

/// Size of the buffer used to stream file content into an entry.
pub const BUFFER_SIZE: usize = 16 * 1024;

/// Permission mode for executable entries.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Permission mode for all other entries.
pub const REGULAR_MODE: u32 = 0o644;

/// Returns the entry mode for the executable flag.
pub fn entry_mode(executable: bool) -> u32 {
    if executable { EXECUTABLE_MODE } else { REGULAR_MODE }
}

/// Uniform write-only interface over one container format.
pub trait ArchiveBackend {
    /// Starts a new entry named `path` holding `size` bytes.
    fn put_entry(&mut self, path: &str, executable: bool, size: u64) -> Result<()>;

    /// Appends content to the open entry.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Ends the open entry.
    fn close_entry(&mut self) -> Result<()>;

    /// Finalizes container structure, flushes and releases the sink.
    fn close(self: Box<Self>) -> Result<()>;

    /// Streams `reader` to the end into the open entry.
    fn write_from(&mut self, reader: &mut dyn Read) -> Result<u64> {
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut total = 0u64;
        loop {
            let count = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(count) => count,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.write(&buffer[..count])?;
            total += count as u64;
        }
        Ok(total)
    }
}

/// Bookkeeping for the entry currently open in a backend.
#[derive(Debug)]
pub(crate) struct OpenEntry {
    pub(crate) path: String,
    pub(crate) size: u64,
    pub(crate) written: u64,
}

impl OpenEntry {
    pub(crate) fn new(path: &str, size: u64) -> Self {
        Self {
            path: path.to_string(),
            size,
            written: 0,
        }
    }

    /// Accounts for `len` more bytes, refusing to exceed the declared size.
    pub(crate) fn advance(&mut self, len: usize) -> Result<()> {
        let written = self.written + len as u64;
        if written > self.size {
            return Err(Error::EntryState(format!(
                "{}: wrote {} bytes into an entry declared as {} bytes",
                self.path, written, self.size
            )));
        }
        self.written = written;
        Ok(())
    }

    /// Checks that the declared size was written in full.
    pub(crate) fn finish(&self) -> Result<()> {
        if self.written != self.size {
            return Err(Error::EntryState(format!(
                "{}: entry declared as {} bytes but {} were written",
                self.path, self.size, self.written
            )));
        }
        Ok(())
    }
}

pub(crate) fn no_open_entry(operation: &str) -> Error {
    Error::EntryState(format!("{operation} called with no open entry"))
}

/// Archive container formats, selected by output file extension.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArchiveFormat {
    /// `.zip`
    Zip,
    /// `.tar`
    Tar,
    /// `.tar.gz` / `.tgz`
    TarGz,
    /// `.tar.bz2` / `.tbz`
    TarBz2,
}

impl ArchiveFormat {
    /// Maps an output path to its format by file name suffix.
    ///
    /// # Examples
    ///
    /// ```
    /// use fiji_packager::bundler::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::from_path("out/fiji.tgz").unwrap(), ArchiveFormat::TarGz);
    /// assert!(ArchiveFormat::from_path("fiji.rar").is_err());
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let format = if name.ends_with(".zip") {
            Self::Zip
        } else if name.ends_with(".tar") {
            Self::Tar
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Self::TarGz
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz") {
            Self::TarBz2
        } else {
            return Err(Error::UnsupportedArchiveFormat(path.to_path_buf()));
        };
        Ok(format)
    }

    /// Canonical extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
        }
    }

    /// Locates whatever the format needs to be written.
    ///
    /// # Errors
    ///
    /// [`Error::CodecUnavailable`] when the bzip2 codec cannot be found on
    /// `codec_search_path` (or `$PATH` when `None`).
    pub fn resolve(self, codec_search_path: Option<&OsStr>) -> Result<ArchiveOpener> {
        let bzip2 = match self {
            Self::TarBz2 => Some(Bzip2Codec::locate(codec_search_path)?),
            _ => None,
        };
        Ok(ArchiveOpener {
            format: self,
            bzip2,
        })
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A format whose codecs have been located; ready to open over a sink.
#[derive(Debug, Clone)]
pub struct ArchiveOpener {
    format: ArchiveFormat,
    bzip2: Option<Bzip2Codec>,
}

impl ArchiveOpener {
    /// The format this opener writes.
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Opens a backend writing into `sink`.
    pub fn open(&self, sink: File) -> Result<Box<dyn ArchiveBackend>> {
        let backend: Box<dyn ArchiveBackend> = match (self.format, &self.bzip2) {
            (ArchiveFormat::Zip, _) => Box::new(ZipBackend::new(BufWriter::new(sink))),
            (ArchiveFormat::Tar, _) => Box::new(TarBackend::new(BufWriter::new(sink))),
            (ArchiveFormat::TarGz, _) => Box::new(TarBackend::new(GzEncoder::new(
                BufWriter::new(sink),
                Compression::default(),
            ))),
            (ArchiveFormat::TarBz2, Some(codec)) => Box::new(TarBackend::new(codec.spawn(sink)?)),
            (ArchiveFormat::TarBz2, None) => {
                return Err(Error::CodecUnavailable {
                    codec: bzip2::CODEC,
                    reason: "codec was not located".into(),
                });
            }
        };
        log::debug!("Opened {} archive backend", self.format);
        Ok(backend)
    }
}
