//! Tar backend, optionally wrapped in a compressing sink.

use super::{ArchiveBackend, Bzip2Pipe, OpenEntry, entry_mode, no_open_entry};
use crate::bundler::error::{Error, Result};
use ::tar::{Builder, EntryType, Header};
use flate2::write::GzEncoder;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    time::{SystemTime, UNIX_EPOCH},
};

/// Longest name that fits in a tar header without a GNU long-name record.
const NAME_FIELD_LEN: usize = 100;

const BLOCK_SIZE: u64 = 512;

const LONG_NAME_ENTRY: &str = "././@LongLink";

/// Output sink of a tar stream that needs an explicit final flush.
pub trait ArchiveSink: Write {
    /// Flushes everything and releases the underlying output.
    fn finish(self) -> io::Result<()>;
}

impl ArchiveSink for BufWriter<File> {
    fn finish(self) -> io::Result<()> {
        let file = self.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()
    }
}

impl<W: ArchiveSink> ArchiveSink for GzEncoder<W> {
    fn finish(self) -> io::Result<()> {
        GzEncoder::finish(self)?.finish()
    }
}

impl ArchiveSink for Bzip2Pipe {
    fn finish(self) -> io::Result<()> {
        Bzip2Pipe::finish(self)
    }
}

impl ArchiveSink for Vec<u8> {
    fn finish(self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes a tar stream entry by entry into an [`ArchiveSink`].
///
/// Headers carry the entry size and mode `0755`/`0644`; names longer than
/// the header field are preceded by a GNU long-name record.
pub struct TarBackend<S: ArchiveSink> {
    builder: Builder<S>,
    entry: Option<OpenEntry>,
    mtime: u64,
}

impl<S: ArchiveSink> TarBackend<S> {
    /// Starts a tar stream over `sink`.
    pub fn new(sink: S) -> Self {
        let mtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            builder: Builder::new(sink),
            entry: None,
            mtime,
        }
    }

    fn header_for(&mut self, path: &str, executable: bool, size: u64) -> Result<Header> {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(size);
        header.set_mode(entry_mode(executable));
        header.set_mtime(self.mtime);

        if path.len() <= NAME_FIELD_LEN {
            header.set_path(path)?;
        } else {
            self.append_long_name(path)?;
            let bytes = path.as_bytes();
            header.as_old_mut().name.copy_from_slice(&bytes[..NAME_FIELD_LEN]);
        }
        header.set_cksum();
        Ok(header)
    }

    fn append_long_name(&mut self, path: &str) -> Result<()> {
        let mut data = path.as_bytes().to_vec();
        data.push(0);

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::GNULongName);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(self.mtime);
        let name = LONG_NAME_ENTRY.as_bytes();
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_cksum();

        let sink = self.builder.get_mut();
        sink.write_all(header.as_bytes())?;
        sink.write_all(&data)?;
        self.pad(data.len() as u64)
    }

    /// Fills the last block of a `len`-byte entry with zeros.
    fn pad(&mut self, len: u64) -> Result<()> {
        let remainder = len % BLOCK_SIZE;
        if remainder != 0 {
            let padding = [0u8; BLOCK_SIZE as usize];
            self.builder
                .get_mut()
                .write_all(&padding[..(BLOCK_SIZE - remainder) as usize])?;
        }
        Ok(())
    }
}

impl<S: ArchiveSink> ArchiveBackend for TarBackend<S> {
    fn put_entry(&mut self, path: &str, executable: bool, size: u64) -> Result<()> {
        if let Some(open) = &self.entry {
            return Err(Error::EntryState(format!(
                "cannot start {path} while {} is still open",
                open.path
            )));
        }
        let header = self.header_for(path, executable, size)?;
        self.builder.get_mut().write_all(header.as_bytes())?;
        self.entry = Some(OpenEntry::new(path, size));
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let entry = self.entry.as_mut().ok_or_else(|| no_open_entry("write"))?;
        entry.advance(buf.len())?;
        self.builder.get_mut().write_all(buf)?;
        Ok(())
    }

    fn close_entry(&mut self) -> Result<()> {
        let entry = self.entry.take().ok_or_else(|| no_open_entry("close_entry"))?;
        entry.finish()?;
        self.pad(entry.size)
    }

    fn close(self: Box<Self>) -> Result<()> {
        let this = *self;
        if let Some(open) = &this.entry {
            return Err(Error::EntryState(format!(
                "archive closed while {} is still open",
                open.path
            )));
        }
        let sink = this.builder.into_inner()?;
        sink.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_entries(data: &[u8]) -> Vec<(String, u32, Vec<u8>)> {
        let mut archive = ::tar::Archive::new(data);
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let path = entry.path().unwrap().to_string_lossy().into_owned();
                let mode = entry.header().mode().unwrap();
                let mut content = Vec::new();
                entry.read_to_end(&mut content).unwrap();
                (path, mode, content)
            })
            .collect()
    }

    fn finish_into_vec(backend: TarBackend<Vec<u8>>) -> Vec<u8> {
        backend.builder.into_inner().unwrap()
    }

    #[test]
    fn entries_carry_size_and_mode() {
        let mut backend = TarBackend::new(Vec::new());
        backend.put_entry("Fiji.app/ImageJ", true, 5).unwrap();
        backend.write(b"he").unwrap();
        backend.write(b"llo").unwrap();
        backend.close_entry().unwrap();
        backend.put_entry("Fiji.app/db.xml.gz", false, 0).unwrap();
        backend.close_entry().unwrap();

        let entries = read_entries(&finish_into_vec(backend));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "Fiji.app/ImageJ");
        assert_eq!(entries[0].1 & 0o777, 0o755);
        assert_eq!(entries[0].2, b"hello");
        assert_eq!(entries[1].0, "Fiji.app/db.xml.gz");
        assert_eq!(entries[1].1 & 0o777, 0o644);
        assert!(entries[1].2.is_empty());
    }

    #[test]
    fn long_names_survive() {
        let long = format!("Fiji.app/java/linux-amd64/{}/jre/lib/rt.jar", "x".repeat(120));
        let mut backend = TarBackend::new(Vec::new());
        backend.put_entry(&long, false, 3).unwrap();
        backend.write(b"abc").unwrap();
        backend.close_entry().unwrap();

        let entries = read_entries(&finish_into_vec(backend));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, long);
        assert_eq!(entries[0].2, b"abc");
    }

    #[test]
    fn writes_outside_an_entry_are_rejected() {
        let mut backend = TarBackend::new(Vec::new());
        assert!(matches!(backend.write(b"x"), Err(Error::EntryState(_))));
        assert!(matches!(backend.close_entry(), Err(Error::EntryState(_))));
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let mut backend = TarBackend::new(Vec::new());
        backend.put_entry("a", false, 2).unwrap();
        assert!(matches!(backend.write(b"abc"), Err(Error::EntryState(_))));

        let mut backend = TarBackend::new(Vec::new());
        backend.put_entry("a", false, 2).unwrap();
        backend.write(b"a").unwrap();
        assert!(matches!(backend.close_entry(), Err(Error::EntryState(_))));
    }

    #[test]
    fn second_entry_needs_the_first_closed() {
        let mut backend = TarBackend::new(Vec::new());
        backend.put_entry("a", false, 0).unwrap();
        assert!(matches!(
            backend.put_entry("b", false, 0),
            Err(Error::EntryState(_))
        ));
    }

    #[test]
    fn gzip_sink_round_trips() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.tar.gz");
        let sink = GzEncoder::new(
            BufWriter::new(File::create(&path).unwrap()),
            flate2::Compression::default(),
        );
        let mut backend: Box<dyn ArchiveBackend> = Box::new(TarBackend::new(sink));
        backend.put_entry("Fiji.app/a.txt", false, 1).unwrap();
        backend.write(b"a").unwrap();
        backend.close_entry().unwrap();
        backend.close().unwrap();

        let mut data = Vec::new();
        flate2::read::GzDecoder::new(File::open(&path).unwrap())
            .read_to_end(&mut data)
            .unwrap();
        let entries = read_entries(&data);
        assert_eq!(entries[0].0, "Fiji.app/a.txt");
    }
}
