//! Reader for the updater database (`db.xml.gz`).
//!
//! The database is a gzip-compressed `pluginRecords` document:
//!
//! ```xml
//! <pluginRecords>
//!   <plugin filename="lib/linux64/libfoo.so">
//!     <platform>linux64</platform>
//!     <version checksum="…" timestamp="…" filesize="…"/>
//!   </plugin>
//!   <plugin filename="plugins/Old.jar">
//!     <previous-version checksum="…" timestamp="…"/>
//!   </plugin>
//! </pluginRecords>
//! ```
//!
//! Only what packaging needs is kept: file name, declared platforms, and the
//! checksum of the current version (records without one are obsolete).

use crate::bundler::error::{ErrorExt, Result};
use flate2::read::GzDecoder;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{
    collections::BTreeSet,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// File name of the database, relative to the bundle root.
pub const DATABASE: &str = "db.xml.gz";

/// One `<plugin>` record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Root-relative file name.
    pub filename: String,
    /// Declared platform affinity; empty means every platform.
    pub platforms: BTreeSet<String>,
    /// Checksum of the current version, `None` for obsolete records.
    pub checksum: Option<String>,
}

impl Record {
    fn new(filename: String) -> Self {
        Self {
            filename,
            ..Default::default()
        }
    }

    /// Whether the record has no current version.
    pub fn is_obsolete(&self) -> bool {
        self.checksum.is_none()
    }
}

/// Reads the database of the bundle at `root`.
///
/// Returns `Ok(None)` when the bundle has no database.
pub fn read(root: &Path) -> Result<Option<Vec<Record>>> {
    let path = root.join(DATABASE);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).fs_context("opening registry database", &path),
    };
    let records = parse(BufReader::new(GzDecoder::new(file)))?;
    log::debug!("Read {} records from {}", records.len(), path.display());
    Ok(Some(records))
}

/// Parses an uncompressed database document.
pub fn parse<R: BufRead>(input: R) -> Result<Vec<Record>> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut records = Vec::new();
    let mut current: Option<Record> = None;
    let mut in_platform = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"plugin" => current = Some(Record::new(required_filename(&e)?)),
                b"platform" => in_platform = true,
                b"version" => record_version(current.as_mut(), &e)?,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"plugin" => records.push(Record::new(required_filename(&e)?)),
                b"version" => record_version(current.as_mut(), &e)?,
                _ => {}
            },
            Event::Text(text) if in_platform => {
                if let Some(record) = current.as_mut() {
                    let platform = text.unescape()?;
                    let platform = platform.trim();
                    if !platform.is_empty() {
                        record.platforms.insert(platform.to_string());
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"plugin" => records.extend(current.take()),
                b"platform" => in_platform = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn record_version(record: Option<&mut Record>, element: &BytesStart<'_>) -> Result<()> {
    if let Some(record) = record {
        record.checksum = Some(attribute(element, b"checksum")?.unwrap_or_default());
    }
    Ok(())
}

fn required_filename(element: &BytesStart<'_>) -> Result<String> {
    match attribute(element, b"filename")? {
        Some(filename) if !filename.is_empty() => Ok(filename),
        _ => crate::bail!("registry record without a filename"),
    }
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::Error;
    use flate2::{Compression, write::GzEncoder};
    use std::io::Write;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pluginRecords>
  <update-site name="ImageJ" url="https://update.imagej.net/" timestamp="20130101000000"/>
  <plugin filename="lib/linux64/libfoo.so">
    <platform>linux64</platform>
    <version checksum="abc" timestamp="20130101000000" filesize="3"/>
  </plugin>
  <plugin filename="jars/ij.jar">
    <version checksum="def" timestamp="20130101000000" filesize="5">
      <description>ImageJ &amp; friends</description>
    </version>
  </plugin>
  <plugin filename="plugins/Old.jar">
    <previous-version checksum="123" timestamp="20100101000000"/>
  </plugin>
  <plugin filename="misc/Empty.txt"/>
</pluginRecords>
"#;

    #[test]
    fn parses_records() {
        let records = parse(DOCUMENT.as_bytes()).unwrap();
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].filename, "lib/linux64/libfoo.so");
        assert!(records[0].platforms.contains("linux64"));
        assert_eq!(records[0].checksum.as_deref(), Some("abc"));

        assert_eq!(records[1].filename, "jars/ij.jar");
        assert!(records[1].platforms.is_empty());
        assert_eq!(records[1].checksum.as_deref(), Some("def"));

        assert!(records[2].is_obsolete());
        assert_eq!(records[3].filename, "misc/Empty.txt");
    }

    #[test]
    fn missing_database_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        assert!(read(temp.path()).unwrap().is_none());
    }

    #[test]
    fn reads_compressed_database() {
        let temp = tempfile::tempdir().unwrap();
        let mut encoder = GzEncoder::new(
            File::create(temp.path().join(DATABASE)).unwrap(),
            Compression::default(),
        );
        encoder.write_all(DOCUMENT.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let records = read(temp.path()).unwrap().unwrap();
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn record_without_filename_is_rejected() {
        let err = parse("<pluginRecords><plugin/></pluginRecords>".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::GenericError(_)));
        let err = parse(r#"<pluginRecords><plugin filename=""/></pluginRecords>"#.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::GenericError(_)));
    }
}
