//! External bzip2 codec.
//!
//! Bzip2 output is produced by piping the tar stream through the `bzip2`
//! program. The program is optional: when it cannot be located the `.tar.bz2`
//! format is unavailable and resolving it fails with
//! [`Error::CodecUnavailable`].

use crate::bundler::error::{Context, Error, ErrorExt, Result};
use std::{
    ffi::OsStr,
    fs::File,
    io::{self, Write},
    path::PathBuf,
    process::{Child, ChildStdin, Command, Stdio},
};

/// Program name of the codec.
pub(crate) const CODEC: &str = "bzip2";

/// A located `bzip2` executable.
#[derive(Debug, Clone)]
pub struct Bzip2Codec {
    program: PathBuf,
}

impl Bzip2Codec {
    /// Locates `bzip2` on `search_path`, or on `$PATH` when `None`.
    pub fn locate(search_path: Option<&OsStr>) -> Result<Self> {
        let found = match search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(CODEC, Some(paths), cwd)
            }
            None => which::which(CODEC),
        };

        match found {
            Ok(program) => {
                log::debug!("Found {} at: {}", CODEC, program.display());
                Ok(Self { program })
            }
            Err(e) => {
                log::debug!("{} not found: {}", CODEC, e);
                Err(Error::CodecUnavailable {
                    codec: CODEC,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Starts the codec compressing into `sink`.
    pub fn spawn(&self, sink: File) -> Result<Bzip2Pipe> {
        let mut child = Command::new(&self.program)
            .args(["-c", "-9"])
            .stdin(Stdio::piped())
            .stdout(Stdio::from(sink))
            .stderr(Stdio::piped())
            .spawn()
            .fs_context("starting compression codec", &self.program)?;
        let stdin = child.stdin.take().context("bzip2 codec has no stdin")?;
        Ok(Bzip2Pipe {
            child,
            stdin: Some(stdin),
        })
    }
}

/// Write end of a running bzip2 codec.
#[derive(Debug)]
pub struct Bzip2Pipe {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl Bzip2Pipe {
    /// Closes the codec input and waits for it to finish the output.
    pub fn finish(mut self) -> io::Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.flush()?;
        }
        let output = self.child.wait_with_output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "bzip2 exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn stdin(&mut self) -> io::Result<&mut ChildStdin> {
        self.stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "bzip2 input already closed"))
    }
}

impl Write for Bzip2Pipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdin()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdin()?.flush()
    }
}
