//! Console output for the packager.
//!
//! [`OutputManager`] is the CLI's [`Progress`] sink. On a terminal it draws
//! an `indicatif` bar; otherwise it prints the phase title followed by one
//! dot per file, which keeps CI logs readable.

use crate::bundler::Progress;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};

const BAR_TEMPLATE: &str = "{prefix:14} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg:.dim}";

/// Writes progress and diagnostics to stderr.
pub struct OutputManager {
    interactive: bool,
    quiet: bool,
    title: String,
    bar: Option<ProgressBar>,
}

impl std::fmt::Debug for OutputManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputManager")
            .field("interactive", &self.interactive)
            .field("quiet", &self.quiet)
            .field("title", &self.title)
            .field("bar", &self.bar.as_ref().map(|_| "<ProgressBar>"))
            .finish()
    }
}

impl OutputManager {
    /// Creates an output manager.
    ///
    /// `interactive` selects the progress bar over dots; `quiet` suppresses
    /// progress entirely but still reports errors.
    pub fn new(interactive: bool, quiet: bool) -> Self {
        Self {
            interactive,
            quiet,
            title: String::new(),
            bar: None,
        }
    }

    /// Picks the bar when stderr is a terminal.
    pub fn detect(quiet: bool) -> Self {
        Self::new(io::stderr().is_terminal(), quiet)
    }

    /// Prints an error line.
    pub fn error(&self, message: &str) -> io::Result<()> {
        self.clear_bar();
        writeln!(io::stderr().lock(), "{message}")
    }

    /// Prints a warning line unless quiet.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.clear_bar();
        writeln!(io::stderr().lock(), "Warning: {message}")
    }

    /// Prints a status line unless quiet.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(io::stderr().lock(), "{message}")
    }

    fn clear_bar(&self) {
        if let Some(bar) = &self.bar {
            bar.suspend(|| {});
        }
    }

    fn bar(&mut self) -> &ProgressBar {
        let title = self.title.clone();
        self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar.set_prefix(title);
            bar
        })
    }

    fn print(&self, text: &str) {
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "{text}");
        let _ = stderr.flush();
    }
}

impl Progress for OutputManager {
    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        if self.quiet {
            return;
        }
        if self.interactive {
            self.bar().set_prefix(title.to_string());
        } else {
            self.print(&format!("{title} "));
        }
    }

    fn set_count(&mut self, count: usize, total: usize) {
        if self.quiet || !self.interactive {
            return;
        }
        let bar = self.bar();
        bar.set_length(total as u64);
        bar.set_position(count as u64);
    }

    fn add_item(&mut self, item: &str) {
        if self.quiet || !self.interactive {
            return;
        }
        self.bar().set_message(item.to_string());
    }

    fn item_done(&mut self, _item: &str) {
        if self.quiet || self.interactive {
            return;
        }
        self.print(".");
    }

    fn done(&mut self) {
        if self.quiet {
            return;
        }
        match self.bar.take() {
            Some(bar) => bar.finish_with_message(format!("{} done", self.title)),
            None if !self.interactive => self.print("\n"),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_output_never_creates_a_bar() {
        let mut output = OutputManager::new(true, true);
        output.set_title("Writing files");
        output.set_count(1, 2);
        output.done();
        assert!(output.bar.is_none());
    }

    #[test]
    fn interactive_output_tracks_counts() {
        let mut output = OutputManager::new(true, false);
        output.set_title("Writing files");
        output.add_item("ImageJ");
        output.set_count(3, 7);
        let bar = output.bar.as_ref().unwrap();
        assert_eq!(bar.position(), 3);
        assert_eq!(bar.length(), Some(7));
        output.done();
        assert!(output.bar.is_none());
    }

    #[test]
    fn dots_mode_has_no_bar() {
        let mut output = OutputManager::new(false, false);
        output.set_title("Writing files");
        output.set_count(1, 1);
        output.item_done("ImageJ");
        output.done();
        assert!(output.bar.is_none());
    }
}
