//! Fiji packager - writes a staged Fiji/ImageJ bundle into a single archive.
//!
//! The archive format follows the output extension (.zip, .tar, .tar.gz,
//! .tar.bz2). Exit code 0 means the archive was written completely.

use fiji_packager::cli;
use std::process;

fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
