//! Command line interface for the Fiji packager.
//!
//! Parses arguments, merges them with an optional packaging profile and
//! runs one [`Packager`] with console progress.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::bundler::Packager;
use crate::error::{CliError, Result};
use crate::metadata::find_profile;

/// Main CLI entry point
pub fn run() -> Result<i32> {
    let args = Args::parse_args();
    let config = RuntimeConfig::from(&args);

    if let Err(e) = package(&args, &config) {
        let _ = config
            .output()
            .error(&format!("Error writing {}", args.output.display()));
        return Err(e);
    }

    let _ = config.output().success(&format!("Wrote {}", args.output.display()));
    Ok(0)
}

fn package(args: &Args, config: &RuntimeConfig) -> Result<()> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let profile = find_profile(args.config.as_deref(), args.bundle_root())?;
    let settings = args.settings(profile.as_ref())?;
    for platform in settings.platforms().iter().filter(|p| !p.is_known()) {
        let _ = config.output().warn(&format!(
            "unknown platform '{platform}' matches only files without a platform"
        ));
    }

    log::debug!("Packaging with {:?}", settings);
    let mut packager = Packager::new(settings).with_progress(Box::new(config.progress()));
    packager.package(&args.output)?;
    Ok(())
}
