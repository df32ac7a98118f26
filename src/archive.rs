use std::{fs, path::Path, process::Command};

use anyhow::Context as _;
use tracing::{debug, info};

use crate::{
    error::{SimreelError, SimreelResult},
    tools::Toolset,
};

/// Fixed bundle name for swept-up source frames.
pub const SOURCE_BUNDLE: &str = "svg_arch.tar.gz";
/// Fixed bundle name for auxiliary result files (mesh/geometry dumps etc.).
pub const AUX_BUNDLE: &str = "res_arch.tar.gz";

/// Archive creation options.
///
/// The compression level is passed to the spawned archiver via its
/// environment (`GZIP=-<level>`) rather than mutated process-wide, so
/// concurrent runs over different directories stay independent.
#[derive(Clone, Copy, Debug)]
pub struct ArchiveOptions {
    pub compression_level: u8,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        // Maximum compression: bundles sit on disk between runs.
        Self {
            compression_level: 9,
        }
    }
}

/// Extract `bundle_name` into `dir` if it exists, overwriting same-named
/// files. Returns whether an extraction happened. Calling this on a
/// directory with no bundle is a no-op.
pub fn extract_if_present(
    tools: &Toolset,
    dir: &Path,
    bundle_name: &str,
) -> SimreelResult<bool> {
    let bundle = dir.join(bundle_name);
    if !bundle.is_file() {
        debug!(bundle = bundle_name, "no bundle to extract");
        return Ok(false);
    }

    let output = Command::new(&tools.archiver)
        .args(["-zxf", bundle_name, "--overwrite"])
        .current_dir(dir)
        .output()
        .with_context(|| format!("spawn archiver '{}'", tools.archiver))?;

    if !output.status.success() {
        return Err(SimreelError::archive(format!(
            "extracting '{}' failed with {}: {}",
            bundle.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    info!(bundle = bundle_name, dir = %dir.display(), "extracted bundle");
    Ok(true)
}

/// Compress `files` (paths relative to `dir`) into `bundle_name`, then delete
/// the originals.
///
/// The originals are only removed after the bundle has been confirmed to
/// exist with non-zero size; a failed archive step leaves every original in
/// place. The archiver's own remove-as-you-go mode is deliberately not used.
pub fn archive_and_remove(
    tools: &Toolset,
    dir: &Path,
    bundle_name: &str,
    files: &[String],
    opts: ArchiveOptions,
) -> SimreelResult<()> {
    if files.is_empty() {
        return Err(SimreelError::archive(format!(
            "refusing to create empty bundle '{bundle_name}'"
        )));
    }

    let output = Command::new(&tools.archiver)
        .env("GZIP", format!("-{}", opts.compression_level))
        .args(["-zcf", bundle_name])
        .args(files)
        .current_dir(dir)
        .output()
        .with_context(|| format!("spawn archiver '{}'", tools.archiver))?;

    if !output.status.success() {
        return Err(SimreelError::archive(format!(
            "creating '{bundle_name}' failed with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let bundle = dir.join(bundle_name);
    let size = fs::metadata(&bundle)
        .map_err(|_| SimreelError::archive(format!("archiver reported success but '{bundle_name}' is missing")))?
        .len();
    if size == 0 {
        return Err(SimreelError::archive(format!(
            "archiver produced an empty '{bundle_name}'; originals left in place"
        )));
    }

    for name in files {
        let path = dir.join(name);
        fs::remove_file(&path).with_context(|| format!("remove archived '{}'", path.display()))?;
    }

    info!(
        bundle = bundle_name,
        files = files.len(),
        bytes = size,
        "archived and removed originals"
    );
    Ok(())
}
