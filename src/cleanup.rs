use std::{fs, path::Path};

use anyhow::Context as _;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    archive::{self, ArchiveOptions, AUX_BUNDLE, SOURCE_BUNDLE},
    error::SimreelResult,
    raster::RASTER_EXTENSION,
    scan::list_files_with_extension,
    tools::Toolset,
};

/// Extension of the vector source frames swept up after encoding.
pub const SOURCE_EXTENSION: &str = "svg";

/// What the post-encode sweep actually did.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CleanupReport {
    pub rasters_removed: usize,
    /// Whether this run created the source bundle (as opposed to the bundle
    /// pre-existing and the extracted originals being deleted).
    pub source_bundle_created: bool,
    pub sources_removed: usize,
    pub aux_archived: usize,
    /// Step 3 is opportunistic; its failure is recorded here, not raised.
    pub aux_warning: Option<String>,
}

/// Tidy the directory after a validated encode.
///
/// 1. Delete the transient raster frames.
/// 2. Sweep the source frames: if they were extracted from a pre-existing
///    bundle this run the originals are simply deleted (the bundle stays the
///    source of truth); otherwise they are archived into the bundle and then
///    removed.
/// 3. Archive any remaining auxiliary result files into the secondary
///    bundle, skipping the step entirely if that bundle already exists.
///
/// Steps 1–2 propagate failures; step 3 never unwinds them.
pub fn cleanup(
    tools: &Toolset,
    dir: &Path,
    artifact_name: &str,
    extracted_from_bundle: bool,
    opts: ArchiveOptions,
) -> SimreelResult<CleanupReport> {
    let mut report = CleanupReport::default();

    let rasters = list_files_with_extension(dir, RASTER_EXTENSION)?;
    for name in &rasters {
        let path = dir.join(name);
        fs::remove_file(&path).with_context(|| format!("remove raster '{}'", path.display()))?;
    }
    report.rasters_removed = rasters.len();
    info!(rasters = rasters.len(), "removed transient raster frames");

    let sources = list_files_with_extension(dir, SOURCE_EXTENSION)?;
    if !sources.is_empty() {
        if extracted_from_bundle {
            for name in &sources {
                let path = dir.join(name);
                fs::remove_file(&path)
                    .with_context(|| format!("remove extracted '{}'", path.display()))?;
            }
            info!(
                sources = sources.len(),
                "removed extracted originals; bundle remains authoritative"
            );
        } else {
            archive::archive_and_remove(tools, dir, SOURCE_BUNDLE, &sources, opts)?;
            report.source_bundle_created = true;
        }
        report.sources_removed = sources.len();
    }

    match archive_leftovers(tools, dir, artifact_name, opts) {
        Ok(count) => report.aux_archived = count,
        Err(err) => {
            let message = err.to_string();
            warn!(%message, "auxiliary-result archiving failed; leftovers kept on disk");
            report.aux_warning = Some(message);
        }
    }

    Ok(report)
}

/// Sweep files that are neither the artifact, a bundle, nor hidden into the
/// auxiliary bundle. Skip-if-present: an existing bundle is never touched or
/// duplicated.
fn archive_leftovers(
    tools: &Toolset,
    dir: &Path,
    artifact_name: &str,
    opts: ArchiveOptions,
) -> SimreelResult<usize> {
    if dir.join(AUX_BUNDLE).is_file() {
        warn!(
            bundle = AUX_BUNDLE,
            "auxiliary bundle already present; leaving leftover files in place"
        );
        return Ok(0);
    }

    let artifact_extension = Path::new(artifact_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let mut leftovers = Vec::new();
    let entries = fs::read_dir(dir).with_context(|| format!("read '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", dir.display()))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with('.')
            || name.ends_with(".tar.gz")
            || (!artifact_extension.is_empty() && name.ends_with(&artifact_extension))
        {
            continue;
        }
        leftovers.push(name.to_string());
    }
    leftovers.sort();

    if leftovers.is_empty() {
        return Ok(0);
    }

    archive::archive_and_remove(tools, dir, AUX_BUNDLE, &leftovers, opts)?;
    Ok(leftovers.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "simreel_cleanup_{tag}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn rasters_go_and_extracted_sources_are_deleted_not_rearchived() {
        let dir = scratch_dir("extracted");
        for name in ["0000.png", "0001.png", "frame_a.svg", "frame_b.svg"] {
            fs::write(dir.join(name), "x").unwrap();
        }
        fs::write(dir.join("result.mp4"), vec![0u8; 2048]).unwrap();

        let report = cleanup(
            &Toolset::default(),
            &dir,
            "result.mp4",
            true,
            ArchiveOptions::default(),
        )
        .unwrap();

        assert_eq!(report.rasters_removed, 2);
        assert_eq!(report.sources_removed, 2);
        assert!(!report.source_bundle_created);
        assert!(!dir.join("0000.png").exists());
        assert!(!dir.join("frame_a.svg").exists());
        assert!(!dir.join(SOURCE_BUNDLE).exists());
        assert!(dir.join("result.mp4").exists());
    }

    #[test]
    fn existing_aux_bundle_is_never_duplicated() {
        let dir = scratch_dir("skip");
        fs::write(dir.join(AUX_BUNDLE), "already here").unwrap();
        fs::write(dir.join("mesh.vtu"), "leftover").unwrap();
        fs::write(dir.join("result.mp4"), vec![0u8; 2048]).unwrap();

        let report = cleanup(
            &Toolset::default(),
            &dir,
            "result.mp4",
            true,
            ArchiveOptions::default(),
        )
        .unwrap();

        assert_eq!(report.aux_archived, 0);
        assert!(dir.join("mesh.vtu").exists());
        assert_eq!(fs::read(dir.join(AUX_BUNDLE)).unwrap(), b"already here");
    }

    #[test]
    fn aux_failure_is_reported_but_not_fatal() {
        let dir = scratch_dir("auxfail");
        fs::write(dir.join("0000.png"), "x").unwrap();
        fs::write(dir.join("mesh.vtu"), "leftover").unwrap();
        fs::write(dir.join("result.mp4"), vec![0u8; 2048]).unwrap();

        let broken = Toolset {
            archiver: "simreel-no-such-archiver".to_string(),
            ..Toolset::default()
        };
        let report = cleanup(&broken, &dir, "result.mp4", true, ArchiveOptions::default()).unwrap();

        assert_eq!(report.rasters_removed, 1);
        assert!(report.aux_warning.is_some());
        assert!(dir.join("mesh.vtu").exists());
    }
}
