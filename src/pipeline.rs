use std::{path::PathBuf, time::Duration};

use serde::Serialize;
use tracing::info;

use crate::{
    archive::{self, ArchiveOptions, SOURCE_BUNDLE},
    cleanup::{CleanupReport, cleanup},
    encode::{Container, encode_frames, validate_artifact, with_container_suffix},
    error::{SimreelError, SimreelResult},
    geometry::GeometryInfo,
    raster::{DEFAULT_POOL_TIMEOUT, RasterOptions, rasterize_frames},
    scan::list_svg_frames,
    tools::Toolset,
};

/// One pipeline invocation over a simulation output directory.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Directory the simulation wrote its frames into. Collaborator-owned;
    /// it must already exist.
    pub sim_dir: PathBuf,
    /// Artifact name; the container extension is appended if missing.
    pub output_name: String,
    /// Target aspect ratio (width / height), >= 1.0.
    pub aspect_ratio: f64,
    /// Target video duration in seconds, >= 1.0.
    pub duration_sec: f64,
    pub container: Container,
    /// Draw a progress bar over the rasterization pool.
    pub progress: bool,
    /// Rasterizer worker count; `None` uses available parallelism.
    pub threads: Option<usize>,
    pub toolset: Toolset,
    pub archive: ArchiveOptions,
    pub raster_timeout: Duration,
}

impl ConvertOptions {
    pub fn new(sim_dir: impl Into<PathBuf>, output_name: impl Into<String>) -> Self {
        Self {
            sim_dir: sim_dir.into(),
            output_name: output_name.into(),
            aspect_ratio: 1.0,
            duration_sec: 15.0,
            container: Container::default(),
            progress: false,
            threads: None,
            toolset: Toolset::default(),
            archive: ArchiveOptions::default(),
            raster_timeout: DEFAULT_POOL_TIMEOUT,
        }
    }

    fn validate(&self) -> SimreelResult<()> {
        if !self.sim_dir.is_dir() {
            return Err(SimreelError::InvalidDirectory(self.sim_dir.clone()));
        }
        if !self.aspect_ratio.is_finite() || self.aspect_ratio < 1.0 {
            return Err(SimreelError::parameter(format!(
                "aspect ratio must be >= 1.0, got {}",
                self.aspect_ratio
            )));
        }
        if !self.duration_sec.is_finite() || self.duration_sec < 1.0 {
            return Err(SimreelError::parameter(format!(
                "duration must be >= 1.0 seconds, got {}",
                self.duration_sec
            )));
        }
        Ok(())
    }
}

/// What a successful run produced.
#[derive(Clone, Debug, Serialize)]
pub struct ConvertReport {
    pub frames: usize,
    pub frame_rate: f64,
    pub geometry: GeometryInfo,
    pub artifact: PathBuf,
    pub artifact_bytes: u64,
    /// Whether the source frames came out of a pre-existing bundle.
    pub extracted_from_bundle: bool,
    pub cleanup: CleanupReport,
}

/// Run the whole pipeline: extract-if-present, scan, resolve geometry,
/// rasterize in parallel, encode, validate, clean up.
///
/// Cleanup runs strictly after validation succeeds, so a failed run leaves
/// its intermediates in place for diagnosis. Re-driving the pipeline over the
/// same directory is safe: bundles are re-extracted rather than duplicated.
pub fn convert(opts: &ConvertOptions) -> SimreelResult<ConvertReport> {
    opts.validate()?;
    let dir = opts.sim_dir.as_path();

    let extracted = archive::extract_if_present(&opts.toolset, dir, SOURCE_BUNDLE)?;

    let frames = list_svg_frames(dir)?;
    if frames.is_empty() {
        return Err(SimreelError::NoInputFrames(dir.to_path_buf()));
    }
    info!(frames = frames.len(), dir = %dir.display(), "found source frame sequence");

    // One representative frame fixes the crop for the whole run.
    let geometry = GeometryInfo::from_svg(&dir.join(&frames[0]), opts.aspect_ratio)?;

    let raster_opts = RasterOptions {
        threads: opts.threads,
        progress: opts.progress,
        timeout: opts.raster_timeout,
    };
    rasterize_frames(&opts.toolset, dir, &frames, &geometry, &raster_opts)?;

    let (artifact, frame_rate) = encode_frames(
        &opts.toolset,
        dir,
        frames.len(),
        opts.duration_sec,
        &opts.output_name,
        opts.container,
    )?;
    let artifact_bytes = validate_artifact(&artifact)?;

    let artifact_name = with_container_suffix(&opts.output_name, opts.container);
    let cleanup_report = cleanup(&opts.toolset, dir, &artifact_name, extracted, opts.archive)?;

    Ok(ConvertReport {
        frames: frames.len(),
        frame_rate,
        geometry,
        artifact,
        artifact_bytes,
        extracted_from_bundle: extracted,
        cleanup: cleanup_report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "simreel_pipeline_{tag}_{}_{}",
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
    fn missing_directory_is_rejected_up_front() {
        let opts = ConvertOptions::new("/definitely/not/a/simreel/dir", "result");
        assert!(matches!(
            convert(&opts),
            Err(SimreelError::InvalidDirectory(_))
        ));
    }

    #[test]
    fn out_of_range_parameters_are_rejected_up_front() {
        let dir = scratch_dir("params");

        let mut opts = ConvertOptions::new(&dir, "result");
        opts.aspect_ratio = 0.75;
        assert!(matches!(
            convert(&opts),
            Err(SimreelError::InvalidParameter(_))
        ));

        let mut opts = ConvertOptions::new(&dir, "result");
        opts.duration_sec = 0.5;
        assert!(matches!(
            convert(&opts),
            Err(SimreelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn directory_without_frames_fails_and_creates_nothing() {
        let dir = scratch_dir("noframes");
        fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let opts = ConvertOptions::new(&dir, "result");
        assert!(matches!(convert(&opts), Err(SimreelError::NoInputFrames(_))));

        assert!(!dir.join(SOURCE_BUNDLE).exists());
        assert!(!dir.join("result.mp4").exists());
        assert!(dir.join("notes.txt").exists());
    }
}
