use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::Context as _;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{SimreelError, SimreelResult},
    raster::RASTER_EXTENSION,
    tools::Toolset,
};

/// Smallest artifact the encoder is believed to have produced successfully.
/// ffmpeg sometimes emits an empty container on failure while still exiting
/// zero, so size is checked in addition to existence.
pub const MIN_ARTIFACT_BYTES: u64 = 1024;

/// Output container, with its matching lossless codec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Mp4,
    Webm,
}

impl Container {
    pub fn extension(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
        }
    }

    fn codec_args(self) -> &'static [&'static str] {
        match self {
            Container::Mp4 => &["-c:v", "libx264", "-crf", "0", "-preset", "slow"],
            Container::Webm => &["-c:v", "libvpx-vp9", "-lossless", "1"],
        }
    }
}

/// Frame rate that fits `frame_count` frames into `duration_sec` seconds,
/// clamped to a 1 fps minimum.
pub fn frame_rate(frame_count: usize, duration_sec: f64) -> f64 {
    (frame_count as f64 / duration_sec).max(1.0)
}

/// Append the container extension to `name` unless it already carries it.
pub fn with_container_suffix(name: &str, container: Container) -> String {
    let suffix = format!(".{}", container.extension());
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

/// Encode the numbered raster sequence in `dir` into `output_name`.
///
/// One blocking encoder invocation for the whole sequence; the caller must
/// have joined the rasterization pool first. Returns the artifact path and
/// the frame rate used.
pub fn encode_frames(
    tools: &Toolset,
    dir: &Path,
    frame_count: usize,
    duration_sec: f64,
    output_name: &str,
    container: Container,
) -> SimreelResult<(PathBuf, f64)> {
    let rate = frame_rate(frame_count, duration_sec);
    let output_name = with_container_suffix(output_name, container);
    let input_pattern = format!("%04d.{RASTER_EXTENSION}");

    debug!(
        encoder = %tools.encoder,
        rate,
        frames = frame_count,
        output = %output_name,
        "invoking encoder"
    );

    let output = Command::new(&tools.encoder)
        .args(["-v", "0", "-r", &rate.to_string(), "-f", "image2", "-i"])
        .arg(&input_pattern)
        .args(container.codec_args())
        .arg("-y")
        .arg(&output_name)
        .current_dir(dir)
        .output()
        .with_context(|| format!("spawn encoder '{}'", tools.encoder))?;

    if !output.status.success() {
        return Err(SimreelError::encode(format!(
            "'{}' exited with {}: {}",
            tools.encoder,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    info!(artifact = %output_name, rate, "encoded frame sequence");
    Ok((dir.join(output_name), rate))
}

/// Confirm the encoder produced a plausible artifact at `path`.
///
/// Returns the artifact size in bytes.
pub fn validate_artifact(path: &Path) -> SimreelResult<u64> {
    let Ok(metadata) = fs::metadata(path) else {
        return Err(SimreelError::OutputMissing(path.to_path_buf()));
    };
    if !metadata.is_file() {
        return Err(SimreelError::OutputMissing(path.to_path_buf()));
    }

    let size = metadata.len();
    if size < MIN_ARTIFACT_BYTES {
        return Err(SimreelError::OutputTooSmall {
            path: path.to_path_buf(),
            size,
            min: MIN_ARTIFACT_BYTES,
        });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_fits_duration_with_a_floor_of_one() {
        assert_eq!(frame_rate(30, 15.0), 2.0);
        assert_eq!(frame_rate(5, 15.0), 1.0);
        assert_eq!(frame_rate(0, 15.0), 1.0);
    }

    #[test]
    fn frame_rate_is_monotone_in_frame_count() {
        let mut last = 0.0;
        for count in 0..200 {
            let rate = frame_rate(count, 15.0);
            assert!(rate >= last);
            assert!(rate >= 1.0);
            last = rate;
        }
    }

    #[test]
    fn container_suffix_is_appended_once() {
        assert_eq!(with_container_suffix("result", Container::Mp4), "result.mp4");
        assert_eq!(
            with_container_suffix("result.mp4", Container::Mp4),
            "result.mp4"
        );
        assert_eq!(
            with_container_suffix("movie", Container::Webm),
            "movie.webm"
        );
    }

    #[test]
    fn validation_distinguishes_missing_from_undersized() {
        let dir = std::env::temp_dir().join(format!(
            "simreel_validate_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();

        assert!(matches!(
            validate_artifact(&dir.join("missing.mp4")),
            Err(SimreelError::OutputMissing(_))
        ));

        let empty = dir.join("empty.mp4");
        fs::write(&empty, "").unwrap();
        match validate_artifact(&empty) {
            Err(SimreelError::OutputTooSmall { size, min, .. }) => {
                assert_eq!(size, 0);
                assert_eq!(min, MIN_ARTIFACT_BYTES);
            }
            other => panic!("expected OutputTooSmall, got {other:?}"),
        }

        let plausible = dir.join("ok.mp4");
        fs::write(&plausible, vec![0u8; 2048]).unwrap();
        assert_eq!(validate_artifact(&plausible).unwrap(), 2048);
    }
}
