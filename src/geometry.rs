use std::{fs, path::Path};

use anyhow::Context as _;
use serde::Serialize;

use crate::error::{SimreelError, SimreelResult};

/// Raster geometry shared by every frame conversion in one pipeline run.
///
/// Computed once from a representative frame; frame-to-frame dimension
/// variance is not detected (accepted limitation — simulation writers emit a
/// fixed canvas).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeometryInfo {
    pub native_width: f64,
    pub native_height: f64,
    pub png_width: u32,
    pub png_height: u32,
    pub png_y_offset: u32,
}

impl GeometryInfo {
    /// Read the declared size of the frame at `path` and derive the crop
    /// rectangle for `aspect_ratio` (width / height, must be >= 1.0).
    pub fn from_svg(path: &Path, aspect_ratio: f64) -> SimreelResult<Self> {
        if !aspect_ratio.is_finite() || aspect_ratio < 1.0 {
            return Err(SimreelError::parameter(format!(
                "aspect ratio must be >= 1.0, got {aspect_ratio}"
            )));
        }

        let contents =
            fs::read_to_string(path).with_context(|| format!("read frame '{}'", path.display()))?;
        let (native_width, native_height) = parse_size_attribute(&contents)?;

        Ok(Self::derive(native_width, native_height, aspect_ratio))
    }

    fn derive(native_width: f64, native_height: f64, aspect_ratio: f64) -> Self {
        let png_width = native_width.floor() as u32;
        let png_height = (native_width / aspect_ratio).floor() as u32;
        let png_y_offset =
            (0.5 * (native_height - native_height / aspect_ratio)).floor() as u32;

        Self {
            native_width,
            native_height,
            png_width,
            png_height,
            png_y_offset,
        }
    }

    /// The rasterizer's crop rectangle, as an `x0:y0:x1:y1` export area.
    pub fn export_area(&self) -> String {
        format!(
            "0:{}:{}:{}",
            self.png_y_offset,
            self.png_width,
            self.png_y_offset + self.png_height
        )
    }
}

/// Extract the `width="…" height="…"` pair from the frame's root element.
///
/// Exactly one such pair must appear in the file, and both values must be
/// plain numbers; anything else is a parse failure rather than a guess.
fn parse_size_attribute(contents: &str) -> SimreelResult<(f64, f64)> {
    let mut pairs = Vec::new();
    for (idx, _) in contents.match_indices("width=\"") {
        let rest = &contents[idx + "width=\"".len()..];
        let Some((width_raw, after)) = rest.split_once('"') else {
            continue;
        };
        let Some(height_rest) = after.trim_start().strip_prefix("height=\"") else {
            continue;
        };
        let Some((height_raw, _)) = height_rest.split_once('"') else {
            continue;
        };
        pairs.push((width_raw, height_raw));
    }

    let [(width_raw, height_raw)] = pairs.as_slice() else {
        return Err(SimreelError::geometry(format!(
            "expected exactly one width/height size attribute, found {}",
            pairs.len()
        )));
    };

    match (width_raw.parse::<f64>(), height_raw.parse::<f64>()) {
        (Ok(w), Ok(h)) if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 => Ok((w, h)),
        _ => Err(SimreelError::geometry(format!(
            "size attribute components are not numeric: '{width_raw}' x '{height_raw}'"
        ))),
    }
}
