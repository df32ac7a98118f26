use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{SimreelError, SimreelResult};

/// The external commands the pipeline drives.
///
/// Each tool is an opaque CLI collaborator; only its invocation shape
/// matters. The defaults cover the usual deployment (`inkscape` for
/// vector-to-raster conversion, `ffmpeg` for encoding, `tar` for bundles),
/// and every field can be overridden, which is also how the test suite
/// substitutes stub scripts.
///
/// The rasterizer contract is
/// `<rasterizer> --export-area=x0:y0:x1:y1 --export-filename=<out.png> <in.svg>`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Toolset {
    pub rasterizer: String,
    pub encoder: String,
    pub archiver: String,
}

impl Default for Toolset {
    fn default() -> Self {
        Self {
            rasterizer: "inkscape".to_string(),
            encoder: "ffmpeg".to_string(),
            archiver: "tar".to_string(),
        }
    }
}

impl Toolset {
    /// Check that every tool answers `--version`.
    ///
    /// This is an explicit, repeatable capability probe; call it once before
    /// constructing pipeline runs rather than relying on the first child
    /// process spawn to fail. Returns the first missing tool.
    pub fn probe(&self) -> SimreelResult<()> {
        for tool in [&self.rasterizer, &self.encoder, &self.archiver] {
            if !answers_version(tool) {
                return Err(SimreelError::ToolMissing(tool.clone()));
            }
        }
        Ok(())
    }
}

fn answers_version(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
