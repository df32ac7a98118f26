use std::path::PathBuf;

pub type SimreelResult<T> = Result<T, SimreelError>;

/// Errors surfaced by the conversion pipeline.
///
/// Every variant is terminal for the current run: the pipeline performs no
/// internal retries, and a failed run leaves its intermediates on disk for
/// diagnosis. Callers decide whether to re-drive the whole pipeline.
#[derive(thiserror::Error, Debug)]
pub enum SimreelError {
    #[error("invalid simulation directory: '{0}'")]
    InvalidDirectory(PathBuf),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no input frames found in '{0}'")]
    NoInputFrames(PathBuf),

    #[error("geometry parse error: {0}")]
    GeometryParse(String),

    #[error("required external tool not available: '{0}'")]
    ToolMissing(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("rasterization failed for {} of {total} frames (indices {failed:?})", .failed.len())]
    Render { failed: Vec<usize>, total: usize },

    #[error("rasterization pool did not finish within {0} seconds")]
    RenderTimeout(u64),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("encoder did not produce '{0}'")]
    OutputMissing(PathBuf),

    #[error("encoder output '{path}' is {size} bytes, below the {min} byte minimum")]
    OutputTooSmall { path: PathBuf, size: u64, min: u64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimreelError {
    pub fn parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::GeometryParse(msg.into())
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}
