use std::{path::Path, process::Command, sync::mpsc, thread, time::Duration};

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::{
    error::{SimreelError, SimreelResult},
    geometry::GeometryInfo,
    tools::Toolset,
};

/// Extension of the transient raster frames handed to the encoder.
pub const RASTER_EXTENSION: &str = "png";

/// Upper bound on one whole rasterization pool run. Generous on purpose:
/// large batches on slow machines take hours, but a hung rasterizer process
/// must not stall the pipeline forever.
pub const DEFAULT_POOL_TIMEOUT: Duration = Duration::from_secs(86_400);

/// Worker-pool configuration for the rasterization stage.
#[derive(Clone, Debug)]
pub struct RasterOptions {
    /// Worker count; `None` uses available parallelism.
    pub threads: Option<usize>,
    /// Draw an interactive progress bar while frames convert.
    pub progress: bool,
    pub timeout: Duration,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            threads: None,
            progress: false,
            timeout: DEFAULT_POOL_TIMEOUT,
        }
    }
}

/// Raster file name for source sequence index `index` (4-digit zero-padded).
pub fn raster_name(index: usize) -> String {
    format!("{index:04}.{RASTER_EXTENSION}")
}

/// Convert every frame in `frames` (sorted source order, names relative to
/// `dir`) to a consecutively numbered raster via the external rasterizer.
///
/// Jobs share nothing mutable: each reads one input file and writes one
/// uniquely named output, so they run freely in parallel on a bounded rayon
/// pool. The pool join is a hard barrier; per-job exit status is captured and
/// failures are aggregated afterwards so a single bad frame stays
/// attributable instead of halting its siblings.
pub fn rasterize_frames(
    tools: &Toolset,
    dir: &Path,
    frames: &[String],
    geometry: &GeometryInfo,
    opts: &RasterOptions,
) -> SimreelResult<()> {
    if frames.is_empty() {
        return Ok(());
    }

    let pool = build_thread_pool(opts.threads)?;
    info!(
        frames = frames.len(),
        workers = pool.current_num_threads(),
        "rasterizing frame sequence"
    );

    let bar = if opts.progress {
        ProgressBar::new(frames.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    let jobs: Vec<RasterJob> = frames
        .iter()
        .enumerate()
        .map(|(index, source)| RasterJob {
            source: source.clone(),
            output: raster_name(index),
        })
        .collect();

    let total = jobs.len();
    let export_area = geometry.export_area();
    let rasterizer = tools.rasterizer.clone();
    let dir = dir.to_path_buf();
    let job_bar = bar.clone();

    // The pool runs on a helper thread so the caller can bound the whole
    // batch with a timeout; on expiry the run fails and the detached pool is
    // abandoned to the OS along with its child processes.
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let results: Vec<Result<(), String>> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let outcome = job.run(&rasterizer, &dir, &export_area);
                    job_bar.inc(1);
                    outcome
                })
                .collect()
        });
        // The receiver is gone if the caller already timed out.
        let _ = tx.send(results);
    });

    let results = rx
        .recv_timeout(opts.timeout)
        .map_err(|_| SimreelError::RenderTimeout(opts.timeout.as_secs()))?;
    bar.finish_and_clear();

    let mut failed = Vec::new();
    for (index, result) in results.iter().enumerate() {
        if let Err(message) = result {
            warn!(frame = index, %message, "frame rasterization failed");
            failed.push(index);
        }
    }

    if failed.is_empty() {
        info!(frames = total, "rasterization complete");
        Ok(())
    } else {
        Err(SimreelError::Render { failed, total })
    }
}

#[derive(Clone, Debug)]
struct RasterJob {
    source: String,
    output: String,
}

impl RasterJob {
    fn run(&self, rasterizer: &str, dir: &Path, export_area: &str) -> Result<(), String> {
        let output = Command::new(rasterizer)
            .arg(format!("--export-area={export_area}"))
            .arg(format!("--export-filename={}", self.output))
            .arg(&self.source)
            .current_dir(dir)
            .output()
            .map_err(|e| format!("failed to spawn '{rasterizer}': {e}"))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(format!(
                "'{}' -> '{}' exited with {}: {}",
                self.source,
                self.output,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> SimreelResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(SimreelError::parameter(
            "rasterizer worker count must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| SimreelError::parameter(format!("failed to build rasterizer pool: {e}")))
}
