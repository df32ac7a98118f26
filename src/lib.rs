//! Render a time-ordered sequence of vector simulation frames into a
//! compressed video artifact, and manage the archival lifecycle of the files
//! around that conversion.
//!
//! The heavy lifting is delegated to external CLI tools (a vector
//! rasterizer, `ffmpeg`, `tar`); this crate coordinates them: parallel
//! rasterization over a bounded worker pool, crop/frame-rate derivation from
//! sampled metadata, validated encoding, and idempotent bundle bookkeeping so
//! repeated runs over the same directory behave safely.
//!
//! Entry point: [`convert`] with [`ConvertOptions`]. Probe tool availability
//! first with [`Toolset::probe`].

#![forbid(unsafe_code)]

pub mod archive;
pub mod cleanup;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod raster;
pub mod scan;
pub mod tools;

pub use archive::{ArchiveOptions, AUX_BUNDLE, SOURCE_BUNDLE};
pub use cleanup::CleanupReport;
pub use encode::{Container, MIN_ARTIFACT_BYTES, frame_rate};
pub use error::{SimreelError, SimreelResult};
pub use geometry::GeometryInfo;
pub use pipeline::{ConvertOptions, ConvertReport, convert};
pub use raster::{DEFAULT_POOL_TIMEOUT, RASTER_EXTENSION, raster_name};
pub use scan::{list_files_with_extension, list_svg_frames};
pub use tools::Toolset;
