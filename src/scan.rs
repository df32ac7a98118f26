use std::{fs, path::Path};

use anyhow::Context as _;

use crate::error::{SimreelError, SimreelResult};

/// List the file names in `dir` ending with `extension`, sorted
/// lexicographically.
///
/// A leading dot on `extension` is optional (`"svg"` and `".svg"` are
/// equivalent). The sort order is the authoritative temporal order of a frame
/// sequence, so it must be stable for identical directory contents. An empty
/// result is valid; a missing or non-directory path is not.
pub fn list_files_with_extension(dir: &Path, extension: &str) -> SimreelResult<Vec<String>> {
    if !dir.is_dir() {
        return Err(SimreelError::InvalidDirectory(dir.to_path_buf()));
    }

    let extension = normalize_extension(extension);

    let mut found = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", dir.display()))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            // Non-UTF-8 names cannot have been written by the simulation.
            continue;
        };
        if name.ends_with(&extension) {
            found.push(name.to_string());
        }
    }

    found.sort();
    Ok(found)
}

/// List the SVG frames in `dir`, sorted lexicographically, skipping files
/// without a closing `</svg>` tag.
///
/// A simulation that is killed mid-write leaves a truncated final frame
/// behind; feeding it to the rasterizer would fail the whole run, so
/// incomplete files are filtered out here.
pub fn list_svg_frames(dir: &Path) -> SimreelResult<Vec<String>> {
    let candidates = list_files_with_extension(dir, "svg")?;

    let mut complete = Vec::with_capacity(candidates.len());
    for name in candidates {
        let path = dir.join(&name);
        let contents =
            fs::read_to_string(&path).with_context(|| format!("read '{}'", path.display()))?;
        if contents.contains("</svg>") {
            complete.push(name);
        } else {
            tracing::warn!(frame = %name, "skipping truncated svg frame");
        }
    }
    Ok(complete)
}

fn normalize_extension(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}
