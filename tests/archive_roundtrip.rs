use std::{fs, path::PathBuf, process::Command};

use simreel::{ArchiveOptions, SOURCE_BUNDLE, Toolset};

fn tar_available() -> bool {
    Command::new("tar")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "simreel_roundtrip_{tag}_{}_{}",
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
fn archive_then_extract_reproduces_originals_byte_for_byte() {
    if !tar_available() {
        return;
    }
    let dir = scratch_dir("bytes");
    let tools = Toolset::default();

    let originals = [
        ("frame_000.svg", "<svg width=\"4\" height=\"4\">a</svg>"),
        ("frame_001.svg", "<svg width=\"4\" height=\"4\">bb</svg>"),
        ("frame_002.svg", "<svg width=\"4\" height=\"4\">ccc</svg>"),
    ];
    for (name, contents) in &originals {
        fs::write(dir.join(name), contents).unwrap();
    }
    let names: Vec<String> = originals.iter().map(|(n, _)| n.to_string()).collect();

    simreel::archive::archive_and_remove(
        &tools,
        &dir,
        SOURCE_BUNDLE,
        &names,
        ArchiveOptions::default(),
    )
    .unwrap();

    for (name, _) in &originals {
        assert!(!dir.join(name).exists(), "{name} should have been removed");
    }
    assert!(dir.join(SOURCE_BUNDLE).exists());

    let extracted = simreel::archive::extract_if_present(&tools, &dir, SOURCE_BUNDLE).unwrap();
    assert!(extracted);
    for (name, contents) in &originals {
        assert_eq!(fs::read(dir.join(name)).unwrap(), contents.as_bytes());
    }

    // Bundle survives extraction; re-extracting over the loose files
    // overwrites them rather than failing.
    assert!(dir.join(SOURCE_BUNDLE).exists());
    fs::write(dir.join("frame_000.svg"), "scribbled over").unwrap();
    assert!(simreel::archive::extract_if_present(&tools, &dir, SOURCE_BUNDLE).unwrap());
    assert_eq!(
        fs::read(dir.join("frame_000.svg")).unwrap(),
        originals[0].1.as_bytes()
    );
}

#[test]
fn rearchiving_the_same_set_keeps_a_single_bundle() {
    if !tar_available() {
        return;
    }
    let dir = scratch_dir("single");
    let tools = Toolset::default();

    fs::write(dir.join("frame_000.svg"), "<svg>a</svg>").unwrap();
    let names = vec!["frame_000.svg".to_string()];

    simreel::archive::archive_and_remove(
        &tools,
        &dir,
        SOURCE_BUNDLE,
        &names,
        ArchiveOptions::default(),
    )
    .unwrap();
    assert!(simreel::archive::extract_if_present(&tools, &dir, SOURCE_BUNDLE).unwrap());
    simreel::archive::archive_and_remove(
        &tools,
        &dir,
        SOURCE_BUNDLE,
        &names,
        ArchiveOptions::default(),
    )
    .unwrap();

    let bundles: Vec<String> = fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with(".tar.gz"))
        .collect();
    assert_eq!(bundles, vec![SOURCE_BUNDLE.to_string()]);
}
