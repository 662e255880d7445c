#![allow(dead_code)]

use std::path::PathBuf;

pub const TEST_FONT: &str = "tests/data/fonts/DejaVuSans.ttf";

/// The checked-in fixture font; panics when it is missing.
pub fn test_font() -> PathBuf {
    let path = PathBuf::from(TEST_FONT);
    assert!(path.is_file(), "fixture font missing: {TEST_FONT}");
    path
}

/// Fresh scratch directory under `target/`.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("neonglow-tests").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_neonglow")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "neonglow.exe"
            } else {
                "neonglow"
            });
            p
        })
}
