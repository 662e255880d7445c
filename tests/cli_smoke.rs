mod support;

use std::process::Command;

use support::{exe, scratch_dir, test_font};

#[test]
fn missing_positional_exits_1() {
    let out = Command::new(exe()).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage"));
}

#[test]
fn extra_positional_exits_1() {
    let out = Command::new(exe()).args(["a.txt", "b.txt"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn help_exits_0() {
    let out = Command::new(exe()).arg("--help").output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    let help = String::from_utf8_lossy(&out.stdout);
    for flag in ["--bloom-dilate", "--bloom-gaussian", "--bg-image", "--rgb", "--resize"] {
        assert!(help.contains(flag), "help is missing {flag}");
    }
}

#[test]
fn missing_input_exits_1_and_keeps_existing_output() {
    let dir = scratch_dir("cli_missing_input");
    let out_path = dir.join("out.png");
    std::fs::write(&out_path, b"previous").unwrap();

    let mut cmd = Command::new(exe());
    cmd.arg(dir.join("does-not-exist.txt")).arg("--output").arg(&out_path);
    cmd.arg("--font").arg(test_font());
    let out = cmd.output().unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("error:"));
    assert_eq!(std::fs::read(&out_path).unwrap(), b"previous");
}

#[test]
fn missing_input_writes_no_output() {
    let dir = scratch_dir("cli_missing_input_fresh");
    let out_path = dir.join("out.png");

    let out = Command::new(exe())
        .arg(dir.join("does-not-exist.txt"))
        .arg("--output")
        .arg(&out_path)
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(!out_path.exists());
}

#[test]
fn malformed_rgb_exits_1() {
    let dir = scratch_dir("cli_bad_rgb");
    let input = dir.join("in.txt");
    std::fs::write(&input, "hello\n").unwrap();

    let out = Command::new(exe())
        .arg(&input)
        .args(["--rgb", "12,abc,3"])
        .arg("--output")
        .arg(dir.join("out.png"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("rgb"));
    assert!(!dir.join("out.png").exists());
}

#[test]
fn renders_default_canvas_png() {
    let font = test_font();
    let dir = scratch_dir("cli_render");
    let input = dir.join("in.txt");
    std::fs::write(&input, "NEON\nGLOW\nSIGN\n").unwrap();
    let out_path = dir.join("out.png");

    let status = Command::new(exe())
        .arg(&input)
        .arg("--font")
        .arg(&font)
        .arg("--output")
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(image::image_dimensions(&out_path).unwrap(), (1024, 400));
}

#[test]
fn resize_half_from_config_file() {
    let font = test_font();
    let dir = scratch_dir("cli_resize");
    let input = dir.join("in.txt");
    std::fs::write(&input, "HALF\n").unwrap();
    let config = dir.join("neonglow.json");
    std::fs::write(&config, r#"{ "resize": 0.5, "width": 400, "height": 100 }"#).unwrap();
    let out_path = dir.join("nested").join("out.png");

    let status = Command::new(exe())
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .args(["--width", "200"])
        .arg("--font")
        .arg(&font)
        .arg("--output")
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(image::image_dimensions(&out_path).unwrap(), (100, 50));
}
