use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_photostrip")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "photostrip.exe"
            } else {
                "photostrip"
            });
            p
        })
}

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, shade: u8) {
    RgbImage::from_pixel(160, 120, Rgb([shade, 120, 80]))
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

fn run(dir: &Path, args: &[&str]) -> std::process::Output {
    std::process::Command::new(exe())
        .args(args)
        .env("PHOTOSTRIP_STORAGE_ROOT", dir.join("store"))
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

#[test]
fn cli_filter_then_compose() {
    let dir = scratch("filter_compose");
    let mut filtered = Vec::new();
    for i in 0..2u8 {
        let src = dir.join(format!("in{i}.png"));
        let out = dir.join(format!("filtered{i}.jpg"));
        write_png(&src, i * 100);
        let status = run(
            &dir,
            &[
                "filter",
                "--in",
                &src.to_string_lossy(),
                "--out",
                &out.to_string_lossy(),
            ],
        );
        assert!(status.status.success());
        let img = image::open(&out).unwrap();
        assert_eq!((img.width(), img.height()), (400, 400));
        filtered.push(out.to_string_lossy().to_string());
    }

    let strip = dir.join("strip.jpg");
    let strip_arg = strip.to_string_lossy().to_string();
    let mut args = vec!["compose", "--layout-name", "Classic Duo", "--out", &strip_arg];
    args.extend(filtered.iter().map(String::as_str));
    let out = run(&dir, &args);
    assert!(out.status.success());

    let img = image::open(&strip).unwrap();
    assert_eq!((img.width(), img.height()), (400, 850));
}

#[test]
fn cli_session_flow() {
    let dir = scratch("session_flow");

    let out = run(&dir, &["session", "create", "--layout", "layout-a"]);
    assert!(out.status.success());
    let id = String::from_utf8(out.stdout).unwrap().trim().to_string();
    assert!(!id.is_empty());

    for idx in 0..2u8 {
        let src = dir.join(format!("cap{idx}.png"));
        write_png(&src, idx * 60);
        let out = run(
            &dir,
            &[
                "session",
                "capture",
                "--session",
                &id,
                "--index",
                &idx.to_string(),
                "--in",
                &src.to_string_lossy(),
            ],
        );
        assert!(out.status.success());
    }

    let out = run(&dir, &["session", "generate", "--session", &id]);
    assert!(out.status.success());
    let outcome: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(
        outcome["download_url"],
        format!("/api/photos/download/{id}")
    );

    let again = run(&dir, &["session", "generate", "--session", &id]);
    assert!(!again.status.success());

    let dl = dir.join("download.jpg");
    let out = run(
        &dir,
        &[
            "session",
            "download",
            "--session",
            &id,
            "--out",
            &dl.to_string_lossy(),
        ],
    );
    assert!(out.status.success());
    let img = image::open(&dl).unwrap();
    assert_eq!((img.width(), img.height()), (400, 850));
}
