//! Cassette replay integration tests with zero network I/O.
//!
//! Every test sets `GENSTUDIO_REPLAY` to a cassette file so the binary never
//! contacts a live API endpoint, and points `--config` at a temporary file so
//! the user's gallery is never touched.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use base64::Engine;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> Command {
    assert_cmd::cargo::cargo_bin_cmd!("genstudio")
}

/// Absolute path to the `test_fixtures` directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures")
}

/// Temp workspace with a config file, a gallery path, and one input photo.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let gallery = dir.path().join("gallery.json");
        std::fs::write(
            dir.path().join("config.toml"),
            format!("[gallery]\npath = {:?}\n\n[polling]\ninterval_ms = 0\n", gallery.to_str().unwrap()),
        )
        .unwrap();
        std::fs::write(dir.path().join("cat.jpg"), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn out_dir(&self) -> PathBuf {
        self.path("out")
    }

    fn outputs(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.out_dir())
            .map(|entries| entries.flatten().map(|e| e.path()).collect())
            .unwrap_or_default()
    }

    fn replay(&self, cassette: &Path) -> Command {
        let mut cmd = cmd();
        cmd.env("GENSTUDIO_REPLAY", cassette.to_str().unwrap())
            .env_remove("GENSTUDIO_REC")
            .env_remove("GEMINI_API_KEY")
            .env_remove("GOMMO_ACCESS_TOKEN")
            .env_remove("GENSTUDIO_POLL_INTERVAL_MS")
            .current_dir(self.dir.path())
            .args(["--config", self.path("config.toml").to_str().unwrap()]);
        cmd
    }
}

#[test]
fn gemini_happy_path_creates_file() {
    let ws = Workspace::new();

    ws.replay(&fixtures_dir().join("gemini_cat.cassette.yaml"))
        .args(["generate", "-i", "cat.jpg", "--style", "watercolor", "-o"])
        .arg(ws.out_dir())
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    let outputs = ws.outputs();
    assert_eq!(outputs.len(), 1, "exactly one result should be saved");
    let name = outputs[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("cat-watercolor-"), "unexpected name: {name}");
    assert!(name.ends_with(".jpg"), "unexpected name: {name}");
    assert_eq!(&std::fs::read(&outputs[0]).unwrap()[..3], &[0xFF, 0xD8, 0xFF]);
}

#[test]
fn gallery_records_generated_image() {
    let ws = Workspace::new();

    ws.replay(&fixtures_dir().join("gemini_cat.cassette.yaml"))
        .args(["generate", "-i", "cat.jpg", "-o"])
        .arg(ws.out_dir())
        .assert()
        .success();

    ws.replay(&fixtures_dir().join("gemini_cat.cassette.yaml"))
        .args(["gallery", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini/gemini-2.5-flash-image"));

    let gallery: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(ws.path("gallery.json")).unwrap()).unwrap();
    let entries = gallery["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0]["source"].as_str().unwrap().ends_with("cat.jpg"));

    ws.replay(&fixtures_dir().join("gemini_cat.cassette.yaml"))
        .args(["gallery", "clear"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed 1 entries"));
}

#[test]
fn no_gallery_leaves_gallery_untouched() {
    let ws = Workspace::new();

    ws.replay(&fixtures_dir().join("gemini_cat.cassette.yaml"))
        .args(["generate", "-i", "cat.jpg", "--no-gallery", "-o"])
        .arg(ws.out_dir())
        .assert()
        .success();

    assert!(!ws.path("gallery.json").exists());
}

#[test]
fn skip_existing_leaves_gallery_photos_alone() {
    let ws = Workspace::new();
    std::fs::write(ws.path("dog.jpg"), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

    ws.replay(&fixtures_dir().join("gemini_cat.cassette.yaml"))
        .args(["generate", "-i", "cat.jpg", "-o"])
        .arg(ws.out_dir())
        .assert()
        .success();

    // The cassette holds one generation, so only dog.jpg may reach it.
    ws.replay(&fixtures_dir().join("gemini_cat.cassette.yaml"))
        .args(["generate", "-i", "cat.jpg", "dog.jpg", "--skip-existing", "-o"])
        .arg(ws.out_dir())
        .assert()
        .success()
        .stderr(predicate::str::contains("[skipped] cat.jpg (already in gallery)"))
        .stderr(predicate::str::contains("1 completed, 0 failed, 1 skipped"));

    assert_eq!(ws.outputs().len(), 2);
}

#[test]
fn gommo_polls_until_success() {
    let ws = Workspace::new();

    ws.replay(&fixtures_dir().join("gommo_poll.cassette.yaml"))
        .args(["generate", "-i", "cat.jpg", "--model", "seedream", "-o"])
        .arg(ws.out_dir())
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    assert_eq!(ws.outputs().len(), 1);

    let gallery = std::fs::read_to_string(ws.path("gallery.json")).unwrap();
    assert!(gallery.contains("https://cdn.gommo.net/images/ib_7c1d55e0.jpg"), "{gallery}");
}

#[test]
fn gommo_failed_job_exits_with_error() {
    let ws = Workspace::new();

    ws.replay(&fixtures_dir().join("gommo_failed.cassette.yaml"))
        .args(["generate", "-i", "cat.jpg", "--model", "imagen-4", "--style", "sketch", "-o"])
        .arg(ws.out_dir())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Generation job ib_93ab04f2 failed with status ERROR"));

    assert!(ws.outputs().is_empty());
}

#[test]
fn batch_continues_past_failed_item() {
    let ws = Workspace::new();
    std::fs::write(ws.path("dog.jpg"), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

    // One recorded generation: the first photo succeeds, the second finds the
    // cassette exhausted.
    ws.replay(&fixtures_dir().join("gemini_cat.cassette.yaml"))
        .args(["generate", "-i", "cat.jpg", "dog.jpg", "--no-gallery", "-o"])
        .arg(ws.out_dir())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Saved:"))
        .stderr(predicate::str::contains("Failed: dog.jpg"))
        .stderr(predicate::str::contains("1 of 2 images failed"));

    assert_eq!(ws.outputs().len(), 1);
}

#[test]
fn recorded_quota_error_surfaces_message() {
    let ws = Workspace::new();
    let cassette = ws.path("quota.cassette.yaml");
    std::fs::write(
        &cassette,
        "name: quota\nrecorded_at: \"2026-03-14T10:00:00Z\"\ncommit: test\ninteractions:\n  - seq: 0\n    port: image_generator\n    method: generate\n    input: {}\n    output:\n      Err:\n        kind: quota\n        message: \"RESOURCE_EXHAUSTED\"\n",
    )
    .unwrap();

    ws.replay(&cassette)
        .args(["generate", "-i", "cat.jpg", "--no-gallery"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("RESOURCE_EXHAUSTED"));
}

#[test]
fn format_png_converts_jpeg_to_png() {
    let ws = Workspace::new();

    let jpeg_bytes = {
        let img = image::DynamicImage::new_rgb8(1, 1);
        let mut buf = std::io::Cursor::new(Vec::<u8>::new());
        img.write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    };
    let b64 = base64::engine::general_purpose::STANDARD.encode(&jpeg_bytes);

    let cassette = ws.path("convert.cassette.yaml");
    std::fs::write(
        &cassette,
        format!(
            "name: convert-test\nrecorded_at: \"2026-03-14T10:00:00Z\"\ncommit: test\ninteractions:\n  - seq: 0\n    port: image_generator\n    method: generate\n    input: {{}}\n    output:\n      Ok:\n        images:\n          - data: {b64}\n            mime_type: image/jpeg\n"
        ),
    )
    .unwrap();

    ws.replay(&cassette)
        .args(["generate", "-i", "cat.jpg", "--format", "png", "--no-gallery", "-o"])
        .arg(ws.out_dir())
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    let outputs = ws.outputs();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].extension().unwrap(), "png");
    let data = std::fs::read(&outputs[0]).unwrap();
    assert_eq!(
        &data[..8],
        &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
        "output should be a valid PNG file"
    );
}
