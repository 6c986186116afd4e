// Integration tests for the lobby nickname OCR pipeline
// Library tests swap in a canned recognizer so no Tesseract install is needed

use image::{GrayImage, Rgba, RgbaImage};
use lobby_nickname_ocr::ocr::{NoopCorrector, SpellCorrector, TextRecognizer, MAX_NICKNAMES};
use lobby_nickname_ocr::{NicknameError, NicknamePipeline, NicknameReport, PipelineConfig};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;

struct CannedRecognizer(String);

impl TextRecognizer for CannedRecognizer {
    fn recognize(&self, _bitmap: &GrayImage) -> Result<String, NicknameError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

/// Appends a marker to every word it sees
struct SuffixCorrector;

impl SpellCorrector for SuffixCorrector {
    fn correct(&self, word: &str) -> anyhow::Result<String> {
        Ok(format!("{}가", word))
    }

    fn name(&self) -> &'static str {
        "suffix"
    }
}

/// Helper to create a simple test screenshot
fn create_test_image(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

fn write_screenshot(dir: &Path) -> PathBuf {
    let path = dir.join("lobby.png");
    create_test_image(320, 180, Rgba([40, 40, 60, 255]))
        .save(&path)
        .unwrap();
    path
}

fn pipeline_with_text(text: &str) -> NicknamePipeline {
    NicknamePipeline::new(
        &PipelineConfig::default(),
        Box::new(CannedRecognizer(text.to_string())),
        Box::new(NoopCorrector),
    )
}

#[test]
fn test_pipeline_end_to_end_with_canned_text() {
    let dir = tempfile::tempdir().unwrap();
    let screenshot = write_screenshot(dir.path());

    let pipeline = pipeline_with_text("대기실\n테스트유저1 Lv 60\nRedDragon\n파티장 골드헌터\n!!!\n");
    let list = pipeline.run(&screenshot).unwrap();

    assert_eq!(list.nicknames, vec!["테스트유저1", "RedDragon", "골드헌터"]);
    assert_eq!(list.total_found, 3);
}

#[test]
fn test_duplicate_nicknames_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let screenshot = write_screenshot(dir.path());

    let pipeline = pipeline_with_text("로아마스터\nPvpKing\n로아마스터\nPvpKing 로아마스터");
    let list = pipeline.run(&screenshot).unwrap();

    assert_eq!(list.nicknames, vec!["로아마스터", "PvpKing"]);
    assert_eq!(list.total_found, 2);
}

#[test]
fn test_more_than_ten_nicknames_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let screenshot = write_screenshot(dir.path());

    let text: Vec<String> = (1..=15).map(|i| format!("플레이어{}", i)).collect();
    let pipeline = pipeline_with_text(&text.join("\n"));
    let list = pipeline.run(&screenshot).unwrap();

    assert_eq!(list.nicknames.len(), MAX_NICKNAMES);
    assert_eq!(list.total_found, 15);
    assert_eq!(list.nicknames[0], "플레이어1");
    assert_eq!(list.nicknames[9], "플레이어10");
}

#[test]
fn test_no_valid_nickname_is_failure() {
    let dir = tempfile::tempdir().unwrap();
    let screenshot = write_screenshot(dir.path());

    let pipeline = pipeline_with_text("레벨 60\n12345\nab\n파티 모집");
    let outcome = pipeline.run(&screenshot);
    assert!(matches!(outcome, Err(NicknameError::EmptyResult)));

    let value: Value = serde_json::from_str(&NicknameReport::from_outcome(outcome).to_json()).unwrap();
    assert_eq!(value["success"], Value::Bool(false));
    assert!(value.get("nicknames").is_none());
    assert!(!value["error"].as_str().unwrap().is_empty());
}

#[test]
fn test_corrections_only_touch_hangul_words() {
    let dir = tempfile::tempdir().unwrap();
    let screenshot = write_screenshot(dir.path());

    let pipeline = NicknamePipeline::new(
        &PipelineConfig::default(),
        Box::new(CannedRecognizer("골드헌터\nRedDragon".to_string())),
        Box::new(SuffixCorrector),
    );
    let list = pipeline.run(&screenshot).unwrap();

    assert_eq!(list.nicknames, vec!["골드헌터가", "RedDragon"]);
}

#[test]
fn test_debug_dump_written_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let screenshot = write_screenshot(dir.path());
    let debug_dir = dir.path().join("debug");

    let config = PipelineConfig {
        debug_dir: Some(debug_dir.clone()),
        ..PipelineConfig::default()
    };
    let pipeline = NicknamePipeline::new(
        &config,
        Box::new(CannedRecognizer("로아마스터".to_string())),
        Box::new(NoopCorrector),
    );
    pipeline.run(&screenshot).unwrap();

    assert!(debug_dir.join("roi.png").exists());
    assert!(debug_dir.join("processed.png").exists());
}

#[test]
fn test_binary_without_argument_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_nickname-ocr"))
        .output()
        .expect("failed to run binary");

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value["success"], Value::Bool(false));
    assert!(value["error"].is_string());
}

#[test]
fn test_binary_with_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.png");

    let output = Command::new(env!("CARGO_BIN_EXE_nickname-ocr"))
        .arg(&missing)
        .output()
        .expect("failed to run binary");

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1, "stdout must hold exactly one JSON line");
    let value: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value["success"], Value::Bool(false));
    assert!(value["error"].as_str().unwrap().contains("nope.png"));
}

#[test]
fn test_binary_with_blank_argument_reports_missing_file() {
    let output = Command::new(env!("CARGO_BIN_EXE_nickname-ocr"))
        .arg("   ")
        .output()
        .expect("failed to run binary");

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value["success"], Value::Bool(false));
    assert!(value["error"].as_str().unwrap().starts_with("Image file not found"));
}
