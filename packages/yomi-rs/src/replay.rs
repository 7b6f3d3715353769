//! Replays recorded OCR sessions through a full pipeline.
//!
//! A session is either a JSON Lines file, one frame document per line, or a
//! directory of `*.json` frame documents read in file name order. JSONL files
//! may also carry `{"command": "force_stable"}` lines.
use crate::config::PipelineConfig;
use crate::pipeline::{CapturedFrame, PipelineEvent, SourcePipeline};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use walkdir::WalkDir;
use yomi_ocr::{OcrEngine, OcrFrame, OcrInput};

#[derive(Debug, Clone)]
pub enum ReplayStep {
  Frame(CapturedFrame),
  ForceStable,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReplayCommand {
  ForceStable,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayLine {
  Command { command: ReplayCommand },
  Frame(OcrFrame),
}

pub fn load_replay(path: &Path) -> Result<Vec<ReplayStep>> {
  if path.is_dir() {
    load_directory(path)
  } else {
    load_lines(path)
  }
}

fn load_lines(path: &Path) -> Result<Vec<ReplayStep>> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read replay file {}", path.display()))?;
  let mut steps = Vec::new();
  for (index, line) in raw.lines().enumerate() {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }
    let parsed: ReplayLine = serde_json::from_str(line)
      .with_context(|| format!("Invalid replay entry at {}:{}", path.display(), index + 1))?;
    steps.push(match parsed {
      ReplayLine::Command {
        command: ReplayCommand::ForceStable,
      } => ReplayStep::ForceStable,
      ReplayLine::Frame(frame) => {
        let image = OcrInput::Bytes(line.as_bytes().to_vec());
        ReplayStep::Frame(CapturedFrame::new(frame).with_image(image))
      }
    });
  }
  Ok(steps)
}

fn load_directory(dir: &Path) -> Result<Vec<ReplayStep>> {
  let mut steps = Vec::new();
  for entry in WalkDir::new(dir)
    .sort_by_file_name()
    .into_iter()
    .filter_map(|e| e.ok())
  {
    let path = entry.path();
    if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
      continue;
    }
    let raw = std::fs::read(path)
      .with_context(|| format!("Failed to read frame {}", path.display()))?;
    let frame: OcrFrame = serde_json::from_slice(&raw)
      .with_context(|| format!("Invalid frame document {}", path.display()))?;
    steps.push(ReplayStep::Frame(
      CapturedFrame::new(frame).with_image(OcrInput::FilePath(path.to_path_buf())),
    ));
  }
  Ok(steps)
}

/// Feeds `steps` to a fresh pipeline and collects every event it produced.
pub async fn run_replay(
  steps: Vec<ReplayStep>,
  source: &str,
  config: PipelineConfig,
  engine: Arc<dyn OcrEngine>,
) -> Result<Vec<PipelineEvent>> {
  let (handle, mut events) = SourcePipeline::new(source, config).spawn(engine);
  let collector = tokio::spawn(async move {
    let mut received = Vec::new();
    while let Some(event) = events.recv().await {
      received.push(event);
    }
    received
  });

  let total = steps.len();
  for step in steps {
    match step {
      ReplayStep::Frame(frame) => handle.submit(frame).await?,
      ReplayStep::ForceStable => handle.force_stable().await?,
    }
  }
  handle.shutdown().await?;

  let received = collector.await.context("Event collector stopped unexpectedly")?;
  info!(source, steps = total, events = received.len(), "replay finished");
  Ok(received)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("yomi-replay-{}-{}", std::process::id(), name))
  }

  #[test]
  fn test_jsonl_lines_and_commands_are_parsed() {
    let path = temp_path("session.jsonl");
    fs::write(
      &path,
      "{\"image_width\": 100, \"image_height\": 100}\n\n{\"command\": \"force_stable\"}\n",
    )
    .unwrap();
    let steps = load_replay(&path).unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(steps.len(), 2);
    assert!(matches!(steps[0], ReplayStep::Frame(_)));
    assert!(matches!(steps[1], ReplayStep::ForceStable));
  }

  #[test]
  fn test_bad_line_reports_position() {
    let path = temp_path("broken.jsonl");
    fs::write(&path, "{\"image_width\": 1, \"image_height\": 1}\nnope\n").unwrap();
    let err = load_replay(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(err.to_string().contains(":2"));
  }

  #[test]
  fn test_directory_frames_are_read_in_name_order() {
    let dir = temp_path("frames");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("002.json"), r#"{"image_width": 2, "image_height": 2}"#).unwrap();
    fs::write(dir.join("001.json"), r#"{"image_width": 1, "image_height": 1}"#).unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();
    let steps = load_replay(&dir).unwrap();
    fs::remove_dir_all(&dir).ok();

    let widths: Vec<u32> = steps
      .iter()
      .filter_map(|step| match step {
        ReplayStep::Frame(captured) => Some(captured.frame.image_width),
        ReplayStep::ForceStable => None,
      })
      .collect();
    assert_eq!(widths, vec![1, 2]);
  }
}
