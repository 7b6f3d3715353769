mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use yomi_ocr::{reconstruct, OcrFrame};
use yomi_rs::{load_replay, run_replay, PipelineConfig, RecordedOcrEngine};

#[tokio::main]
async fn main() {
  let args = Args::parse();
  init_tracing(args.verbose);

  if let Err(e) = run(args.command).await {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
  }
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    )
    .with_writer(std::io::stderr)
    .init();
}

async fn run(command: Commands) -> Result<()> {
  match command {
    Commands::Version => {
      println!("yomi {}", env!("CARGO_PKG_VERSION"));
      Ok(())
    }
    Commands::Layout {
      frame,
      no_furigana,
      json,
    } => layout(&frame, no_furigana, json),
    Commands::Replay {
      path,
      config,
      source,
      json,
    } => replay(path, config, source, json).await,
  }
}

fn layout(path: &Path, no_furigana: bool, json: bool) -> Result<()> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read frame {}", path.display()))?;
  let frame: OcrFrame = serde_json::from_str(&raw)
    .with_context(|| format!("Invalid frame document {}", path.display()))?;

  let mut options = PipelineConfig::default().layout;
  if no_furigana {
    options.furigana_filter = false;
  }
  let result = reconstruct(&frame, &options);

  if json {
    println!("{}", serde_json::to_string_pretty(&result)?);
  } else if !result.text.is_empty() {
    println!("{}", result.text);
  }
  Ok(())
}

async fn replay(path: PathBuf, config: Option<PathBuf>, source: String, json: bool) -> Result<()> {
  let config = PipelineConfig::load_or_default(config.as_deref())?;
  let steps = load_replay(&path)?;
  let engine = Arc::new(RecordedOcrEngine::default());
  let events = run_replay(steps, &source, config, engine).await?;

  for event in events {
    if json {
      println!("{}", serde_json::to_string(&event)?);
    } else {
      println!("{}", event);
    }
  }
  Ok(())
}
