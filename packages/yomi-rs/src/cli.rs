//! Command line arguments backing the `yomi` binary.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
  name = "yomi",
  about = "Reading-order reconstruction and two-pass stabilization for screen OCR",
  version
)]
pub struct Args {
  /// Log pipeline decisions (overridden by RUST_LOG)
  #[arg(long, short = 'v', global = true)]
  pub verbose: bool,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Rebuild the reading order of one recorded frame
  Layout {
    /// Frame document (JSON)
    frame: PathBuf,

    /// Keep furigana lines in the output
    #[arg(long)]
    no_furigana: bool,

    /// Print the ordered paragraphs as JSON instead of plain text
    #[arg(long)]
    json: bool,
  },
  /// Run a recorded session through the full pipeline
  Replay {
    /// JSON Lines session file, or a directory of frame documents
    path: PathBuf,

    /// Pipeline configuration file (JSON)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Name reported as the event source
    #[arg(long, short = 's', default_value = "replay")]
    source: String,

    /// Print events as JSON Lines
    #[arg(long)]
    json: bool,
  },
}
