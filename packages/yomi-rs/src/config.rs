//! Settings for one OCR pipeline, read from a JSON file.
use crate::filter::FilterLanguage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use yomi_ocr::{LayoutOptions, StabilizerConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  pub layout: LayoutOptions,
  pub stabilizer: StabilizerConfig,
  pub filter: FilterLanguage,
  /// Refinement jobs held before the oldest is dropped.
  pub queue_capacity: usize,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      layout: LayoutOptions::default(),
      stabilizer: StabilizerConfig::default(),
      filter: FilterLanguage::default(),
      queue_capacity: 4,
    }
  }
}

impl PipelineConfig {
  pub fn load(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: PipelineConfig = serde_json::from_str(&raw)
      .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config.normalized())
  }

  /// Loads `path` when given, defaults otherwise.
  pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
    match path {
      Some(path) => Self::load(path),
      None => Ok(Self::default()),
    }
  }

  fn normalized(mut self) -> Self {
    self.queue_capacity = self.queue_capacity.max(1);
    self
  }
}
