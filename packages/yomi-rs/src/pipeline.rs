//! Per-source orchestration of the two-pass OCR loop.
//!
//! Each source gets one [`SourcePipeline`] task that owns the
//! [`StabilizationController`] and is its only writer. Frames arrive over a
//! channel, are reconstructed and filtered, and every refinement the controller
//! asks for is handed to a [`RefinementWorker`] through a [`RefinementQueue`].
//! The worker calls the slow OCR provider and reports the text it emitted back
//! to the source task, which stays the controller's only writer.
use crate::config::PipelineConfig;
use crate::filter::TextFilter;
use crate::queue::RefinementQueue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use yomi_ocr::{
  reconstruct, Action, CropRegion, LayoutOptions, OcrEngine, OcrError, OcrFrame, OcrInput,
  OcrRequest, RefinementRequest, StabilizationController, TriggerReason,
};

const FRAME_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("pipeline for source '{0}' is closed")]
  Closed(String),
  #[error("no reference image was captured for this text")]
  MissingImage,
  #[error("refinement returned no text")]
  EmptyRefinement,
  #[error(transparent)]
  Ocr(#[from] OcrError),
}

/// One capture from a screen source, as detected by the fast OCR pass.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
  pub frame: OcrFrame,
  /// Image the slow pass re-reads if this text turns out to be stable.
  pub image: Option<Arc<OcrInput>>,
  pub crop_region: Option<CropRegion>,
  pub captured_at: DateTime<Utc>,
}

impl CapturedFrame {
  pub fn new(frame: OcrFrame) -> Self {
    Self {
      frame,
      image: None,
      crop_region: None,
      captured_at: Utc::now(),
    }
  }

  pub fn with_image(mut self, image: OcrInput) -> Self {
    self.image = Some(Arc::new(image));
    self
  }

  pub fn with_crop(mut self, crop_region: Option<CropRegion>) -> Self {
    self.crop_region = crop_region;
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
  /// Fast-pass text changed.
  Draft { text: String, paragraphs: usize },
  /// The slow pass finished for a stable region.
  Refined {
    text: String,
    draft: String,
    reason: TriggerReason,
    pending_since: DateTime<Utc>,
    engine: String,
  },
  RefinementFailed { draft: String, error: String },
  /// The queue was full and this request was superseded.
  RefinementDropped { draft: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineEvent {
  pub source: String,
  #[serde(flatten)]
  pub kind: EventKind,
}

impl fmt::Display for PipelineEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      EventKind::Draft { text, .. } => write!(f, "[{}] draft: {}", self.source, text),
      EventKind::Refined { text, reason, .. } => {
        write!(f, "[{}] refined ({:?}): {}", self.source, reason, text)
      }
      EventKind::RefinementFailed { draft, error } => {
        write!(f, "[{}] refinement failed for '{}': {}", self.source, draft, error)
      }
      EventKind::RefinementDropped { draft } => {
        write!(f, "[{}] refinement dropped: {}", self.source, draft)
      }
    }
  }
}

/// A refinement waiting for the worker.
#[derive(Debug, Clone)]
pub struct RefinementJob {
  pub source: String,
  pub request: RefinementRequest,
}

/// Inputs of a source loop, handled strictly in the order they were sent.
#[derive(Debug)]
enum SourceInput {
  Frame(CapturedFrame),
  ForceStable,
}

/// Text the worker emitted for a refinement.
#[derive(Debug)]
struct Emitted(String);

/// What one frame produced.
#[derive(Debug, Default)]
pub struct FrameOutcome {
  pub draft: Option<PipelineEvent>,
  pub job: Option<RefinementJob>,
}

pub struct SourcePipeline {
  source: String,
  config: PipelineConfig,
  filter: TextFilter,
  controller: StabilizationController,
  last_draft: Option<String>,
}

impl SourcePipeline {
  pub fn new(source: impl Into<String>, config: PipelineConfig) -> Self {
    Self {
      source: source.into(),
      filter: TextFilter::new(config.filter),
      controller: StabilizationController::new(config.stabilizer.clone()),
      config,
      last_draft: None,
    }
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn controller(&self) -> &StabilizationController {
    &self.controller
  }

  /// Runs one captured frame through layout, filtering and stabilization.
  pub fn process(&mut self, captured: CapturedFrame) -> FrameOutcome {
    let layout = reconstruct(&captured.frame, &self.config.layout);
    let text = self.filter.apply(&layout.text);

    let draft = if !text.is_empty() && self.last_draft.as_deref() != Some(text.as_str()) {
      self.last_draft = Some(text.clone());
      Some(self.event(EventKind::Draft {
        text: text.clone(),
        paragraphs: layout.paragraphs.len(),
      }))
    } else {
      None
    };
    if text.is_empty() {
      self.last_draft = None;
    }

    let action = self.controller.observe(
      &text,
      &layout.text,
      captured.image,
      captured.crop_region,
      captured.captured_at,
    );
    FrameOutcome {
      draft,
      job: self.job_for(action),
    }
  }

  /// Treats the end of the stream as the text disappearing.
  pub fn finish(&mut self, now: DateTime<Utc>) -> Option<RefinementJob> {
    let action = self.controller.observe("", "", None, None, now);
    self.job_for(action)
  }

  pub fn force_stable(&mut self) {
    self.controller.request_stable();
  }

  /// Records the text actually shown for the last refinement.
  pub fn record_emitted(&mut self, text: impl Into<String>) {
    self.controller.set_last_emitted_text(text);
  }

  fn job_for(&self, action: Action) -> Option<RefinementJob> {
    match action {
      Action::TriggerRefinement(request) => {
        info!(source = %self.source, reason = ?request.reason, "queueing refinement");
        Some(RefinementJob {
          source: self.source.clone(),
          request,
        })
      }
      Action::UpdateOnly | Action::None => None,
    }
  }

  fn event(&self, kind: EventKind) -> PipelineEvent {
    PipelineEvent {
      source: self.source.clone(),
      kind,
    }
  }

  /// Starts the source loop and its refinement worker.
  ///
  /// The event channel is unbounded: neither task waits on the receiver, so
  /// events may be drained during the run or after [`PipelineHandle::shutdown`].
  pub fn spawn(
    self,
    engine: Arc<dyn OcrEngine>,
  ) -> (PipelineHandle, mpsc::UnboundedReceiver<PipelineEvent>) {
    let (input_tx, input_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
    let (feedback_tx, feedback_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let queue = Arc::new(RefinementQueue::new(self.config.queue_capacity));

    let worker = RefinementWorker {
      engine,
      queue: queue.clone(),
      layout: self.config.layout.clone(),
      filter: self.filter,
      events: event_tx.clone(),
      feedback: feedback_tx,
    };
    let source = self.source.clone();
    let worker_task = tokio::spawn(worker.run());
    let source_task = tokio::spawn(self.run(input_rx, feedback_rx, queue, event_tx));

    let handle = PipelineHandle {
      source,
      inputs: input_tx,
      source_task,
      worker_task,
    };
    (handle, event_rx)
  }

  async fn run(
    mut self,
    mut inputs: mpsc::Receiver<SourceInput>,
    mut feedback: mpsc::Receiver<Emitted>,
    queue: Arc<RefinementQueue<RefinementJob>>,
    events: mpsc::UnboundedSender<PipelineEvent>,
  ) {
    debug!(source = %self.source, "source loop started");
    loop {
      tokio::select! {
        biased;
        Some(Emitted(text)) = feedback.recv() => self.record_emitted(text),
        input = inputs.recv() => match input {
          Some(SourceInput::Frame(frame)) => {
            let outcome = self.process(frame);
            if let Some(draft) = outcome.draft {
              send_event(&events, draft);
            }
            if let Some(job) = outcome.job {
              self.enqueue(&queue, &events, job);
            }
          }
          Some(SourceInput::ForceStable) => self.force_stable(),
          None => break,
        },
      }
    }

    if let Some(job) = self.finish(Utc::now()) {
      self.enqueue(&queue, &events, job);
    }
    queue.close();
    debug!(source = %self.source, "source loop finished");
  }

  fn enqueue(
    &self,
    queue: &RefinementQueue<RefinementJob>,
    events: &mpsc::UnboundedSender<PipelineEvent>,
    job: RefinementJob,
  ) {
    if let Some(dropped) = queue.push(job) {
      warn!(source = %self.source, "refinement queue full, dropping oldest request");
      let draft = dropped.request.pending.text;
      send_event(events, self.event(EventKind::RefinementDropped { draft }));
    }
  }
}

fn send_event(events: &mpsc::UnboundedSender<PipelineEvent>, event: PipelineEvent) {
  if events.send(event).is_err() {
    debug!("event receiver dropped");
  }
}

/// Runs the slow OCR pass for stable text, one job at a time.
pub struct RefinementWorker {
  engine: Arc<dyn OcrEngine>,
  queue: Arc<RefinementQueue<RefinementJob>>,
  layout: LayoutOptions,
  filter: TextFilter,
  events: mpsc::UnboundedSender<PipelineEvent>,
  feedback: mpsc::Sender<Emitted>,
}

impl RefinementWorker {
  async fn run(self) {
    while let Some(job) = self.queue.pop().await {
      let source = job.source.clone();
      let draft = job.request.pending.text.clone();
      let kind = match self.refine(&job.request).await {
        Ok(text) => {
          info!(source = %source, engine = self.engine.name(), "refinement finished");
          if self.feedback.send(Emitted(text.clone())).await.is_err() {
            debug!(source = %source, "source loop already finished");
          }
          EventKind::Refined {
            text,
            draft,
            reason: job.request.reason,
            pending_since: job.request.pending.start_time,
            engine: self.engine.name().to_string(),
          }
        }
        Err(e) => {
          warn!(source = %source, error = %e, "refinement failed");
          EventKind::RefinementFailed {
            draft,
            error: e.to_string(),
          }
        }
      };
      send_event(&self.events, PipelineEvent { source, kind });
    }
  }

  /// Re-reads the snapshot's image and returns the filtered text.
  async fn refine(&self, request: &RefinementRequest) -> Result<String, PipelineError> {
    refine_with(self.engine.as_ref(), &self.layout, &self.filter, request).await
  }
}

/// One slow-pass read of a stable region.
pub async fn refine_with(
  engine: &dyn OcrEngine,
  layout: &LayoutOptions,
  filter: &TextFilter,
  request: &RefinementRequest,
) -> Result<String, PipelineError> {
  let image = request.pending.reference_image.clone().ok_or(PipelineError::MissingImage)?;
  let ocr_request = OcrRequest::new(image).with_crop(request.pending.crop_region);
  let result = engine.recognize(&ocr_request).await?;
  if !result.success {
    return Err(PipelineError::EmptyRefinement);
  }

  let raw = match (&result.frame, &result.text) {
    (Some(frame), _) => reconstruct(frame, layout).text,
    (None, Some(text)) => text.clone(),
    (None, None) => String::new(),
  };
  let text = filter.apply(&raw);
  if text.is_empty() {
    return Err(PipelineError::EmptyRefinement);
  }
  Ok(text)
}

/// Control surface of a running pipeline.
pub struct PipelineHandle {
  source: String,
  inputs: mpsc::Sender<SourceInput>,
  source_task: JoinHandle<()>,
  worker_task: JoinHandle<()>,
}

impl PipelineHandle {
  pub async fn submit(&self, frame: CapturedFrame) -> Result<(), PipelineError> {
    self
      .inputs
      .send(SourceInput::Frame(frame))
      .await
      .map_err(|_| PipelineError::Closed(self.source.clone()))
  }

  /// Makes the next non-empty frame refine whatever text is pending.
  pub async fn force_stable(&self) -> Result<(), PipelineError> {
    self
      .inputs
      .send(SourceInput::ForceStable)
      .await
      .map_err(|_| PipelineError::Closed(self.source.clone()))
  }

  /// Ends the frame stream, then waits for pending refinements to finish.
  pub async fn shutdown(self) -> anyhow::Result<()> {
    let PipelineHandle {
      inputs,
      source_task,
      worker_task,
      ..
    } = self;
    drop(inputs);
    source_task.await?;
    worker_task.await?;
    Ok(())
  }
}
