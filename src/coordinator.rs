use std::collections::BTreeMap;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::common::{AnomalyEvent, AnomalyType, FramePacket};
use crate::config::Settings;
use crate::error::AppError;
use crate::intake::FrameSource;
use crate::output::EventSink;
use crate::pipeline::DetectionPipeline;

/// Totals for one coordinator run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames_captured: u64,
    pub frames_processed: u64,
    pub events_emitted: u64,
    pub events_by_type: BTreeMap<AnomalyType, u64>,
}

/// Drives capture -> detection -> sink over bounded queues.
///
/// Detection runs on a single blocking worker that owns the pipeline, so
/// frames reach the detectors strictly in capture order.
pub struct Coordinator {
    frame_queue_size: usize,
    event_queue_size: usize,
    pipeline: DetectionPipeline,
    cancel_token: CancellationToken,
}

impl Coordinator {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub async fn run<S, K>(self, source: S, sink: K) -> Result<RunSummary, AppError>
    where
        S: FrameSource + 'static,
        K: EventSink + 'static,
    {
        let (frame_tx, frame_rx) = mpsc::channel(self.frame_queue_size);
        let (event_tx, event_rx) = mpsc::channel(self.event_queue_size);

        let capture_task = Self::start_capture_task(source, frame_tx, self.cancel_token.clone());
        let detection_task =
            Self::start_detection_task(self.pipeline, frame_rx, event_tx, self.cancel_token.clone());
        let sink_task = Self::start_sink_task(sink, event_rx);

        let captured = join_stage("capture", capture_task).await;
        let processed = join_stage("detection", detection_task).await;
        let delivered = join_stage("sink", sink_task).await;

        // A failing sink closes the event queue, so report it ahead of the
        // detection stage that tripped over the closed queue.
        let frames_captured = captured?;
        let events_by_type = delivered?;
        let frames_processed = processed?;

        let summary = RunSummary {
            frames_captured,
            frames_processed,
            events_emitted: events_by_type.values().sum(),
            events_by_type,
        };
        info!(
            "Run finished: {} frames, {} events",
            summary.frames_processed, summary.events_emitted
        );
        Ok(summary)
    }

    fn start_capture_task<S: FrameSource + 'static>(
        mut source: S,
        frame_tx: Sender<FramePacket>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<Result<u64, AppError>> {
        tokio::spawn(async move {
            let mut captured = 0;
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => {
                        debug!("Capture cancelled after {} frames", captured);
                        break;
                    }
                    next = source.next_frame() => next?,
                };
                let Some(frame) = next else {
                    break;
                };
                if frame_tx.send(frame).await.is_err() {
                    debug!("Frame queue closed, stopping capture");
                    break;
                }
                captured += 1;
            }
            Ok(captured)
        })
    }

    fn start_detection_task(
        mut pipeline: DetectionPipeline,
        mut frame_rx: Receiver<FramePacket>,
        event_tx: Sender<AnomalyEvent>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<Result<u64, AppError>> {
        tokio::task::spawn_blocking(move || {
            while let Some(frame) = frame_rx.blocking_recv() {
                if cancel_token.is_cancelled() {
                    break;
                }
                for event in pipeline.process(&frame) {
                    event_tx
                        .blocking_send(event)
                        .map_err(|_| AppError::ChannelClosed("event"))?;
                }
            }
            Ok(pipeline.frames_processed())
        })
    }

    fn start_sink_task<K: EventSink + 'static>(
        mut sink: K,
        mut event_rx: Receiver<AnomalyEvent>,
    ) -> JoinHandle<Result<BTreeMap<AnomalyType, u64>, AppError>> {
        tokio::spawn(async move {
            let mut counts = BTreeMap::new();
            while let Some(event) = event_rx.recv().await {
                *counts.entry(event.anomaly_type()).or_insert(0) += 1;
                sink.accept(event).await?;
            }
            sink.finish().await?;
            Ok(counts)
        })
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}

async fn join_stage<T>(
    stage: &'static str,
    handle: JoinHandle<Result<T, AppError>>,
) -> Result<T, AppError> {
    match handle.await {
        Ok(result) => {
            if let Err(e) = &result {
                error!("{} stage failed: {}", stage, e);
            }
            result
        }
        Err(e) => Err(AppError::Stage(stage, e.to_string())),
    }
}

pub struct CoordinatorBuilder {
    frame_queue_size: usize,
    event_queue_size: usize,
    pipeline: Option<DetectionPipeline>,
    cancel_token: Option<CancellationToken>,
}

impl CoordinatorBuilder {
    pub fn new(settings: &Settings) -> Self {
        Self {
            frame_queue_size: settings.frame_queue_size,
            event_queue_size: settings.event_queue_size,
            pipeline: None,
            cancel_token: None,
        }
    }

    // Adjusts the frame queue size, this will override the configured value.
    pub fn frame_queue_size(mut self, frame_queue_size: usize) -> Self {
        self.frame_queue_size = frame_queue_size;
        self
    }

    // Adjusts the event queue size, this will override the configured value.
    pub fn event_queue_size(mut self, event_queue_size: usize) -> Self {
        self.event_queue_size = event_queue_size;
        self
    }

    pub fn pipeline(mut self, pipeline: DetectionPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    // Shares cancellation with an outer scope such as a signal handler.
    pub fn cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = Some(cancel_token);
        self
    }

    pub fn build(self) -> Result<Coordinator, AppError> {
        let pipeline = self
            .pipeline
            .ok_or(AppError::Pipeline("Pipeline not set".to_string()))?;
        if self.frame_queue_size == 0 || self.event_queue_size == 0 {
            return Err(AppError::Pipeline(
                "Queue sizes must be greater than 0".to_string(),
            ));
        }
        Ok(Coordinator {
            frame_queue_size: self.frame_queue_size,
            event_queue_size: self.event_queue_size,
            pipeline,
            cancel_token: self.cancel_token.unwrap_or_default(),
        })
    }
}
