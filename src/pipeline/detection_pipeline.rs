use std::collections::HashSet;
use tracing::{debug, trace};

use crate::common::{AnomalyEvent, AnomalyType, FramePacket};
use crate::pipeline::detectors::{
    BlankDetector, BlankState, Detector, FlickerDetector, FlickerState, FreezeDetector,
    FreezeState,
};

/// A detector paired with the state it owns for the lifetime of a pipeline.
pub enum DetectorSlot {
    Blank(BlankDetector, BlankState),
    Freeze(FreezeDetector, FreezeState),
    Flicker(FlickerDetector, FlickerState),
}

impl DetectorSlot {
    pub fn process(&mut self, frame: &FramePacket) -> Option<AnomalyEvent> {
        match self {
            DetectorSlot::Blank(detector, state) => detector.process(frame, state),
            DetectorSlot::Freeze(detector, state) => detector.process(frame, state),
            DetectorSlot::Flicker(detector, state) => detector.process(frame, state),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DetectorSlot::Blank(detector, _) => detector.name(),
            DetectorSlot::Freeze(detector, _) => detector.name(),
            DetectorSlot::Flicker(detector, _) => detector.name(),
        }
    }
}

impl From<BlankDetector> for DetectorSlot {
    fn from(detector: BlankDetector) -> Self {
        DetectorSlot::Blank(detector, BlankState::default())
    }
}

impl From<FreezeDetector> for DetectorSlot {
    fn from(detector: FreezeDetector) -> Self {
        DetectorSlot::Freeze(detector, FreezeState::default())
    }
}

impl From<FlickerDetector> for DetectorSlot {
    fn from(detector: FlickerDetector) -> Self {
        DetectorSlot::Flicker(detector, FlickerState::default())
    }
}

/// Runs an ordered set of detectors over each frame and suppresses repeated
/// `(type, frame_id)` emissions.
///
/// A pipeline is driven by exactly one worker; run independent pipelines for
/// independent streams.
pub struct DetectionPipeline {
    detectors: Vec<DetectorSlot>,
    seen: HashSet<(AnomalyType, u64)>,
    frames_processed: u64,
}

impl DetectionPipeline {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
            seen: HashSet::new(),
            frames_processed: 0,
        }
    }

    pub fn add_detector(mut self, detector: impl Into<DetectorSlot>) -> Self {
        self.detectors.push(detector.into());
        self
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(DetectorSlot::name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Runs every detector, in configured order, over one frame.
    pub fn process(&mut self, frame: &FramePacket) -> Vec<AnomalyEvent> {
        self.frames_processed += 1;
        let mut events = Vec::new();
        for detector in &mut self.detectors {
            let Some(event) = detector.process(frame) else {
                continue;
            };
            if !self.seen.insert(event.dedup_key()) {
                trace!(
                    "{} repeated {} on frame {}, dropping",
                    detector.name(),
                    event.anomaly_type(),
                    frame.frame_id()
                );
                continue;
            }
            debug!(
                "{} emitted {} event {} on frame {} (confidence {:.3})",
                detector.name(),
                event.anomaly_type(),
                event.event_id(),
                frame.frame_id(),
                event.confidence()
            );
            events.push(event);
        }
        events
    }
}

impl Default for DetectionPipeline {
    fn default() -> Self {
        Self::new()
    }
}
