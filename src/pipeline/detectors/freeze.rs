use image::RgbImage;
use tracing::debug;

use super::measure::mean_abs_diff;
use super::{Detector, EventCounter};
use crate::common::{AnomalyEvent, AnomalyType, FramePacket};

/// Freeze detector - flags sustained runs of near-identical consecutive frames
#[derive(Debug, Clone)]
pub struct FreezeDetector {
    mad_thresh: f64,
    min_frames: u32,
}

#[derive(Debug, Default)]
pub struct FreezeState {
    previous: Option<RgbImage>,
    run: u32,
    events: EventCounter,
}

impl FreezeState {
    pub fn run(&self) -> u32 {
        self.run
    }

    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }
}

impl FreezeDetector {
    pub fn new() -> Self {
        Self {
            mad_thresh: 1.0,
            min_frames: 3,
        }
    }

    pub fn with_mad_threshold(mut self, mad_thresh: f64) -> Self {
        self.mad_thresh = mad_thresh;
        self
    }

    /// A run length of 0 behaves like 1.
    pub fn with_min_frames(mut self, min_frames: u32) -> Self {
        self.min_frames = min_frames.max(1);
        self
    }
}

impl Default for FreezeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for FreezeDetector {
    type State = FreezeState;

    fn process(&self, frame: &FramePacket, state: &mut FreezeState) -> Option<AnomalyEvent> {
        let current = match frame.image() {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                debug!("Freeze detector skipping frame {}: {}", frame.frame_id(), e);
                return None;
            }
        };

        let diff = state
            .previous
            .as_ref()
            .map(|previous| mean_abs_diff(previous, &current));
        state.previous = Some(current);

        let Some(diff) = diff else {
            state.run = 0;
            return None;
        };

        // Frames of different sizes, or without pixels, cannot be frozen copies.
        let mad = match diff {
            Some(mad) if mad < self.mad_thresh => {
                state.run += 1;
                mad
            }
            _ => {
                state.run = 0;
                return None;
            }
        };

        if state.run < self.min_frames {
            return None;
        }
        state.run = 0;

        Some(
            AnomalyEvent::new(
                state.events.next_id(),
                AnomalyType::Freeze,
                frame.clone(),
                1.0 - mad / self.mad_thresh,
            )
            .with_metric("mad", mad),
        )
    }

    fn anomaly_type(&self) -> AnomalyType {
        AnomalyType::Freeze
    }

    fn name(&self) -> &'static str {
        "FreezeDetector"
    }
}
