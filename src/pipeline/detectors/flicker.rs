use std::collections::VecDeque;
use tracing::debug;

use super::measure::{high_frequency_ratio, mean_luma};
use super::{Detector, EventCounter};
use crate::common::{AnomalyEvent, AnomalyType, FramePacket};

/// Flicker detector - flags rapid brightness oscillation over a sliding window
#[derive(Debug, Clone)]
pub struct FlickerDetector {
    window: usize,
    ratio_thresh: f64,
}

#[derive(Debug, Default)]
pub struct FlickerState {
    lumas: VecDeque<f64>,
    events: EventCounter,
}

impl FlickerState {
    pub fn buffered(&self) -> usize {
        self.lumas.len()
    }
}

impl FlickerDetector {
    pub fn new() -> Self {
        Self {
            window: 8,
            ratio_thresh: 0.6,
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_ratio_threshold(mut self, ratio_thresh: f64) -> Self {
        self.ratio_thresh = ratio_thresh;
        self
    }
}

impl Default for FlickerDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for FlickerDetector {
    type State = FlickerState;

    fn process(&self, frame: &FramePacket, state: &mut FlickerState) -> Option<AnomalyEvent> {
        let image = match frame.image() {
            Ok(image) => image,
            Err(e) => {
                debug!("Flicker detector skipping frame {}: {}", frame.frame_id(), e);
                return None;
            }
        };

        state.lumas.push_back(mean_luma(&image.to_rgb8()));
        while state.lumas.len() > self.window {
            state.lumas.pop_front();
        }
        if self.window == 0 || state.lumas.len() < self.window {
            return None;
        }

        let ratio = high_frequency_ratio(state.lumas.make_contiguous());
        if ratio < self.ratio_thresh {
            return None;
        }
        // A fresh window has to fill before the same oscillation can fire again.
        state.lumas.clear();

        Some(
            AnomalyEvent::new(
                state.events.next_id(),
                AnomalyType::Flicker,
                frame.clone(),
                ratio,
            )
            .with_metric("high_freq_ratio", ratio),
        )
    }

    fn anomaly_type(&self) -> AnomalyType {
        AnomalyType::Flicker
    }

    fn name(&self) -> &'static str {
        "FlickerDetector"
    }
}
