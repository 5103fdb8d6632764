//! Stateful per-frame anomaly detectors.
//!
//! Each detector keeps its algorithm parameters in `self` and its mutable
//! progress in a separate state value owned by whoever drives it, so a fresh
//! state can be built for every pipeline (or test) without touching the
//! detector itself.

pub mod blank;
pub mod flicker;
pub mod freeze;
pub mod measure;

pub use blank::{BlankDetector, BlankState};
pub use flicker::{FlickerDetector, FlickerState};
pub use freeze::{FreezeDetector, FreezeState};

use crate::common::{AnomalyEvent, AnomalyType, FramePacket};

/// Strategy for turning a stream of frames into anomaly events.
pub trait Detector: Send + Sync {
    type State: Default + Send;

    fn process(&self, frame: &FramePacket, state: &mut Self::State) -> Option<AnomalyEvent>;
    fn anomaly_type(&self) -> AnomalyType;
    fn name(&self) -> &'static str;
}

/// Numbers the events of a single detector, starting at 1.
#[derive(Debug, Default, Clone)]
pub struct EventCounter {
    issued: u64,
}

impl EventCounter {
    pub fn next_id(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }
}
