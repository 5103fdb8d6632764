use std::str::FromStr;
use tracing::{info, warn};

use crate::config::{BlankSettings, DetectorSettings, FlickerSettings, FreezeSettings};
use crate::pipeline::detection_pipeline::{DetectionPipeline, DetectorSlot};
use crate::pipeline::detectors::{BlankDetector, FlickerDetector, FreezeDetector};

/// Detector names accepted in configuration. Names must match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Blank,
    Freeze,
    Flicker,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 3] = [DetectorKind::Blank, DetectorKind::Freeze, DetectorKind::Flicker];
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "blank" => Ok(DetectorKind::Blank),
            "freeze" => Ok(DetectorKind::Freeze),
            "flicker" => Ok(DetectorKind::Flicker),
            other => Err(format!("unknown detector '{other}'")),
        }
    }
}

impl From<&BlankSettings> for BlankDetector {
    fn from(settings: &BlankSettings) -> Self {
        BlankDetector::new()
            .with_luma_threshold(settings.luma_thresh)
            .with_saturation_threshold(settings.sat_thresh)
            .with_pct(settings.pct)
            .with_min_frames(settings.frames)
    }
}

impl From<&FreezeSettings> for FreezeDetector {
    fn from(settings: &FreezeSettings) -> Self {
        FreezeDetector::new()
            .with_mad_threshold(settings.mad)
            .with_min_frames(settings.frames)
    }
}

impl From<&FlickerSettings> for FlickerDetector {
    fn from(settings: &FlickerSettings) -> Self {
        FlickerDetector::new()
            .with_window(settings.window)
            .with_ratio_threshold(settings.ratio_thresh)
    }
}

/// Builds the slot for one detector kind from its configured thresholds.
pub fn build_detector(kind: DetectorKind, settings: &DetectorSettings) -> DetectorSlot {
    match kind {
        DetectorKind::Blank => BlankDetector::from(&settings.blank).into(),
        DetectorKind::Freeze => FreezeDetector::from(&settings.freeze).into(),
        DetectorKind::Flicker => FlickerDetector::from(&settings.flicker).into(),
    }
}

/// Builds a pipeline in the configured order.
///
/// Unknown names are skipped with a warning so configuration written for a
/// newer release still loads.
pub fn build_pipeline(settings: &DetectorSettings) -> DetectionPipeline {
    let mut pipeline = DetectionPipeline::new();
    for name in &settings.order {
        match name.parse::<DetectorKind>() {
            Ok(kind) => pipeline = pipeline.add_detector(build_detector(kind, settings)),
            Err(e) => warn!("Skipping detector: {}", e),
        }
    }
    if pipeline.is_empty() {
        warn!("No known detectors configured, frames will pass through unchecked");
    } else {
        info!("Detection pipeline ready: {:?}", pipeline.detector_names());
    }
    pipeline
}
