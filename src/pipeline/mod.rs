pub mod detection_pipeline;
pub mod detectors;
pub mod pipeline_factory;

pub use detection_pipeline::{DetectionPipeline, DetectorSlot};
pub use detectors::{BlankDetector, Detector, FlickerDetector, FreezeDetector};
pub use pipeline_factory::{build_pipeline, DetectorKind};
