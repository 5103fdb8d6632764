pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod intake;
pub mod output;
pub mod pipeline;
pub mod synthetic;

pub use common::{AnomalyEvent, AnomalyType, FramePacket, ImageHandle, Severity};
pub use config::Settings;
pub use coordinator::{Coordinator, CoordinatorBuilder, RunSummary};
pub use error::AppError;
pub use pipeline::{build_pipeline, DetectionPipeline};
