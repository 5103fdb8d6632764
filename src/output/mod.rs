pub mod json_lines_sink;
pub mod memory_sink;

pub use json_lines_sink::JsonLinesSink;
pub use memory_sink::MemorySink;

use async_trait::async_trait;

use crate::common::AnomalyEvent;
use crate::error::AppError;

/// Receives events leaving the detection stage.
#[async_trait]
pub trait EventSink: Send {
    async fn accept(&mut self, event: AnomalyEvent) -> Result<(), AppError>;

    /// Called once after the last event.
    async fn finish(&mut self) -> Result<(), AppError> {
        Ok(())
    }
}
