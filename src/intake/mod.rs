pub mod directory_source;
pub mod memory_source;

pub use directory_source::DirectoryFrameSource;
pub use memory_source::MemoryFrameSource;

use async_trait::async_trait;

use crate::common::FramePacket;
use crate::error::AppError;

/// Supplies frames to the detection stage in capture order.
#[async_trait]
pub trait FrameSource: Send {
    /// Returns the next frame, or `None` once the stream is exhausted.
    async fn next_frame(&mut self) -> Result<Option<FramePacket>, AppError>;
}
