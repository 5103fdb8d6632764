use async_trait::async_trait;
use std::collections::VecDeque;

use super::FrameSource;
use crate::common::FramePacket;
use crate::error::AppError;

/// Replays a fixed list of frames.
pub struct MemoryFrameSource {
    frames: VecDeque<FramePacket>,
}

impl MemoryFrameSource {
    pub fn new(frames: impl IntoIterator<Item = FramePacket>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl FrameSource for MemoryFrameSource {
    async fn next_frame(&mut self) -> Result<Option<FramePacket>, AppError> {
        Ok(self.frames.pop_front())
    }
}
