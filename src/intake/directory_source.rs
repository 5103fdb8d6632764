use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::FrameSource;
use crate::common::FramePacket;
use crate::error::AppError;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frames saved as image files in one directory, played back in file name order.
pub struct DirectoryFrameSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    start_id: u64,
    base_time: DateTime<Utc>,
    interval: Duration,
}

impl DirectoryFrameSource {
    pub async fn open(dir: impl AsRef<Path>, fps: u32) -> Result<Self, AppError> {
        let dir = dir.as_ref();
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_frame_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        debug!("Found {} frames in {:?}", paths.len(), dir);

        Ok(Self {
            paths,
            cursor: 0,
            start_id: 0,
            base_time: Utc::now(),
            interval: Duration::microseconds(1_000_000 / fps.max(1) as i64),
        })
    }

    pub fn with_start_id(mut self, start_id: u64) -> Self {
        self.start_id = start_id;
        self
    }

    pub fn with_base_time(mut self, base_time: DateTime<Utc>) -> Self {
        self.base_time = base_time;
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

#[async_trait]
impl FrameSource for DirectoryFrameSource {
    async fn next_frame(&mut self) -> Result<Option<FramePacket>, AppError> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        let index = self.cursor as u64;
        self.cursor += 1;

        let timestamp = self.base_time + self.interval * index as i32;
        Ok(Some(FramePacket::from_path(
            self.start_id + index,
            timestamp,
            path.clone(),
        )))
    }
}
