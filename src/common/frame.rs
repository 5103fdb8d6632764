use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AppError;

/// Where the pixels of a frame live.
#[derive(Debug, Clone)]
pub enum ImageHandle {
    /// An encoded image on disk, decoded every time it is read.
    Path(PathBuf),
    /// An already decoded image shared between clones of the packet.
    Memory(Arc<DynamicImage>),
}

impl Serialize for ImageHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ImageHandle::Path(path) => serializer.serialize_some(path),
            ImageHandle::Memory(_) => serializer.serialize_none(),
        }
    }
}

/// One decoded, addressable frame of a capture session.
#[derive(Debug, Clone, Serialize)]
pub struct FramePacket {
    frame_id: u64,
    timestamp: DateTime<Utc>,
    #[serde(rename = "path")]
    image: ImageHandle,
    checksum: Option<String>,
}

impl FramePacket {
    pub fn new(frame_id: u64, timestamp: DateTime<Utc>, image: ImageHandle) -> Self {
        Self {
            frame_id,
            timestamp,
            image,
            checksum: None,
        }
    }

    pub fn from_path(frame_id: u64, timestamp: DateTime<Utc>, path: impl Into<PathBuf>) -> Self {
        Self::new(frame_id, timestamp, ImageHandle::Path(path.into()))
    }

    pub fn from_image(frame_id: u64, timestamp: DateTime<Utc>, image: DynamicImage) -> Self {
        Self::new(frame_id, timestamp, ImageHandle::Memory(Arc::new(image)))
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.image {
            ImageHandle::Path(path) => Some(path),
            ImageHandle::Memory(_) => None,
        }
    }

    /// Decodes (or shares) the pixel data behind this packet.
    pub fn image(&self) -> Result<Arc<DynamicImage>, AppError> {
        match &self.image {
            ImageHandle::Path(path) => Ok(Arc::new(image::open(path)?)),
            ImageHandle::Memory(image) => Ok(Arc::clone(image)),
        }
    }
}
