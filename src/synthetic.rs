//! Labelled synthetic clips for exercising the detectors end to end.

use chrono::{DateTime, Duration, Utc};
use image::{DynamicImage, Rgb, RgbImage};
use rand::Rng;
use std::sync::Arc;

use crate::common::{AnomalyType, FramePacket, ImageHandle};

#[derive(Debug, Clone)]
pub struct ClipSpec {
    pub label: AnomalyType,
    pub frames: usize,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

impl ClipSpec {
    pub fn new(label: AnomalyType, frames: usize, fps: u32, size: u32) -> Self {
        Self {
            label,
            frames,
            fps,
            width: size,
            height: size,
        }
    }
}

pub struct SyntheticClip {
    pub spec: ClipSpec,
    pub frames: Vec<FramePacket>,
}

/// The default set of clips: one per detectable anomaly.
pub fn standard_specs(frames: usize, size: u32) -> Vec<ClipSpec> {
    [AnomalyType::Blank, AnomalyType::Freeze, AnomalyType::Flicker]
        .into_iter()
        .map(|label| ClipSpec::new(label, frames, 24, size))
        .collect()
}

/// Builds in-memory frames for a clip, numbered from `start_id`.
pub fn generate(spec: &ClipSpec, start_id: u64, base_time: DateTime<Utc>) -> SyntheticClip {
    let interval = Duration::microseconds(1_000_000 / spec.fps.max(1) as i64);
    let images = match spec.label {
        AnomalyType::Freeze => {
            let noise = Arc::new(noise_image(spec.width, spec.height));
            vec![noise; spec.frames]
        }
        AnomalyType::Flicker => {
            let dark = Arc::new(solid_image(spec.width, spec.height, 0));
            let bright = Arc::new(solid_image(spec.width, spec.height, 255));
            (0..spec.frames)
                .map(|i| if i % 2 == 0 { dark.clone() } else { bright.clone() })
                .collect()
        }
        AnomalyType::Blank | AnomalyType::HudGlitch => {
            let black = Arc::new(solid_image(spec.width, spec.height, 0));
            vec![black; spec.frames]
        }
    };

    let frames = images
        .into_iter()
        .enumerate()
        .map(|(i, image)| {
            FramePacket::new(
                start_id + i as u64,
                base_time + interval * i as i32,
                ImageHandle::Memory(image),
            )
        })
        .collect();

    SyntheticClip {
        spec: spec.clone(),
        frames,
    }
}

fn solid_image(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
}

fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut rng = rand::rng();
    let image = RgbImage::from_fn(width, height, |_, _| {
        Rgb([rng.random::<u8>(), rng.random::<u8>(), rng.random::<u8>()])
    });
    DynamicImage::ImageRgb8(image)
}
