use chrono::Utc;
use image::{DynamicImage, Rgb, RgbImage};
use rand::Rng;
use std::collections::HashSet;

use glitchwatch::config::DetectorSettings;
use glitchwatch::intake::DirectoryFrameSource;
use glitchwatch::output::{JsonLinesSink, MemorySink};
use glitchwatch::pipeline::{BlankDetector, FreezeDetector};
use glitchwatch::{
    build_pipeline, synthetic, AnomalyType, CoordinatorBuilder, DetectionPipeline, FramePacket,
    Settings,
};

fn solid(frame_id: u64, value: u8) -> FramePacket {
    FramePacket::from_image(
        frame_id,
        Utc::now(),
        DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([value, value, value]))),
    )
}

#[tokio::test]
async fn scans_directory_and_skips_corrupt_frames() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..6 {
        let path = dir.path().join(format!("frame_{i:03}.png"));
        if i == 2 {
            std::fs::write(&path, b"definitely not a png").unwrap();
        } else {
            RgbImage::from_pixel(32, 32, Rgb([0, 0, 0])).save(&path).unwrap();
        }
    }

    let settings = Settings::default();
    let source = DirectoryFrameSource::open(dir.path(), settings.fps).await.unwrap();
    let coordinator = CoordinatorBuilder::new(&settings)
        .pipeline(build_pipeline(&settings.detectors))
        .build()
        .unwrap();
    let summary = coordinator
        .run(source, JsonLinesSink::new(Vec::new()))
        .await
        .unwrap();

    // Frame 2 cannot be decoded, so the blank run completes on frame 3 and
    // the freeze run (baseline 0, diffs at 1, 3, 4) completes on frame 4.
    assert_eq!(summary.frames_processed, 6);
    assert_eq!(summary.events_by_type.get(&AnomalyType::Blank), Some(&1));
    assert_eq!(summary.events_by_type.get(&AnomalyType::Freeze), Some(&1));
    assert_eq!(summary.events_by_type.get(&AnomalyType::Flicker), None);
}

#[tokio::test]
async fn synthetic_clips_are_detected_by_label() {
    let settings = Settings::default();
    for spec in synthetic::standard_specs(24, 32) {
        let clip = synthetic::generate(&spec, 0, Utc::now());
        let sink = MemorySink::new();
        let coordinator = CoordinatorBuilder::new(&settings)
            .pipeline(build_pipeline(&settings.detectors))
            .build()
            .unwrap();
        coordinator
            .run(glitchwatch::intake::MemoryFrameSource::new(clip.frames), sink.clone())
            .await
            .unwrap();

        let types: HashSet<_> = sink.events().iter().map(|e| e.anomaly_type()).collect();
        assert!(types.contains(&spec.label), "{} clip missed", spec.label);
    }
}

#[test]
fn pipeline_never_repeats_type_and_frame() {
    let mut rng = rand::rng();
    let mut pipeline = DetectionPipeline::new()
        .add_detector(BlankDetector::new().with_min_frames(1))
        .add_detector(BlankDetector::new().with_min_frames(2))
        .add_detector(FreezeDetector::new().with_min_frames(1))
        .add_detector(FreezeDetector::new().with_min_frames(1));

    let mut seen = HashSet::new();
    for i in 0..200u64 {
        let value = if rng.random_bool(0.7) { 0 } else { rng.random::<u8>() };
        let frame = solid(i, value);
        // Replays are part of the stream too.
        let replays = if rng.random_bool(0.2) { 2 } else { 1 };
        for _ in 0..replays {
            for event in pipeline.process(&frame) {
                assert!(seen.insert((event.anomaly_type(), event.frame().frame_id())));
            }
        }
    }
    assert!(!seen.is_empty());
}

#[test]
fn default_configuration_runs_all_detectors() {
    let pipeline = build_pipeline(&DetectorSettings::default());
    assert_eq!(
        pipeline.detector_names(),
        vec!["BlankDetector", "FreezeDetector", "FlickerDetector"]
    );
}
