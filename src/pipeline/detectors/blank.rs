use tracing::debug;

use super::measure::hsv_histograms;
use super::{Detector, EventCounter};
use crate::common::{AnomalyEvent, AnomalyType, FramePacket};

/// Blank detector - flags sustained runs of near-black, unsaturated frames
#[derive(Debug, Clone)]
pub struct BlankDetector {
    luma_thresh: u8,
    sat_thresh: u8,
    pct: f64,
    min_frames: u32,
}

#[derive(Debug, Default)]
pub struct BlankState {
    run: u32,
    events: EventCounter,
}

impl BlankState {
    pub fn run(&self) -> u32 {
        self.run
    }
}

impl BlankDetector {
    pub fn new() -> Self {
        Self {
            luma_thresh: 10,
            sat_thresh: 15,
            pct: 0.95,
            min_frames: 3,
        }
    }

    pub fn with_luma_threshold(mut self, luma_thresh: u8) -> Self {
        self.luma_thresh = luma_thresh;
        self
    }

    pub fn with_saturation_threshold(mut self, sat_thresh: u8) -> Self {
        self.sat_thresh = sat_thresh;
        self
    }

    pub fn with_pct(mut self, pct: f64) -> Self {
        self.pct = pct;
        self
    }

    /// A run length of 0 behaves like 1.
    pub fn with_min_frames(mut self, min_frames: u32) -> Self {
        self.min_frames = min_frames.max(1);
        self
    }
}

impl Default for BlankDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for BlankDetector {
    type State = BlankState;

    fn process(&self, frame: &FramePacket, state: &mut BlankState) -> Option<AnomalyEvent> {
        let image = match frame.image() {
            Ok(image) => image,
            Err(e) => {
                debug!("Blank detector skipping frame {}: {}", frame.frame_id(), e);
                return None;
            }
        };

        let (sat_hist, luma_hist) = hsv_histograms(&image.to_rgb8());
        let luma_ratio = luma_hist.fraction_at_or_below(self.luma_thresh);
        let sat_ratio = sat_hist.fraction_at_or_below(self.sat_thresh);

        if luma_ratio >= self.pct && sat_ratio >= self.pct {
            state.run += 1;
        } else {
            state.run = 0;
        }

        if state.run < self.min_frames {
            return None;
        }
        state.run = 0;

        Some(
            AnomalyEvent::new(
                state.events.next_id(),
                AnomalyType::Blank,
                frame.clone(),
                luma_ratio.min(sat_ratio),
            )
            .with_metric("luma_ratio", luma_ratio)
            .with_metric("sat_ratio", sat_ratio),
        )
    }

    fn anomaly_type(&self) -> AnomalyType {
        AnomalyType::Blank
    }

    fn name(&self) -> &'static str {
        "BlankDetector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::detectors::test_frames::{solid, unreadable};

    fn detector() -> BlankDetector {
        BlankDetector::new().with_min_frames(3).with_pct(0.99)
    }

    #[test]
    fn flags_black_sequence_on_third_frame() {
        let det = detector();
        let mut state = BlankState::default();

        assert!(det.process(&solid(0, 5), &mut state).is_none());
        assert!(det.process(&solid(1, 5), &mut state).is_none());
        let event = det.process(&solid(2, 5), &mut state).expect("blank event");

        assert_eq!(event.anomaly_type(), AnomalyType::Blank);
        assert_eq!(event.frame().frame_id(), 2);
        assert_eq!(event.event_id(), 1);
        let luma = event.metric("luma_ratio").unwrap();
        let sat = event.metric("sat_ratio").unwrap();
        assert!(luma >= 0.99 && sat >= 0.99);
        assert_eq!(event.confidence(), luma.min(sat));
        assert_eq!(state.run(), 0);
    }

    #[test]
    fn ignores_dark_but_visible_frames() {
        let det = detector();
        let mut state = BlankState::default();
        for i in 0..5 {
            assert!(det.process(&solid(i, 40), &mut state).is_none());
        }
    }

    #[test]
    fn interrupted_run_starts_over() {
        let det = detector();
        let mut state = BlankState::default();
        let values = [5, 5, 120, 5, 5];
        for (i, value) in values.into_iter().enumerate() {
            assert!(det.process(&solid(i as u64, value), &mut state).is_none());
        }
        assert_eq!(state.run(), 2);
    }

    #[test]
    fn sustained_episode_emits_once_per_run() {
        let det = detector();
        let mut state = BlankState::default();
        let ids: Vec<u64> = (0..7)
            .filter_map(|i| det.process(&solid(i, 0), &mut state))
            .map(|e| e.frame().frame_id())
            .collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn unreadable_frame_keeps_run() {
        let det = detector();
        let mut state = BlankState::default();
        det.process(&solid(0, 5), &mut state);
        det.process(&solid(1, 5), &mut state);
        assert!(det.process(&unreadable(2), &mut state).is_none());
        assert_eq!(state.run(), 2);
        assert!(det.process(&solid(3, 5), &mut state).is_some());
    }

    #[test]
    fn replayed_frame_counts_every_call() {
        let det = BlankDetector::new().with_min_frames(1).with_pct(0.99);
        let mut state = BlankState::default();
        let frame = solid(0, 5);
        let first = det.process(&frame, &mut state).expect("first");
        let second = det.process(&frame, &mut state).expect("second");
        assert_eq!(first.event_id(), 1);
        assert_eq!(second.event_id(), 2);
    }

    #[test]
    fn ratio_equal_to_pct_counts_as_blank() {
        // Left half black, right half bright grey: half the pixels are dark,
        // every pixel is unsaturated.
        let half = image::RgbImage::from_fn(32, 32, |x, _| {
            if x < 16 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([200, 200, 200])
            }
        });
        let frame = crate::pipeline::detectors::test_frames::from_rgb(0, half);

        let det = BlankDetector::new().with_min_frames(1).with_pct(0.5);
        let event = det
            .process(&frame, &mut BlankState::default())
            .expect("blank event");
        assert_eq!(event.metric("luma_ratio"), Some(0.5));
        assert_eq!(event.metric("sat_ratio"), Some(1.0));

        let stricter = BlankDetector::new().with_min_frames(1).with_pct(0.51);
        assert!(stricter
            .process(&frame, &mut BlankState::default())
            .is_none());
    }

    #[test]
    fn saturated_dark_frames_are_not_blank() {
        let det = detector();
        let mut state = BlankState::default();
        let dark_red = crate::pipeline::detectors::test_frames::from_rgb(
            0,
            image::RgbImage::from_pixel(32, 32, image::Rgb([9, 0, 0])),
        );
        for _ in 0..4 {
            assert!(det.process(&dark_red, &mut state).is_none());
        }
    }
}
