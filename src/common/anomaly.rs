use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::frame::FramePacket;

/// Supported anomaly categories detected in gameplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    Blank,
    Freeze,
    Flicker,
    HudGlitch,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::Blank => "blank",
            AnomalyType::Freeze => "freeze",
            AnomalyType::Flicker => "flicker",
            AnomalyType::HudGlitch => "hud_glitch",
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A detected anomaly together with the frame that triggered it.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyEvent {
    event_id: u64,
    #[serde(rename = "type")]
    anomaly_type: AnomalyType,
    severity: Severity,
    frame: FramePacket,
    confidence: f64,
    metrics: IndexMap<String, f64>,
    created_at: DateTime<Utc>,
}

impl AnomalyEvent {
    pub fn new(
        event_id: u64,
        anomaly_type: AnomalyType,
        frame: FramePacket,
        confidence: f64,
    ) -> Self {
        Self {
            event_id,
            anomaly_type,
            severity: Severity::Low,
            frame,
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
            metrics: IndexMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    pub fn anomaly_type(&self) -> AnomalyType {
        self.anomaly_type
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn frame(&self) -> &FramePacket {
        &self.frame
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn metrics(&self) -> &IndexMap<String, f64> {
        &self.metrics
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The pair used to suppress repeated emissions of the same anomaly.
    pub fn dedup_key(&self) -> (AnomalyType, u64) {
        (self.anomaly_type, self.frame.frame_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn frame(id: u64) -> FramePacket {
        FramePacket::from_image(id, Utc::now(), DynamicImage::ImageRgb8(RgbImage::new(4, 4)))
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(AnomalyEvent::new(1, AnomalyType::Flicker, frame(0), 1.7).confidence(), 1.0);
        assert_eq!(AnomalyEvent::new(1, AnomalyType::Freeze, frame(0), -0.2).confidence(), 0.0);
        assert_eq!(AnomalyEvent::new(1, AnomalyType::Blank, frame(0), f64::NAN).confidence(), 0.0);
    }

    #[test]
    fn serializes_type_and_metrics_in_order() {
        let event = AnomalyEvent::new(2, AnomalyType::HudGlitch, frame(9), 0.5)
            .with_metric("luma_ratio", 0.9)
            .with_metric("sat_ratio", 0.8);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "hud_glitch");
        assert_eq!(json["severity"], "low");
        assert_eq!(json["frame"]["frame_id"], 9);
        assert_eq!(json["metrics"]["sat_ratio"], 0.8);
        let keys: Vec<_> = event.metrics().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["luma_ratio", "sat_ratio"]);
    }

    #[test]
    fn dedup_key_uses_type_and_frame() {
        let event = AnomalyEvent::new(5, AnomalyType::Blank, frame(12), 1.0);
        assert_eq!(event.dedup_key(), (AnomalyType::Blank, 12));
    }
}
