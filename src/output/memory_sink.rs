use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::EventSink;
use crate::common::AnomalyEvent;
use crate::error::AppError;

/// Collects events in memory; clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<AnomalyEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnomalyEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn accept(&mut self, event: AnomalyEvent) -> Result<(), AppError> {
        self.events
            .lock()
            .map_err(|e| AppError::Stage("sink", e.to_string()))?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::AnomalyType;
    use crate::pipeline::detectors::test_frames::solid;

    #[tokio::test]
    async fn clones_share_collected_events() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer
            .accept(AnomalyEvent::new(1, AnomalyType::Flicker, solid(0, 0), 0.9))
            .await
            .unwrap();
        assert_eq!(sink.events().len(), 1);
    }
}
