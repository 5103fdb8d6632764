pub mod anomaly;
pub mod frame;

pub use anomaly::{AnomalyEvent, AnomalyType, Severity};
pub use frame::{FramePacket, ImageHandle};
