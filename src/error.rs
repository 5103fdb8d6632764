use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
    #[error("Stage {0} failed: {1}")]
    Stage(&'static str, String),
    #[error("The {0} queue was closed unexpectedly.")]
    ChannelClosed(&'static str),
}
