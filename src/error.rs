use thiserror::Error;

/// Errors surfaced by the library.
///
/// Geometry contract violations inside the codec are not represented here:
/// they indicate a logic defect and panic instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid codec settings: {0}")]
    InvalidSettings(String),

    #[error("invalid pipeline settings: {0}")]
    InvalidPipeline(String),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write frame snapshot: {0}")]
    Snapshot(#[from] image::ImageError),

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
