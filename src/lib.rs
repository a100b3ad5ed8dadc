pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod filters;
pub mod observability;
pub mod source;

pub use config::{ClipConfig, PipelineConfig};
pub use engine::{FrameProcessor, PipelineEvent, PipelineState};
pub use error::PipelineError;
