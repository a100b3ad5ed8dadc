pub mod metrics;
pub mod monitor;

pub use metrics::{FrameMetrics, MetricsSnapshot};
pub use monitor::PipelineMonitor;
