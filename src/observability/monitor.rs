use super::FrameMetrics;
use std::sync::Arc;

pub struct PipelineMonitor {
    metrics: Arc<FrameMetrics>,
}

impl PipelineMonitor {
    pub fn new(metrics: Arc<FrameMetrics>) -> Self {
        Self { metrics }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.metrics.snapshot();

        format!(
            "=== Depth Pipeline Metrics ===\n\n[{}]\n  Frames: {} frames processed\n  Dropped: {}\n  Rejected: {}\n  Calibrations: {}\n  Avg Latency: {}μs\n",
            snapshot.pipeline_id,
            snapshot.frames_processed,
            plural(snapshot.frames_dropped, "frame"),
            plural(snapshot.frames_rejected, "frame"),
            snapshot.calibrations_completed,
            snapshot.avg_latency_us
        )
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }
}

fn plural(count: u64, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}
