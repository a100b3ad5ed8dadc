use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for one frame processor
pub struct FrameMetrics {
    pipeline_id: String,
    frames_processed: AtomicU64,
    frames_dropped: AtomicU64,
    frames_rejected: AtomicU64,
    calibrations_completed: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl FrameMetrics {
    pub fn new(pipeline_id: impl Into<String>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            frames_processed: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            frames_rejected: AtomicU64::new(0),
            calibrations_completed: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
        }
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected.load(Ordering::Relaxed)
    }

    pub fn calibrations_completed(&self) -> u64 {
        self.calibrations_completed.load(Ordering::Relaxed)
    }

    pub fn record_frame_processed(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_calibration_completed(&self) {
        self.calibrations_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_processing(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_processing(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / samples
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pipeline_id: self.pipeline_id.clone(),
            frames_processed: self.frames_processed(),
            frames_dropped: self.frames_dropped(),
            frames_rejected: self.frames_rejected(),
            calibrations_completed: self.calibrations_completed(),
            avg_latency_us: self.avg_latency_us(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub pipeline_id: String,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub frames_rejected: u64,
    pub calibrations_completed: u64,
    pub avg_latency_us: u64,
}
