use crate::engine::processor::{FrameOutcome, FrameProcessor};
use crate::error::PipelineError;
use crate::source::{DepthSource, SourceRead};
use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Totals for one streaming session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub frames_processed: u64,
    pub frames_missing: u64,
    pub frames_rejected: u64,
}

/// Drives a [`DepthSource`] into a [`FrameProcessor`] until the source ends or shutdown
pub struct FrameStreamRunner {
    processor: Arc<FrameProcessor>,
    shutdown_tx: broadcast::Sender<()>,
    /// Latched so sessions started after shutdown never enter the loop
    stopped: Arc<AtomicBool>,
}

impl FrameStreamRunner {
    pub fn new(processor: Arc<FrameProcessor>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            processor,
            shutdown_tx,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn processor(&self) -> &Arc<FrameProcessor> {
        &self.processor
    }

    /// Ask every running session to stop after its current frame.
    ///
    /// The request is permanent: sessions started later return an empty summary.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Open, start and stream the source on a background task
    pub fn spawn(&self, mut source: Box<dyn DepthSource>) -> JoinHandle<Result<StreamSummary>> {
        let processor = self.processor.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let stopped = self.stopped.clone();

        tokio::spawn(async move {
            source.open().await?;
            source.start().await?;
            let result =
                Self::stream(&processor, source.as_mut(), shutdown_rx, &stopped).await;
            if let Err(e) = source.close().await {
                warn!("Failed to close depth source: {}", e);
            }
            result
        })
    }

    /// Stream an already started source on the current task
    pub async fn run(&self, source: &mut dyn DepthSource) -> Result<StreamSummary> {
        let shutdown_rx = self.shutdown_tx.subscribe();
        Self::stream(&self.processor, source, shutdown_rx, &self.stopped).await
    }

    async fn stream(
        processor: &FrameProcessor,
        source: &mut dyn DepthSource,
        mut shutdown_rx: broadcast::Receiver<()>,
        stopped: &AtomicBool,
    ) -> Result<StreamSummary> {
        let config = processor.config();
        let (width, height) = source.dimensions();
        if (width, height) != (config.width, config.height) {
            return Err(anyhow!(
                "Source delivers {}x{} frames, pipeline expects {}x{}",
                width,
                height,
                config.width,
                config.height
            ));
        }

        let mut summary = StreamSummary::default();
        info!("Streaming {}x{} depth frames", width, height);

        loop {
            // a shutdown sent before this receiver subscribed only shows up here
            if stopped.load(Ordering::Acquire) {
                debug!("Runner already shut down, leaving frame loop");
                break;
            }

            let read = tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Shutdown requested, leaving frame loop");
                    break;
                }
                read = source.read_frame() => read?,
            };

            match read {
                SourceRead::Frame(frame) => match processor.process_frame(Some(&frame)) {
                    Ok(FrameOutcome::Processed { .. }) => summary.frames_processed += 1,
                    Ok(FrameOutcome::Skipped) => summary.frames_missing += 1,
                    Err(e @ PipelineError::FrameSizeMismatch { .. }) => {
                        warn!("Skipping frame {}: {}", frame.sequence_id, e);
                        summary.frames_rejected += 1;
                    }
                    Err(e) => return Err(e.into()),
                },
                SourceRead::Missing => {
                    processor.process_frame(None)?;
                    summary.frames_missing += 1;
                }
                SourceRead::Finished => {
                    debug!("Depth source finished");
                    break;
                }
            }
        }

        source.stop().await?;
        info!(
            "Stream ended: {} processed, {} missing, {} rejected",
            summary.frames_processed, summary.frames_missing, summary.frames_rejected
        );
        Ok(summary)
    }
}

impl Drop for FrameStreamRunner {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }
}
