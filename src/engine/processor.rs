use crate::config::{ClipConfig, PipelineConfig};
use crate::core::{DepthFrame, FrameBuffer};
use crate::engine::events::{EventBus, PipelineEvent};
use crate::engine::state::PipelineState;
use crate::error::{PipelineError, Result};
use crate::filters::{BackgroundMaskCalibrator, CalibrationState, ClippingFilter, IntensityMapper};
use crate::observability::{FrameMetrics, PipelineMonitor};
use crossbeam_channel::Receiver;
use log::{info, trace, warn};
use std::sync::{Arc, Mutex, MutexGuard};

/// What happened to one incoming frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No frame was delivered this cycle
    Skipped,
    Processed { sequence_id: u64, mask_ready: bool },
}

/// Read-only view of the buffers published by the last frame
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub depth: &'a [i16],
    pub visualization: &'a [u8],
    pub mask: &'a [i32],
}

/// Everything the pixel pass touches, guarded by one lock
struct FrameStore {
    buffer: FrameBuffer,
    calibrator: BackgroundMaskCalibrator,
    state: PipelineState,
    frames_seen: u64,
}

/// Clips incoming depth frames, learns the background mask and renders the preview.
///
/// One frame is processed at a time: the whole pixel pass runs under a single
/// mutex, and notifications go out only after it is released.
pub struct FrameProcessor {
    config: Mutex<PipelineConfig>,
    store: Mutex<FrameStore>,
    events: EventBus,
    metrics: Arc<FrameMetrics>,
}

impl FrameProcessor {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_name("depth_pipeline", config)
    }

    pub fn with_name(name: impl Into<String>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let calibrator = BackgroundMaskCalibrator::new(
            config.pixel_count(),
            config.depth_mask_count,
            config.use_depth_mask,
        )?;
        let store = FrameStore {
            buffer: FrameBuffer::new(config.width, config.height)?,
            calibrator,
            state: PipelineState::AwaitingSensor,
            frames_seen: 0,
        };

        Ok(Self {
            config: Mutex::new(config),
            store: Mutex::new(store),
            events: EventBus::new(),
            metrics: Arc::new(FrameMetrics::new(name)),
        })
    }

    fn lock_config(&self) -> MutexGuard<'_, PipelineConfig> {
        self.config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_store(&self) -> MutexGuard<'_, FrameStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Process a frame from a source; `None` means the source had nothing this cycle
    pub fn process_frame(&self, frame: Option<&DepthFrame>) -> Result<FrameOutcome> {
        match frame {
            Some(frame) => self.run_pass(&frame.samples, Some(frame.sequence_id)),
            None => self.skip(),
        }
    }

    /// Process bare samples, numbering frames internally
    pub fn process_raw(&self, samples: Option<&[i16]>) -> Result<FrameOutcome> {
        match samples {
            Some(samples) => self.run_pass(samples, None),
            None => self.skip(),
        }
    }

    fn skip(&self) -> Result<FrameOutcome> {
        trace!("No depth frame delivered, skipping cycle");
        self.metrics.record_frame_dropped();
        Ok(FrameOutcome::Skipped)
    }

    fn run_pass(&self, samples: &[i16], sequence_id: Option<u64>) -> Result<FrameOutcome> {
        // copied so host updates between frames never tear a pass
        let config = self.lock_config().clone();
        let start = self.metrics.start_processing();

        let (sequence_id, mask_ready) = {
            let mut store = self.lock_store();
            let expected = store.buffer.pixel_count();
            if samples.len() != expected {
                warn!(
                    "Rejecting depth frame with {} samples, expected {}",
                    samples.len(),
                    expected
                );
                self.metrics.record_frame_rejected();
                return Err(PipelineError::FrameSizeMismatch {
                    expected,
                    actual: samples.len(),
                });
            }

            let sequence_id = sequence_id.unwrap_or(store.frames_seen);
            store.frames_seen += 1;

            let FrameStore {
                buffer,
                calibrator,
                state,
                ..
            } = &mut *store;

            if *state == PipelineState::AwaitingSensor {
                *state = PipelineState::Calibrating {
                    remaining_frames: calibrator.state().remaining_frames,
                };
            }

            let calibrating = !calibrator.is_complete();
            let filter = ClippingFilter::new(config.clip, calibrator.use_mask());

            for (i, &raw) in samples.iter().enumerate() {
                let depth = filter.apply(
                    ClippingFilter::strip_player_index(raw),
                    calibrator.mask_value(i),
                );
                buffer.depth[i] = depth;

                if calibrating {
                    calibrator.update_pixel(i, depth, &config.clip);
                }

                if config.show_depth {
                    IntensityMapper::write_pixel(&mut buffer.visualization, i, depth);
                }
            }

            if !config.show_depth {
                IntensityMapper::blackout(&mut buffer.visualization);
            }

            let mask_ready = calibrating && calibrator.finish_frame();
            if calibrating {
                let next = if mask_ready {
                    PipelineState::Ready
                } else {
                    PipelineState::Calibrating {
                        remaining_frames: calibrator.state().remaining_frames,
                    }
                };
                debug_assert!(state.can_transition_to(&next));
                *state = next;
            }

            (sequence_id, mask_ready)
        };

        self.metrics.finish_processing(start);
        self.metrics.record_frame_processed();

        if mask_ready {
            info!("Background mask ready after frame {}", sequence_id);
            self.metrics.record_calibration_completed();
            self.events.publish(PipelineEvent::MaskReady);
        }
        self.events.publish(PipelineEvent::FrameDone { sequence_id });
        trace!("Depth frame {} processed", sequence_id);

        Ok(FrameOutcome::Processed {
            sequence_id,
            mask_ready,
        })
    }

    /// Replace the live configuration; dimensions are fixed for the processor's lifetime
    pub fn update_config(&self, new_config: PipelineConfig) -> Result<()> {
        new_config.validate()?;

        let mut config = self.lock_config();
        if new_config.width != config.width || new_config.height != config.height {
            warn!(
                "Refusing to resize pipeline from {}x{} to {}x{}",
                config.width, config.height, new_config.width, new_config.height
            );
            return Err(PipelineError::InvalidDimensions {
                width: new_config.width,
                height: new_config.height,
            });
        }

        {
            let mut store = self.lock_store();
            store.calibrator.set_frame_count(new_config.depth_mask_count)?;
            store.calibrator.set_use_mask(new_config.use_depth_mask);
        }
        *config = new_config;
        Ok(())
    }

    pub fn set_clip(&self, near_clip: i16, far_clip: i16) -> Result<()> {
        let mut config = self.config();
        config.clip = ClipConfig {
            near_clip,
            far_clip,
            ..config.clip
        };
        self.update_config(config)
    }

    pub fn set_use_depth_mask(&self, use_depth_mask: bool) {
        let mut config = self.lock_config();
        config.use_depth_mask = use_depth_mask;
        self.lock_store().calibrator.set_use_mask(use_depth_mask);
    }

    pub fn set_show_depth(&self, show_depth: bool) {
        self.lock_config().show_depth = show_depth;
    }

    /// Drop the learned mask and recalibrate against the current scene
    pub fn reset_mask(&self) {
        let mut config = self.lock_config();
        config.use_depth_mask = true;

        let mut store = self.lock_store();
        store.calibrator.reset();
        if store.state != PipelineState::AwaitingSensor {
            store.state = PipelineState::Calibrating {
                remaining_frames: store.calibrator.state().remaining_frames,
            };
        }
        info!(
            "Background mask reset, recalibrating over {} frames",
            store.calibrator.state().remaining_frames
        );
    }

    pub fn subscribe(&self) -> Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> PipelineConfig {
        self.lock_config().clone()
    }

    pub fn state(&self) -> PipelineState {
        self.lock_store().state
    }

    pub fn calibration(&self) -> CalibrationState {
        self.lock_store().calibrator.state()
    }

    /// Run `f` against the current output while holding the frame lock
    pub fn with_output<R>(&self, f: impl FnOnce(FrameView<'_>) -> R) -> R {
        let store = self.lock_store();
        f(FrameView {
            width: store.buffer.width(),
            height: store.buffer.height(),
            depth: &store.buffer.depth,
            visualization: &store.buffer.visualization,
            mask: store.calibrator.mask(),
        })
    }

    pub fn depth_snapshot(&self) -> Vec<i16> {
        self.with_output(|view| view.depth.to_vec())
    }

    pub fn visualization_snapshot(&self) -> Vec<u8> {
        self.with_output(|view| view.visualization.to_vec())
    }

    pub fn mask_snapshot(&self) -> Vec<i32> {
        self.with_output(|view| view.mask.to_vec())
    }

    pub fn metrics(&self) -> Arc<FrameMetrics> {
        self.metrics.clone()
    }

    pub fn monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(self.metrics.clone())
    }
}
