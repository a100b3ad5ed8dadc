use crate::config::ClipConfig;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Progress of the background mask learning run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationState {
    pub remaining_frames: u32,
    pub is_complete: bool,
    pub use_mask: bool,
}

/// Learns a per-pixel ceiling from the static scene seen during the first frames.
///
/// Each pixel keeps the closest background reading observed, minus a safety
/// margin. Once the countdown runs out the mask is frozen and only read.
#[derive(Debug, Clone)]
pub struct BackgroundMaskCalibrator {
    mask: Vec<i32>,
    frame_count: u32,
    state: CalibrationState,
}

impl BackgroundMaskCalibrator {
    pub fn new(pixel_count: usize, frame_count: u32, use_mask: bool) -> Result<Self> {
        if frame_count == 0 {
            return Err(PipelineError::InvalidCalibrationCount);
        }
        Ok(Self {
            mask: vec![0; pixel_count],
            frame_count,
            state: CalibrationState {
                remaining_frames: frame_count,
                is_complete: false,
                use_mask,
            },
        })
    }

    /// Mask update rule for one clipped sample `depth` against mask value `current`
    #[inline]
    pub fn learn(depth: i16, current: i32, clip: &ClipConfig) -> i32 {
        let depth = depth as i32;
        if depth > 0 && current > 0 {
            // keep the closer of the two readings
            if depth > clip.near_clip as i32 && depth < current {
                return depth - clip.mask_fudge_factor;
            }
            current
        } else if depth > 0 && current == 0 {
            depth - clip.mask_fudge_factor
        } else {
            current
        }
    }

    /// Feed one clipped sample; ignored once calibration is complete
    #[inline]
    pub fn update_pixel(&mut self, index: usize, depth: i16, clip: &ClipConfig) {
        if self.state.is_complete {
            return;
        }
        let current = self.mask[index];
        self.mask[index] = Self::learn(depth, current, clip);
    }

    /// Close out a full pixel pass. Returns true only on the frame that completes calibration.
    pub fn finish_frame(&mut self) -> bool {
        if self.state.is_complete {
            return false;
        }
        self.state.remaining_frames = self.state.remaining_frames.saturating_sub(1);
        if self.state.remaining_frames == 0 {
            self.state.is_complete = true;
            return true;
        }
        false
    }

    /// Forget the learned mask and start a fresh run
    pub fn reset(&mut self) {
        self.mask.fill(0);
        self.state = CalibrationState {
            remaining_frames: self.frame_count,
            is_complete: false,
            use_mask: true,
        };
    }

    /// Frame count used by the next reset
    pub fn set_frame_count(&mut self, frame_count: u32) -> Result<()> {
        if frame_count == 0 {
            return Err(PipelineError::InvalidCalibrationCount);
        }
        self.frame_count = frame_count;
        Ok(())
    }

    pub fn set_use_mask(&mut self, use_mask: bool) {
        self.state.use_mask = use_mask;
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete
    }

    pub fn use_mask(&self) -> bool {
        self.state.use_mask
    }

    pub fn mask(&self) -> &[i32] {
        &self.mask
    }

    #[inline]
    pub fn mask_value(&self, index: usize) -> i32 {
        self.mask[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> ClipConfig {
        ClipConfig::default()
    }

    #[test]
    fn test_first_observation_records_minus_fudge() {
        assert_eq!(BackgroundMaskCalibrator::learn(1000, 0, &clip()), 920);
    }

    #[test]
    fn test_closer_reading_tightens() {
        assert_eq!(BackgroundMaskCalibrator::learn(900, 920, &clip()), 820);
        // farther reading leaves the mask alone
        assert_eq!(BackgroundMaskCalibrator::learn(1000, 920, &clip()), 920);
    }

    #[test]
    fn test_holes_do_not_update() {
        assert_eq!(BackgroundMaskCalibrator::learn(-1, 0, &clip()), 0);
        assert_eq!(BackgroundMaskCalibrator::learn(-1, 700, &clip()), 700);
        assert_eq!(BackgroundMaskCalibrator::learn(0, 700, &clip()), 700);
    }

    #[test]
    fn test_readings_at_or_below_near_clip_do_not_tighten() {
        let clip = ClipConfig::new(500, 1500).unwrap();
        assert_eq!(BackgroundMaskCalibrator::learn(500, 900, &clip), 900);
        assert_eq!(BackgroundMaskCalibrator::learn(501, 900, &clip), 421);
    }

    #[test]
    fn test_negative_mask_is_sticky() {
        let first = BackgroundMaskCalibrator::learn(50, 0, &clip());
        assert_eq!(first, -30);
        assert_eq!(BackgroundMaskCalibrator::learn(40, first, &clip()), -30);
    }

    #[test]
    fn test_completes_after_exact_frame_count() {
        let mut calibrator = BackgroundMaskCalibrator::new(4, 3, true).unwrap();
        assert!(!calibrator.finish_frame());
        assert!(!calibrator.finish_frame());
        assert!(!calibrator.is_complete());
        assert!(calibrator.finish_frame());
        assert!(calibrator.is_complete());
        assert!(!calibrator.finish_frame());
    }

    #[test]
    fn test_frozen_after_completion() {
        let mut calibrator = BackgroundMaskCalibrator::new(1, 1, true).unwrap();
        calibrator.update_pixel(0, 1000, &clip());
        calibrator.finish_frame();
        calibrator.update_pixel(0, 500, &clip());
        assert_eq!(calibrator.mask_value(0), 920);
    }

    #[test]
    fn test_reset_restores_fresh_run() {
        let mut calibrator = BackgroundMaskCalibrator::new(2, 2, false).unwrap();
        calibrator.update_pixel(0, 1000, &clip());
        calibrator.finish_frame();
        calibrator.finish_frame();
        assert!(calibrator.is_complete());

        calibrator.reset();
        assert_eq!(calibrator.mask(), &[0, 0]);
        assert_eq!(
            calibrator.state(),
            CalibrationState {
                remaining_frames: 2,
                is_complete: false,
                use_mask: true,
            }
        );
    }

    #[test]
    fn test_zero_frame_count_rejected() {
        assert!(BackgroundMaskCalibrator::new(1, 0, true).is_err());
        let mut calibrator = BackgroundMaskCalibrator::new(1, 5, true).unwrap();
        assert_eq!(
            calibrator.set_frame_count(0),
            Err(PipelineError::InvalidCalibrationCount)
        );
    }
}
