use crate::core::BYTES_PER_PIXEL;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_WIDTH: usize = 640;
pub const DEFAULT_HEIGHT: usize = 480;
pub const DEFAULT_NEAR_CLIP: i16 = 0;
pub const DEFAULT_FAR_CLIP: i16 = 1500;
pub const DEFAULT_MASK_FUDGE_FACTOR: i32 = 80;
pub const DEFAULT_DEPTH_MASK_COUNT: u32 = 60;

/// Near/far distance window applied to every sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipConfig {
    /// Closest distance kept; anything nearer becomes a hole
    pub near_clip: i16,

    /// Furthest distance kept when no mask value applies
    pub far_clip: i16,

    /// Margin subtracted from observed background depth when learning the mask
    pub mask_fudge_factor: i32,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            near_clip: DEFAULT_NEAR_CLIP,
            far_clip: DEFAULT_FAR_CLIP,
            mask_fudge_factor: DEFAULT_MASK_FUDGE_FACTOR,
        }
    }
}

impl ClipConfig {
    pub fn new(near_clip: i16, far_clip: i16) -> Result<Self> {
        let config = Self {
            near_clip,
            far_clip,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.near_clip > self.far_clip {
            return Err(PipelineError::InvalidClipRange {
                near: self.near_clip,
                far: self.far_clip,
            });
        }
        if !(0..=i16::MAX as i32).contains(&self.mask_fudge_factor) {
            return Err(PipelineError::InvalidFudgeFactor(self.mask_fudge_factor));
        }
        Ok(())
    }
}

/// Full configuration of one processing pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub width: usize,
    pub height: usize,
    pub clip: ClipConfig,

    /// Clip against the learned background once it is available
    pub use_depth_mask: bool,

    /// When false the visualization buffer is forced to black
    pub show_depth: bool,

    /// Frames observed before the background mask is frozen
    pub depth_mask_count: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            clip: ClipConfig::default(),
            use_depth_mask: true,
            show_depth: true,
            depth_mask_count: DEFAULT_DEPTH_MASK_COUNT,
        }
    }
}

impl PipelineConfig {
    pub fn with_dimensions(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields fall back to defaults
    pub fn from_json(config: Value) -> anyhow::Result<Self> {
        let parsed: Self = serde_json::from_value(config)?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn pixel_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    pub fn validate(&self) -> Result<()> {
        // the visualization buffer is the largest allocation per frame
        let addressable = self
            .width
            .checked_mul(self.height)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .is_some_and(|bytes| bytes <= isize::MAX as usize);
        if self.width == 0 || self.height == 0 || !addressable {
            return Err(PipelineError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.depth_mask_count == 0 {
            return Err(PipelineError::InvalidCalibrationCount);
        }
        self.clip.validate()
    }
}
