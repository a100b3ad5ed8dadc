use thiserror::Error;

/// Errors raised by the frame-processing core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("near clip {near} is beyond far clip {far}")]
    InvalidClipRange { near: i16, far: i16 },

    #[error("frame dimensions {width}x{height} must be non-zero and addressable")]
    InvalidDimensions { width: usize, height: usize },

    #[error("mask fudge factor {0} must lie within 0..=32767")]
    InvalidFudgeFactor(i32),

    #[error("depth mask frame count must be positive")]
    InvalidCalibrationCount,

    #[error("expected {expected} depth samples, got {actual}")]
    FrameSizeMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
