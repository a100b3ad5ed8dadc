pub mod calibrator;
pub mod clipping;
pub mod intensity;

pub use calibrator::{BackgroundMaskCalibrator, CalibrationState};
pub use clipping::{ClippingFilter, NO_DATA};
pub use intensity::IntensityMapper;
