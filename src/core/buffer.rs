use crate::error::{PipelineError, Result};

/// Bytes per pixel in the visualization buffer (B, G, R, unused)
pub const BYTES_PER_PIXEL: usize = 4;

/// Per-pipeline output storage, rewritten in place every frame
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,

    /// Clipped depth, -1 where no data survived
    pub depth: Vec<i16>,

    /// BGR plus one unused byte per pixel
    pub visualization: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let (pixels, bytes) = width
            .checked_mul(height)
            .and_then(|pixels| Some((pixels, pixels.checked_mul(BYTES_PER_PIXEL)?)))
            .filter(|&(pixels, _)| pixels > 0)
            .ok_or(PipelineError::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            depth: vec![0; pixels],
            visualization: vec![0; bytes],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.depth.len()
    }

    /// Row stride of the visualization buffer in bytes
    pub fn stride(&self) -> usize {
        self.width * BYTES_PER_PIXEL
    }
}
