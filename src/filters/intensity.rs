use crate::core::BYTES_PER_PIXEL;

/// Converts clipped depth into the magenta/gray duotone preview
pub struct IntensityMapper;

impl IntensityMapper {
    /// `(256 - depth / 256)` reduced to its low byte.
    ///
    /// The division truncates toward zero, so the -1 hole maps to 0 (black)
    /// alongside depth 0.
    #[inline]
    pub fn intensity(depth: i16) -> u8 {
        (256 - (depth as i32 / 256)) as u8
    }

    /// Write one pixel as (B, G, R) = (I, 0, I); the fourth byte is left untouched
    #[inline]
    pub fn write_pixel(visualization: &mut [u8], pixel_index: usize, depth: i16) {
        let intensity = Self::intensity(depth);
        let offset = pixel_index * BYTES_PER_PIXEL;
        visualization[offset] = intensity;
        visualization[offset + 1] = 0;
        visualization[offset + 2] = intensity;
    }

    pub fn blackout(visualization: &mut [u8]) {
        visualization.fill(0);
    }
}
