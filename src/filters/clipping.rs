use crate::config::ClipConfig;
use crate::core::PLAYER_INDEX_BITMASK_WIDTH;

/// Value written for pixels with no usable depth
pub const NO_DATA: i16 = -1;

/// Applies the near/far window, tightened per pixel by the background mask
#[derive(Debug, Clone, Copy)]
pub struct ClippingFilter {
    config: ClipConfig,
    use_mask: bool,
}

impl ClippingFilter {
    pub fn new(config: ClipConfig, use_mask: bool) -> Self {
        Self { config, use_mask }
    }

    /// Discard the player index carried in the low bits
    #[inline]
    pub fn strip_player_index(raw: i16) -> i16 {
        raw >> PLAYER_INDEX_BITMASK_WIDTH
    }

    /// Upper bound for a pixel given its mask value
    #[inline]
    pub fn effective_max(&self, mask_value: i32) -> i32 {
        if self.use_mask && mask_value > 0 {
            mask_value
        } else {
            self.config.far_clip as i32
        }
    }

    #[inline]
    pub fn apply(&self, sample: i16, mask_value: i32) -> i16 {
        let max = self.effective_max(mask_value);
        let value = sample as i32;
        if value > max || sample < self.config.near_clip {
            NO_DATA
        } else {
            sample
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(near: i16, far: i16, use_mask: bool) -> ClippingFilter {
        ClippingFilter::new(ClipConfig::new(near, far).unwrap(), use_mask)
    }

    #[test]
    fn test_within_bounds_passes_through() {
        let f = filter(100, 1500, false);
        assert_eq!(f.apply(100, 0), 100);
        assert_eq!(f.apply(800, 0), 800);
        assert_eq!(f.apply(1500, 0), 1500);
    }

    #[test]
    fn test_out_of_bounds_becomes_sentinel() {
        let f = filter(100, 1500, false);
        assert_eq!(f.apply(99, 0), NO_DATA);
        assert_eq!(f.apply(1501, 0), NO_DATA);
        assert_eq!(f.apply(4095, 0), NO_DATA);
    }

    #[test]
    fn test_mask_tightens_upper_bound() {
        let f = filter(0, 1500, true);
        assert_eq!(f.effective_max(900), 900);
        assert_eq!(f.apply(901, 900), NO_DATA);
        assert_eq!(f.apply(900, 900), 900);
    }

    #[test]
    fn test_unlearned_or_negative_mask_falls_back_to_far_clip() {
        let f = filter(0, 1500, true);
        assert_eq!(f.effective_max(0), 1500);
        assert_eq!(f.effective_max(-30), 1500);
        assert_eq!(f.apply(1400, 0), 1400);
    }

    #[test]
    fn test_mask_ignored_when_disabled() {
        let f = filter(0, 1500, false);
        assert_eq!(f.apply(1200, 900), 1200);
    }

    #[test]
    fn test_output_is_sample_or_sentinel() {
        let f = filter(200, 1000, true);
        for mask in [0, 500, 1200] {
            for d in (-64..2000).step_by(7) {
                let d = d as i16;
                let clipped = f.apply(d, mask);
                let max = f.effective_max(mask);
                let expect_hole = d < 200 || (d as i32) > max;
                assert_eq!(clipped, if expect_hole { NO_DATA } else { d });
            }
        }
    }

    #[test]
    fn test_strip_player_index() {
        assert_eq!(ClippingFilter::strip_player_index(800 << 3 | 5), 800);
        assert_eq!(ClippingFilter::strip_player_index(-8), -1);
        assert_eq!(ClippingFilter::strip_player_index(7), 0);
    }
}
