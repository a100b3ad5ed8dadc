use serde::{Deserialize, Serialize};

/// Low bits of every raw sample reserved for the sensor's player index
pub const PLAYER_INDEX_BITMASK_WIDTH: u32 = 3;

/// One raw frame as delivered by a depth source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthFrame {
    /// Timestamp in microseconds since the source started
    pub timestamp: u64,

    /// Sequential frame number for ordering
    pub sequence_id: u64,

    pub width: usize,
    pub height: usize,

    /// Row-major raw samples, player index still in the low bits
    pub samples: Vec<i16>,
}

impl DepthFrame {
    pub fn new(width: usize, height: usize, samples: Vec<i16>) -> Self {
        Self {
            timestamp: 0,
            sequence_id: 0,
            width,
            height,
            samples,
        }
    }

    /// Frame where every pixel reads the same distance
    pub fn filled(width: usize, height: usize, depth: i16) -> Self {
        Self::new(width, height, vec![encode_sample(depth, 0); width * height])
    }

    pub fn with_sequence(mut self, sequence_id: u64, timestamp: u64) -> Self {
        self.sequence_id = sequence_id;
        self.timestamp = timestamp;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.samples.len()
    }
}

/// Pack a distance and player index the way the sensor does
pub fn encode_sample(depth: i16, player_index: u8) -> i16 {
    let player_mask = (1i16 << PLAYER_INDEX_BITMASK_WIDTH) - 1;
    depth.wrapping_shl(PLAYER_INDEX_BITMASK_WIDTH) | (player_index as i16 & player_mask)
}
