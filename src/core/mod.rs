pub mod buffer;
pub mod frame;

pub use buffer::{FrameBuffer, BYTES_PER_PIXEL};
pub use frame::{encode_sample, DepthFrame, PLAYER_INDEX_BITMASK_WIDTH};
