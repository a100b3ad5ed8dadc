pub mod events;
pub mod processor;
pub mod state;
pub mod stream;

pub use events::{EventBus, PipelineEvent};
pub use processor::{FrameOutcome, FrameProcessor, FrameView};
pub use state::PipelineState;
pub use stream::{FrameStreamRunner, StreamSummary};
