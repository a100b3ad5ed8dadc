pub mod recording;
pub mod synthetic;
pub mod traits;

pub use recording::{RecordingWriter, ReplaySource};
pub use synthetic::SyntheticDepthSource;
pub use traits::{DepthSource, SourceRead, SourceState};
