use serde::{Deserialize, Serialize};

/// Lifecycle of a frame processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PipelineState {
    /// No frame has arrived yet
    #[default]
    AwaitingSensor,
    /// Learning the background mask
    Calibrating { remaining_frames: u32 },
    /// Mask frozen, output is foreground only
    Ready,
}

impl PipelineState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, target),
            (AwaitingSensor, Calibrating { .. }) |

            // countdown progress and completion
            (Calibrating { .. }, Calibrating { .. }) |
            (Calibrating { .. }, Ready) |

            // reset
            (Ready, Calibrating { .. })
        )
    }

    /// Get human-readable state name
    pub fn name(&self) -> &str {
        match self {
            Self::AwaitingSensor => "AwaitingSensor",
            Self::Calibrating { .. } => "Calibrating",
            Self::Ready => "Ready",
        }
    }

    /// Status line suitable for a host UI
    pub fn status_text(&self) -> &str {
        match self {
            Self::AwaitingSensor => "Waiting for sensor...",
            Self::Calibrating { .. } => "Initializing...",
            Self::Ready => "Ready!",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}
