use crate::core::DepthFrame;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Lifecycle of a depth source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    Unopened,
    Opened,
    Running,
    Stopped,
    Closed,
    Error(String),
}

/// Result of one read from a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRead {
    Frame(DepthFrame),
    /// The source had a cycle but no usable frame
    Missing,
    /// No more frames will arrive
    Finished,
}

/// Anything that produces raw depth frames: a driver, a recording, a test harness
#[async_trait]
pub trait DepthSource: Send {
    /// Called once before open with source-specific JSON settings
    async fn configure(&mut self, config: Value) -> Result<()>;

    async fn open(&mut self) -> Result<()>;

    async fn start(&mut self) -> Result<()>;

    /// Wait for the next frame cycle
    async fn read_frame(&mut self) -> Result<SourceRead>;

    async fn stop(&mut self) -> Result<()>;

    async fn close(&mut self) -> Result<()>;

    fn state(&self) -> SourceState;

    /// Frame width and height, fixed once opened
    fn dimensions(&self) -> (usize, usize);
}
