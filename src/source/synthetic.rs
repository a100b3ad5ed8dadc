use super::{DepthSource, SourceRead, SourceState};
use crate::core::{encode_sample, DepthFrame};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::time::{sleep, Duration, Instant};

/// Generated scene: a flat back wall with a square object sliding across it
pub struct SyntheticDepthSource {
    state: SourceState,
    width: usize,
    height: usize,
    background_depth: i16,
    object_depth: i16,
    object_size: usize,
    /// Frames of empty room before the object appears
    object_after: u64,
    interval_ms: u64,
    /// Every Nth cycle yields no frame (0 disables)
    drop_every: u64,
    frame_limit: Option<u64>,
    cycle: u64,
    frame_counter: u64,
    start_time: Option<Instant>,
}

impl SyntheticDepthSource {
    pub fn new() -> Self {
        Self {
            state: SourceState::Unopened,
            width: 64,
            height: 48,
            background_depth: 1200,
            object_depth: 700,
            object_size: 8,
            object_after: 60,
            interval_ms: 0,
            drop_every: 0,
            frame_limit: None,
            cycle: 0,
            frame_counter: 0,
            start_time: None,
        }
    }

    /// Build the raw samples for frame number `index`
    pub fn render(&self, index: u64) -> Vec<i16> {
        let background = encode_sample(self.background_depth, 0);
        let mut samples = vec![background; self.width * self.height];

        if index < self.object_after || self.object_size == 0 {
            return samples;
        }

        let size = self.object_size.min(self.width).min(self.height);
        let travel = (self.width - size + 1) as u64;
        let left = ((index - self.object_after) % travel) as usize;
        let top = (self.height - size) / 2;
        let object = encode_sample(self.object_depth, 1);

        for row in top..top + size {
            let start = row * self.width + left;
            samples[start..start + size].fill(object);
        }
        samples
    }
}

impl Default for SyntheticDepthSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DepthSource for SyntheticDepthSource {
    async fn configure(&mut self, config: Value) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("Cannot configure source in state {:?}", self.state));
        }

        if let Some(w) = config["width"].as_u64() {
            self.width = w as usize;
        }
        if let Some(h) = config["height"].as_u64() {
            self.height = h as usize;
        }
        if let Some(d) = config["background_depth"].as_i64() {
            self.background_depth = i16::try_from(d)?;
        }
        if let Some(d) = config["object_depth"].as_i64() {
            self.object_depth = i16::try_from(d)?;
        }
        if let Some(s) = config["object_size"].as_u64() {
            self.object_size = s as usize;
        }
        if let Some(n) = config["object_after"].as_u64() {
            self.object_after = n;
        }
        if let Some(ms) = config["interval_ms"].as_u64() {
            self.interval_ms = ms;
        }
        if let Some(n) = config["drop_every"].as_u64() {
            self.drop_every = n;
        }
        self.frame_limit = config["frame_limit"].as_u64();

        if self.width == 0 || self.height == 0 {
            return Err(anyhow!("Synthetic source needs non-zero dimensions"));
        }
        Ok(())
    }

    async fn open(&mut self) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("Cannot open source in state {:?}", self.state));
        }
        self.state = SourceState::Opened;
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        if self.state != SourceState::Opened && self.state != SourceState::Stopped {
            return Err(anyhow!("Cannot start source in state {:?}", self.state));
        }
        self.state = SourceState::Running;
        self.start_time = Some(Instant::now());
        self.cycle = 0;
        self.frame_counter = 0;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<SourceRead> {
        if self.state != SourceState::Running {
            return Err(anyhow!("Source not running"));
        }
        if self.frame_limit.is_some_and(|limit| self.frame_counter >= limit) {
            return Ok(SourceRead::Finished);
        }

        if self.interval_ms > 0 {
            sleep(Duration::from_millis(self.interval_ms)).await;
        }

        self.cycle += 1;
        if self.drop_every > 0 && self.cycle % self.drop_every == 0 {
            return Ok(SourceRead::Missing);
        }

        let timestamp = self
            .start_time
            .map(|t| t.elapsed().as_micros() as u64)
            .unwrap_or(0);
        let samples = self.render(self.frame_counter);
        let frame = DepthFrame::new(self.width, self.height, samples)
            .with_sequence(self.frame_counter, timestamp);

        self.frame_counter += 1;
        Ok(SourceRead::Frame(frame))
    }

    async fn stop(&mut self) -> Result<()> {
        if self.state != SourceState::Running {
            return Ok(());
        }
        self.state = SourceState::Stopped;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.state == SourceState::Running {
            self.stop().await?;
        }
        self.state = SourceState::Closed;
        Ok(())
    }

    fn state(&self) -> SourceState {
        self.state.clone()
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}
