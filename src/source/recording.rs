use super::{DepthSource, SourceRead, SourceState};
use crate::core::DepthFrame;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use memmap2::Mmap;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tokio::time::{sleep, Duration};

const MAGIC: &[u8; 8] = b"DEPTHRAW";
const VERSION: u64 = 1;
const HEADER_SIZE: usize = 64;
const FRAME_COUNT_OFFSET: u64 = 32;
const SAMPLE_BYTES: usize = 2;

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(word)
}

/// Writes raw frames to disk so a session can be replayed later
pub struct RecordingWriter {
    writer: BufWriter<File>,
    width: usize,
    height: usize,
    frames_written: u64,
}

impl RecordingWriter {
    pub fn create(path: impl AsRef<Path>, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("Recording needs non-zero dimensions"));
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);

        let mut header = [0u8; HEADER_SIZE];
        header[0..8].copy_from_slice(MAGIC);
        header[8..16].copy_from_slice(&VERSION.to_le_bytes());
        header[16..24].copy_from_slice(&(width as u64).to_le_bytes());
        header[24..32].copy_from_slice(&(height as u64).to_le_bytes());
        writer.write_all(&header)?;

        Ok(Self {
            writer,
            width,
            height,
            frames_written: 0,
        })
    }

    pub fn write_frame(&mut self, samples: &[i16]) -> Result<()> {
        let expected = self.width * self.height;
        if samples.len() != expected {
            return Err(anyhow!(
                "Expected {} samples per frame, got {}",
                expected,
                samples.len()
            ));
        }
        for sample in samples {
            self.writer.write_all(&sample.to_le_bytes())?;
        }
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Patch the frame count into the header and flush
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        let mut file = self
            .writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush recording: {}", e))?;
        file.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))?;
        file.write_all(&self.frames_written.to_le_bytes())?;
        file.sync_all()?;
        Ok(self.frames_written)
    }
}

/// Plays back a file produced by [`RecordingWriter`]
pub struct ReplaySource {
    state: SourceState,
    path: PathBuf,
    mmap: Option<Mmap>,
    width: usize,
    height: usize,
    frame_count: u64,
    next_frame: u64,
    interval_ms: u64,
    looping: bool,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            state: SourceState::Unopened,
            path: path.into(),
            mmap: None,
            width: 0,
            height: 0,
            frame_count: 0,
            next_frame: 0,
            interval_ms: 0,
            looping: false,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn frame_bytes(&self) -> usize {
        self.width * self.height * SAMPLE_BYTES
    }

    /// File length a header promises, refusing sizes that cannot be addressed
    fn expected_len(width: u64, height: u64, frame_count: u64) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(anyhow!("Recording has zero dimensions {}x{}", width, height));
        }
        let frame_bytes = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .and_then(|pixels| pixels.checked_mul(SAMPLE_BYTES))
            .ok_or_else(|| anyhow!("Recording frame size {}x{} overflows", width, height))?;
        let needed = usize::try_from(frame_count)
            .ok()
            .and_then(|count| count.checked_mul(frame_bytes))
            .and_then(|bytes| bytes.checked_add(HEADER_SIZE))
            .ok_or_else(|| anyhow!("Recording of {} frames overflows", frame_count))?;
        Ok(needed)
    }

    fn map_recording(&mut self) -> Result<()> {
        let file = File::open(&self.path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < HEADER_SIZE || &mmap[0..8] != MAGIC {
            return Err(anyhow!("{} is not a depth recording", self.path.display()));
        }
        let version = read_u64(&mmap, 8);
        if version != VERSION {
            return Err(anyhow!("Unsupported recording version {}", version));
        }

        let width = read_u64(&mmap, 16);
        let height = read_u64(&mmap, 24);
        let frame_count = read_u64(&mmap, 32);
        let needed = Self::expected_len(width, height, frame_count)?;
        if mmap.len() < needed {
            return Err(anyhow!(
                "Recording truncated: {} bytes, header promises {}",
                mmap.len(),
                needed
            ));
        }

        // sizes now fit inside the mapping, so frame_bytes() cannot overflow
        self.width = width as usize;
        self.height = height as usize;
        self.frame_count = frame_count;
        self.mmap = Some(mmap);
        Ok(())
    }
}

#[async_trait]
impl DepthSource for ReplaySource {
    async fn configure(&mut self, config: Value) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("Cannot configure source in state {:?}", self.state));
        }
        if let Some(ms) = config["interval_ms"].as_u64() {
            self.interval_ms = ms;
        }
        if let Some(looping) = config["loop"].as_bool() {
            self.looping = looping;
        }
        Ok(())
    }

    async fn open(&mut self) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("Cannot open source in state {:?}", self.state));
        }

        if let Err(e) = self.map_recording() {
            self.state = SourceState::Error(e.to_string());
            return Err(e);
        }
        self.state = SourceState::Opened;
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        if self.state != SourceState::Opened && self.state != SourceState::Stopped {
            return Err(anyhow!("Cannot start source in state {:?}", self.state));
        }
        self.next_frame = 0;
        self.state = SourceState::Running;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<SourceRead> {
        if self.state != SourceState::Running {
            return Err(anyhow!("Source not running"));
        }
        if self.next_frame >= self.frame_count {
            if !self.looping || self.frame_count == 0 {
                return Ok(SourceRead::Finished);
            }
            self.next_frame = 0;
        }

        if self.interval_ms > 0 {
            sleep(Duration::from_millis(self.interval_ms)).await;
        }

        let mmap = self
            .mmap
            .as_ref()
            .ok_or_else(|| anyhow!("Recording not mapped"))?;
        let frame_bytes = self.frame_bytes();
        let start = HEADER_SIZE + self.next_frame as usize * frame_bytes;
        let samples = mmap[start..start + frame_bytes]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        let frame = DepthFrame::new(self.width, self.height, samples)
            .with_sequence(self.next_frame, 0);
        self.next_frame += 1;
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
        self.mmap = None;
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
