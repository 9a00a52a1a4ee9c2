//! Frame acquisition interface.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use crosswatch_core::{ImageError, RgbImage};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 5/6/5-bit channels, as delivered by small camera sensors.
    #[default]
    Rgb565,
    Rgb888,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSize {
    /// 160x120. Too small for the learning region, so
    /// [`Pipeline::new`](crate::Pipeline::new) rejects it.
    Qqvga,
    /// 320x240
    #[default]
    Qvga,
    /// 640x480
    Vga,
}

impl FrameSize {
    pub fn dimensions(self) -> (usize, usize) {
        match self {
            FrameSize::Qqvga => (160, 120),
            FrameSize::Qvga => (320, 240),
            FrameSize::Vga => (640, 480),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    pub pixel_format: PixelFormat,
    pub frame_size: FrameSize,
}

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("frame source used before configure()")]
    NotConfigured,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("frame is {got_width}x{got_height}, source configured for {width}x{height}")]
    SizeMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Camera-like producer of frames. `next_frame` blocks until a frame is
/// available and returns `None` once the stream has ended.
pub trait FrameSource {
    fn reset(&mut self) -> Result<(), FrameError>;

    fn configure(&mut self, format: PixelFormat, size: FrameSize) -> Result<(), FrameError>;

    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameError>;
}

/// Truncate each channel to the precision of an RGB565 pixel, replicating
/// the high bits into the low ones the way sensors expand 565 to 888.
pub fn quantize_rgb565(img: &mut RgbImage) {
    for px in img.data.chunks_exact_mut(3) {
        let r5 = px[0] >> 3;
        let g6 = px[1] >> 2;
        let b5 = px[2] >> 3;
        px[0] = (r5 << 3) | (r5 >> 2);
        px[1] = (g6 << 2) | (g6 >> 4);
        px[2] = (b5 << 3) | (b5 >> 2);
    }
}

/// In-memory frame source, handy for replaying captured frames and tests.
/// Frames must already have the configured size.
#[derive(Clone, Debug, Default)]
pub struct FrameQueue {
    frames: Vec<RgbImage>,
    pending: VecDeque<RgbImage>,
    config: Option<FrameConfig>,
}

impl FrameQueue {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            pending: frames.iter().cloned().collect(),
            frames,
            config: None,
        }
    }
}

impl FrameSource for FrameQueue {
    fn reset(&mut self) -> Result<(), FrameError> {
        self.pending = self.frames.iter().cloned().collect();
        self.config = None;
        Ok(())
    }

    fn configure(&mut self, format: PixelFormat, size: FrameSize) -> Result<(), FrameError> {
        self.config = Some(FrameConfig {
            pixel_format: format,
            frame_size: size,
        });
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameError> {
        let config = self.config.ok_or(FrameError::NotConfigured)?;
        let Some(mut frame) = self.pending.pop_front() else {
            return Ok(None);
        };
        let (width, height) = config.frame_size.dimensions();
        if (frame.width, frame.height) != (width, height) {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                got_width: frame.width,
                got_height: frame.height,
            });
        }
        if config.pixel_format == PixelFormat::Rgb565 {
            quantize_rgb565(&mut frame);
        }
        Ok(Some(frame))
    }
}

/// Frame-rate bookkeeping over the whole run.
#[derive(Clone, Debug)]
pub struct FrameClock {
    started: Instant,
    last: Instant,
    frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last: now,
            frames: 0,
        }
    }
}

impl FrameClock {
    /// Record one processed frame; returns the instantaneous rate in Hz.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        self.frames += 1;
        if dt > 0.0 {
            1.0 / dt
        } else {
            0.0
        }
    }

    /// Mean rate since the clock was created.
    pub fn fps(&self) -> f32 {
        let elapsed = self.last.duration_since(self.started).as_secs_f32();
        if elapsed > 0.0 {
            self.frames as f32 / elapsed
        } else {
            0.0
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
