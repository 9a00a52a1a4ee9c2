//! Frame source backed by a directory of still images.

use std::fs;
use std::path::{Path, PathBuf};

use crosswatch_core::RgbImage;
use image::imageops::FilterType;
use image::ImageReader;
use log::debug;

use crate::frame::{quantize_rgb565, FrameConfig, FrameError, FrameSize, FrameSource, PixelFormat};

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Replays the images of a directory in lexical file-name order, as if they
/// came from a camera configured with [`FrameSource::configure`].
pub struct ImageSequenceSource {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    cursor: usize,
    config: Option<FrameConfig>,
}

impl ImageSequenceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FrameError> {
        let dir = dir.into();
        let paths = list_images(&dir)?;
        Ok(Self {
            dir,
            paths,
            cursor: 0,
            config: None,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, FrameError> {
    let io_err = |source| FrameError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_frame(path: &Path, size: FrameSize) -> Result<RgbImage, FrameError> {
    let decode_err = |e: image::ImageError| FrameError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let img = ImageReader::open(path)
        .map_err(|source| FrameError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(decode_err)?
        .to_rgb8();

    let (w, h) = size.dimensions();
    let img = if (img.width() as usize, img.height() as usize) == (w, h) {
        img
    } else {
        debug!(
            "resizing {} from {}x{} to {w}x{h}",
            path.display(),
            img.width(),
            img.height()
        );
        image::imageops::resize(&img, w as u32, h as u32, FilterType::Triangle)
    };
    Ok(RgbImage::from_raw(w, h, img.into_raw())?)
}

impl FrameSource for ImageSequenceSource {
    fn reset(&mut self) -> Result<(), FrameError> {
        self.paths = list_images(&self.dir)?;
        self.cursor = 0;
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
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        let mut frame = load_frame(path, config.frame_size)?;
        if config.pixel_format == PixelFormat::Rgb565 {
            quantize_rgb565(&mut frame);
        }
        Ok(Some(frame))
    }
}
