//! One-shot screenshots.
//!
//! Types:
//!
//! - `CaptureService` remembers a pending request until the end of the next
//!   completed frame, then turns the readback into the final image.
//! - `ImageSink` receives finished captures; `PngDirectorySink` writes them as
//!   timestamped PNG files.
//! - `CaptureError` covers degenerate sizes and readback or encode failures.
//!   All of them are recoverable.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use thiserror::Error;
use tracing::{debug, info};

use crate::backend::{Framebuffer, RowOrder};
use crate::layout::DisplayGeometry;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("canvas has no area ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },

    #[error("capture region has no area ({width}x{height})")]
    EmptyCrop { width: u32, height: u32 },

    #[error("scale factor {scale} takes a {width}x{height} capture past {limit} pixels")]
    ScaleTooLarge {
        scale: u32,
        width: u32,
        height: u32,
        limit: u32,
    },

    #[error("framebuffer readback unavailable: {0}")]
    Readback(String),

    #[error("failed to encode capture: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait ImageSink {
    /// Persists or forwards a finished capture, returning where it went.
    fn save(&mut self, image: &RgbaImage) -> Result<PathBuf, CaptureError>;
}

#[derive(Debug, Clone)]
pub struct PngDirectorySink {
    dir: PathBuf,
    prefix: String,
}

impl PngDirectorySink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y.%m.%d-%H.%M.%S%.3f");
        self.dir.join(format!("{}-{stamp}.png", self.prefix))
    }
}

impl ImageSink for PngDirectorySink {
    fn save(&mut self, image: &RgbaImage) -> Result<PathBuf, CaptureError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.next_path();
        image.save_with_format(&path, ImageFormat::Png)?;
        Ok(path)
    }
}

/// Output edge limit used when the backend reports none.
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

#[derive(Debug)]
pub struct CaptureService {
    pending: Option<u32>,
    max_dimension: u32,
}

impl Default for CaptureService {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION)
    }
}

impl CaptureService {
    /// `max_dimension` bounds both edges of the scaled output.
    pub fn new(max_dimension: u32) -> Self {
        Self {
            pending: None,
            max_dimension: max_dimension.max(1),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Marks a capture for the end of the next frame. A scale below one is
    /// treated as one.
    pub fn request(&mut self, scale: u32) {
        let scale = scale.max(1);
        debug!(scale, "capture requested");
        self.pending = Some(scale);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn take_pending(&mut self) -> Option<u32> {
        self.pending.take()
    }

    /// Flips, crops and scales a finished frame, then hands it to `sink`.
    pub fn complete(
        &self,
        framebuffer: Option<Framebuffer>,
        region: &DisplayGeometry,
        scale: u32,
        sink: &mut dyn ImageSink,
    ) -> Result<PathBuf, CaptureError> {
        if region.canvas_w == 0 || region.canvas_h == 0 {
            return Err(CaptureError::EmptyCanvas {
                width: region.canvas_w,
                height: region.canvas_h,
            });
        }
        if region.is_empty() {
            return Err(CaptureError::EmptyCrop {
                width: region.display_w,
                height: region.display_h,
            });
        }
        let framebuffer = framebuffer
            .ok_or_else(|| CaptureError::Readback("backend returned no pixels".to_string()))?;
        let image = crop_and_scale(framebuffer, region, scale, self.max_dimension)?;
        let path = sink.save(&image)?;
        info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "saved capture"
        );
        Ok(path)
    }
}

fn crop_and_scale(
    framebuffer: Framebuffer,
    region: &DisplayGeometry,
    scale: u32,
    limit: u32,
) -> Result<RgbaImage, CaptureError> {
    let Framebuffer {
        width,
        height,
        pixels,
        row_order,
    } = framebuffer;
    let mut canvas = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        CaptureError::Readback(format!("pixel buffer does not match {width}x{height}"))
    })?;
    if row_order == RowOrder::BottomUp {
        imageops::flip_vertical_in_place(&mut canvas);
    }

    let cropped = imageops::crop_imm(
        &canvas,
        region.display_x,
        region.top_down_y(),
        region.display_w,
        region.display_h,
    )
    .to_image();
    if cropped.width() == 0 || cropped.height() == 0 {
        return Err(CaptureError::EmptyCrop {
            width: cropped.width(),
            height: cropped.height(),
        });
    }
    if scale <= 1 {
        return Ok(cropped);
    }

    let too_large = || CaptureError::ScaleTooLarge {
        scale,
        width: cropped.width(),
        height: cropped.height(),
        limit,
    };
    let scaled_w = cropped
        .width()
        .checked_mul(scale)
        .filter(|w| *w <= limit)
        .ok_or_else(too_large)?;
    let scaled_h = cropped
        .height()
        .checked_mul(scale)
        .filter(|h| *h <= limit)
        .ok_or_else(too_large)?;
    Ok(imageops::resize(&cropped, scaled_w, scaled_h, FilterType::Nearest))
}
