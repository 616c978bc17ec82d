//! The GPU seam. The engine never talks to a graphics API directly; it drives
//! an implementation of [`GpuBackend`] instead.
use image::RgbaImage;
use thiserror::Error;

use crate::capture::DEFAULT_MAX_DIMENSION;
use crate::layout::DisplayGeometry;
use crate::mesh::{MeshData, MeshTransforms};
use crate::uniforms::UniformBlock;

/// Which shared vertex stage a program is linked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Position/normal/texcoord attributes with model-view and projection.
    Mesh3d,
    /// Clip-space quad covering the display rectangle.
    Quad2d,
}

impl PipelineKind {
    pub fn label(self) -> &'static str {
        match self {
            PipelineKind::Mesh3d => "3d",
            PipelineKind::Quad2d => "2d",
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{pipeline} pipeline failed to compile: {message}")]
pub struct CompileError {
    pub pipeline: PipelineKind,
    pub message: String,
}

impl CompileError {
    pub fn new(pipeline: PipelineKind, message: impl Into<String>) -> Self {
        Self {
            pipeline,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// The surface must be reconfigured before the next frame.
    #[error("surface lost or outdated")]
    SurfaceLost,

    #[error("GPU is out of memory")]
    OutOfMemory,

    #[error("surface timed out")]
    Timeout,

    #[error("failed to upload {what}: {message}")]
    Upload { what: &'static str, message: String },

    #[error("framebuffer readback failed: {0}")]
    Readback(String),

    #[error("{0}")]
    Other(String),
}

/// Vertical order of rows in a readback buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    TopDown,
    BottomUp,
}

/// Tightly packed RGBA8 pixels read back from the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub row_order: RowOrder,
}

/// One frame's draw for the active program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCall {
    Quad { display: DisplayGeometry },
    Mesh { transforms: MeshTransforms },
}

pub trait GpuBackend {
    type Program;

    /// Compiles `fragment` against the vertex stage for `kind`. Failures are
    /// returned, never panicked on.
    fn build_program(
        &mut self,
        kind: PipelineKind,
        name: &str,
        fragment: &str,
    ) -> Result<Self::Program, CompileError>;

    fn release_program(&mut self, program: Self::Program) {
        drop(program);
    }

    fn use_program(&mut self, program: &Self::Program);

    fn upload_uniforms(&mut self, block: &UniformBlock);

    /// Replaces the base texture bound to every program.
    fn upload_texture(&mut self, image: &RgbaImage) -> Result<(), BackendError>;

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<(), BackendError>;

    /// Resizes the render target and returns the size actually in effect,
    /// which may be clamped to [`GpuBackend::max_dimension`] or unchanged for
    /// zero-sized requests.
    fn resize(&mut self, width: u32, height: u32) -> (u32, u32);

    /// Largest texture edge the device supports.
    fn max_dimension(&self) -> u32 {
        DEFAULT_MAX_DIMENSION
    }

    /// Renders one frame with the program last passed to `use_program`. When
    /// `capture` is set the finished canvas is read back before presenting.
    fn render(&mut self, draw: DrawCall, capture: bool)
        -> Result<Option<Framebuffer>, BackendError>;
}
