//! Backend-agnostic shader gallery engine.
//!
//! The crate turns a [`catalog::Catalog`] of GLSL effect sources into a set of
//! compiled programs and drives one of them at a time over a base image or a
//! textured mesh. Everything that touches a graphics API sits behind
//! [`GpuBackend`]; the engine itself only decides what to compile, what to
//! bind and what to draw.
//!
//! ```text
//!   Catalog ──▶ LoadScheduler ──▶ compile_effect ──▶ Gallery
//!                                                     │ switch_to / next / prev
//!   ViewerEvent ──▶ Viewer ──▶ FrameDriver ──▶ GpuBackend::render
//!                                                     │ capture
//!                                                     ▼
//!                                       CaptureService ──▶ ImageSink
//! ```
//!
//! Layout and mouse coordinates use a bottom-left origin throughout.
mod backend;
mod camera;
mod capture;
mod compiler;
mod error;
mod frame;
mod gallery;
mod input;
mod layout;
mod loader;
mod mesh;
mod uniforms;
mod viewer;

#[cfg(test)]
mod testing;

pub use catalog;

pub use backend::{
    BackendError, CompileError, DrawCall, Framebuffer, GpuBackend, PipelineKind, RowOrder,
};
pub use camera::OrbitCamera;
pub use capture::{
    CaptureError, CaptureService, ImageSink, PngDirectorySink, DEFAULT_MAX_DIMENSION,
};
pub use compiler::{compile_effect, release_effect, CompiledEffect};
pub use error::GalleryError;
pub use frame::{BoxedFrameClock, FixedClock, FrameClock, FrameDriver, SystemClock};
pub use gallery::{Gallery, CUSTOM_EFFECT_NAME};
pub use input::{
    DoubleTap, EventOutcome, HeldKeys, TouchPhase, ViewerEvent, ViewerKey, DOUBLE_TAP_MAX,
    DOUBLE_TAP_MIN,
};
pub use layout::DisplayGeometry;
pub use loader::{LoadProgress, LoadScheduler, LoadState, LoadStrategy};
pub use mesh::{MeshData, MeshTransforms, MeshVertex, Submesh};
pub use uniforms::{Tunable, UniformBlock, UniformState, ViewFrame};
pub use viewer::{BaseAsset, Drawable, EventSink, TextureSource, Viewer, ViewerOptions};
