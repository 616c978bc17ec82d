//! `wgpu` backend for the shader gallery.
//!
//! [`WgpuBackend`] implements [`gallery::GpuBackend`] on top of a window
//! surface. Effect fragments are GLSL ES style sources; they are wrapped into
//! Vulkan GLSL, validated with naga, and linked against one of two shared
//! vertex stages:
//!
//! ```text
//!   effect source ──▶ wrap_fragment ──▶ naga validate ──▶ fragment module
//!                                                          │
//!        quad vertex (2D, viewport = display rect) ◀───────┤
//!        mesh vertex (3D, Transform block, depth)  ◀───────┘
//! ```
//!
//! All pipelines share one bind group at set 0: the `EffectParams` block
//! (binding 0), the mesh `Transform` block (binding 1), the base texture
//! (binding 2) and its sampler (binding 3). Frames that must be captured are
//! also drawn into an offscreen target and read back as top-down RGBA.
mod backend;
mod compile;
mod context;
mod pipeline;
mod readback;

pub use backend::{WgpuBackend, WgpuProgram};
pub use context::SurfaceOptions;
