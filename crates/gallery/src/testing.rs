//! In-memory backend for engine tests.
use std::collections::BTreeSet;

use image::RgbaImage;

use crate::backend::{
    BackendError, CompileError, DrawCall, Framebuffer, GpuBackend, PipelineKind, RowOrder,
};
use crate::capture::DEFAULT_MAX_DIMENSION;
use crate::mesh::MeshData;
use crate::uniforms::UniformBlock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProgram {
    pub id: usize,
    pub kind: PipelineKind,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct MockBackend {
    pub(crate) next_id: usize,
    pub(crate) live: BTreeSet<usize>,
    pub released: Vec<usize>,
    pub bound: Option<MockProgram>,
    pub uniforms: Vec<UniformBlock>,
    pub textures: Vec<(u32, u32)>,
    pub meshes: usize,
    pub draws: Vec<DrawCall>,
    pub canvas: (u32, u32),
    pub row_order: Option<RowOrder>,
    pub fail_texture: bool,
    pub max_dimension: Option<u32>,
}

impl MockBackend {
    pub fn live_programs(&self) -> usize {
        self.live.len()
    }

    pub fn bound_name(&self) -> Option<&str> {
        self.bound.as_ref().map(|program| program.name.as_str())
    }
}

impl GpuBackend for MockBackend {
    type Program = MockProgram;

    fn build_program(
        &mut self,
        kind: PipelineKind,
        name: &str,
        fragment: &str,
    ) -> Result<MockProgram, CompileError> {
        let marker = match kind {
            PipelineKind::Mesh3d => "FAIL_3D",
            PipelineKind::Quad2d => "FAIL_2D",
        };
        if fragment.contains("INVALID") || fragment.contains(marker) {
            return Err(CompileError::new(kind, "syntax error"));
        }
        self.next_id += 1;
        self.live.insert(self.next_id);
        Ok(MockProgram {
            id: self.next_id,
            kind,
            name: name.to_string(),
        })
    }

    fn release_program(&mut self, program: MockProgram) {
        self.live.remove(&program.id);
        self.released.push(program.id);
    }

    fn use_program(&mut self, program: &MockProgram) {
        self.bound = Some(program.clone());
    }

    fn upload_uniforms(&mut self, block: &UniformBlock) {
        self.uniforms.push(*block);
    }

    fn upload_texture(&mut self, image: &RgbaImage) -> Result<(), BackendError> {
        if self.fail_texture {
            return Err(BackendError::Upload {
                what: "texture",
                message: "rejected".to_string(),
            });
        }
        self.textures.push(image.dimensions());
        Ok(())
    }

    fn upload_mesh(&mut self, _mesh: &MeshData) -> Result<(), BackendError> {
        self.meshes += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return self.canvas;
        }
        let limit = self.max_dimension();
        self.canvas = (width.min(limit), height.min(limit));
        self.canvas
    }

    fn max_dimension(&self) -> u32 {
        self.max_dimension.unwrap_or(DEFAULT_MAX_DIMENSION)
    }

    fn render(
        &mut self,
        draw: DrawCall,
        capture: bool,
    ) -> Result<Option<Framebuffer>, BackendError> {
        self.draws.push(draw);
        if !capture {
            return Ok(None);
        }
        let (width, height) = self.canvas;
        // Each row is filled with its own index so flips and crops are visible.
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for row in 0..height {
            for _ in 0..width {
                pixels.extend_from_slice(&[row as u8, 0, 0, 255]);
            }
        }
        Ok(Some(Framebuffer {
            width,
            height,
            pixels,
            row_order: self.row_order.unwrap_or(RowOrder::TopDown),
        }))
    }
}
