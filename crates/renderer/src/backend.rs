use anyhow::Result;
use gallery::{
    BackendError, CompileError, DisplayGeometry, DrawCall, Framebuffer, GpuBackend, MeshData,
    MeshTransforms, PipelineKind, UniformBlock,
};
use image::imageops::flip_vertical;
use image::RgbaImage;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::naga::ShaderStage;
use wgpu::util::{BufferInitDescriptor, DeviceExt, TextureDataOrder};

use crate::compile::{create_module, validate, wrap_fragment};
use crate::context::{GpuContext, SurfaceOptions};
use crate::pipeline::{PipelineLayouts, DEPTH_FORMAT};
use crate::readback::{read_target, CaptureTarget};

/// One compiled effect half.
#[derive(Debug, Clone)]
pub struct WgpuProgram {
    id: u64,
    kind: PipelineKind,
    pipeline: wgpu::RenderPipeline,
}

impl WgpuProgram {
    pub fn kind(&self) -> PipelineKind {
        self.kind
    }
}

struct BaseTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuSubmesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct DepthTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// [`GpuBackend`] over a `wgpu` window surface.
pub struct WgpuBackend {
    context: GpuContext,
    layouts: PipelineLayouts,
    uniform_buffer: wgpu::Buffer,
    transform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    texture: BaseTexture,
    bind_group: wgpu::BindGroup,
    meshes: Vec<GpuSubmesh>,
    depth: Option<DepthTarget>,
    capture: Option<CaptureTarget>,
    bound: Option<WgpuProgram>,
    next_id: u64,
}

impl WgpuBackend {
    pub fn new<T>(target: &T, size: (u32, u32), options: SurfaceOptions) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size, options)?;
        let device = &context.device;
        let layouts = PipelineLayouts::new(device);

        let uniform_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("effect params"),
            contents: bytemuck::bytes_of(&<UniformBlock as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let transform_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("mesh transforms"),
            contents: bytemuck::bytes_of(&MeshTransforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("base sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // White 1x1 until the base image arrives.
        let texture = create_base_texture(device, &context.queue, 1, 1, &[255, 255, 255, 255]);
        let bind_group = create_bind_group(
            device,
            &layouts,
            &uniform_buffer,
            &transform_buffer,
            &texture.view,
            &sampler,
        );

        tracing::info!(
            width = context.config.width,
            height = context.config.height,
            format = ?context.surface_format,
            "renderer ready"
        );

        Ok(Self {
            context,
            layouts,
            uniform_buffer,
            transform_buffer,
            sampler,
            texture,
            bind_group,
            meshes: Vec::new(),
            depth: None,
            capture: None,
            bound: None,
            next_id: 0,
        })
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.context.size()
    }

    fn depth_view(&mut self) -> wgpu::TextureView {
        let size = self.context.size();
        if let Some(depth) = self.depth.as_ref().filter(|depth| depth.size == size) {
            return depth.view.clone();
        }
        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some(DepthTarget {
            _texture: texture,
            view: view.clone(),
            size,
        });
        view
    }

    fn ensure_capture_target(&mut self) {
        let (width, height) = self.context.size();
        if self
            .capture
            .as_ref()
            .is_some_and(|target| target.matches(width, height))
        {
            return;
        }
        self.capture = Some(CaptureTarget::new(
            &self.context.device,
            width,
            height,
            self.context.surface_format,
        ));
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth: Option<&wgpu::TextureView>,
        draw: &DrawCall,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("effect pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: depth.map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let Some(program) = self.bound.as_ref() else {
            return;
        };
        let expected = match draw {
            DrawCall::Quad { .. } => PipelineKind::Quad2d,
            DrawCall::Mesh { .. } => PipelineKind::Mesh3d,
        };
        if program.kind != expected {
            tracing::warn!(bound = %program.kind, %expected, "bound program does not match draw");
            return;
        }
        pass.set_pipeline(&program.pipeline);
        match draw {
            DrawCall::Quad { display } => {
                let Some((x, y, w, h)) = viewport(display, self.context.size()) else {
                    return;
                };
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_viewport(x, y, w, h, 0.0, 1.0);
                pass.draw(0..6, 0..1);
            }
            DrawCall::Mesh { .. } => {
                for step in mesh_steps(self.meshes.len()) {
                    match step {
                        MeshStep::BindTexture => pass.set_bind_group(0, &self.bind_group, &[]),
                        MeshStep::Draw(index) => {
                            let Some(mesh) = self.meshes.get(index) else {
                                continue;
                            };
                            pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                            pass.set_index_buffer(
                                mesh.indices.slice(..),
                                wgpu::IndexFormat::Uint32,
                            );
                            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                        }
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeshStep {
    BindTexture,
    Draw(usize),
}

/// Command order for the mesh path: the texture is rebound ahead of every
/// submesh.
fn mesh_steps(submeshes: usize) -> impl Iterator<Item = MeshStep> {
    (0..submeshes).flat_map(|index| [MeshStep::BindTexture, MeshStep::Draw(index)])
}

/// Display rectangle as a top-left-origin viewport, clipped to the surface.
fn viewport(display: &DisplayGeometry, surface: (u32, u32)) -> Option<(f32, f32, f32, f32)> {
    if display.is_empty() {
        return None;
    }
    let x = display.display_x.min(surface.0);
    let y = display.top_down_y().min(surface.1);
    let w = display.display_w.min(surface.0 - x);
    let h = display.display_h.min(surface.1 - y);
    if w == 0 || h == 0 {
        return None;
    }
    Some((x as f32, y as f32, w as f32, h as f32))
}

fn create_base_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    width: u32,
    height: u32,
    data: &[u8],
) -> BaseTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("base texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        data,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    BaseTexture {
        _texture: texture,
        view,
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    uniforms: &wgpu::Buffer,
    transforms: &wgpu::Buffer,
    texture: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("effect bind group"),
        layout: &layouts.bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: transforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(texture),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn map_surface_error(err: wgpu::SurfaceError) -> BackendError {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => BackendError::SurfaceLost,
        wgpu::SurfaceError::OutOfMemory => BackendError::OutOfMemory,
        wgpu::SurfaceError::Timeout => BackendError::Timeout,
        other => BackendError::Other(other.to_string()),
    }
}

impl GpuBackend for WgpuBackend {
    type Program = WgpuProgram;

    fn build_program(
        &mut self,
        kind: PipelineKind,
        name: &str,
        fragment: &str,
    ) -> Result<WgpuProgram, CompileError> {
        let wrapped = wrap_fragment(fragment);
        validate(&wrapped.source, ShaderStage::Fragment)
            .map_err(|message| CompileError::new(kind, message))?;
        tracing::trace!(effect = name, pipeline = %kind, declared = ?wrapped.declared, "wrapped fragment");

        let label = format!("{name} ({kind})");
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = create_module(device, &label, wrapped.source, ShaderStage::Fragment);
        let pipeline = self.layouts.create_pipeline(
            device,
            kind,
            &label,
            &module,
            self.context.surface_format,
        );
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(CompileError::new(kind, err.to_string()));
        }

        self.next_id += 1;
        Ok(WgpuProgram {
            id: self.next_id,
            kind,
            pipeline,
        })
    }

    fn release_program(&mut self, program: WgpuProgram) {
        if self.bound.as_ref().is_some_and(|bound| bound.id == program.id) {
            self.bound = None;
        }
    }

    fn use_program(&mut self, program: &WgpuProgram) {
        self.bound = Some(program.clone());
    }

    fn upload_uniforms(&mut self, block: &UniformBlock) {
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(block));
    }

    fn upload_texture(&mut self, image: &RgbaImage) -> Result<(), BackendError> {
        let (width, height) = image.dimensions();
        let max = self.context.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(BackendError::Upload {
                what: "texture",
                message: format!("{width}x{height} is outside 1..={max}"),
            });
        }
        // Effects sample with a bottom-left texture origin.
        let flipped = flip_vertical(image);
        self.texture = create_base_texture(
            &self.context.device,
            &self.context.queue,
            width,
            height,
            flipped.as_raw(),
        );
        self.bind_group = create_bind_group(
            &self.context.device,
            &self.layouts,
            &self.uniform_buffer,
            &self.transform_buffer,
            &self.texture.view,
            &self.sampler,
        );
        tracing::debug!(width, height, "uploaded base texture");
        Ok(())
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<(), BackendError> {
        let device = &self.context.device;
        self.meshes = mesh
            .submeshes
            .iter()
            .filter(|submesh| !submesh.indices.is_empty())
            .map(|submesh| -> Result<GpuSubmesh, BackendError> {
                let index_count = u32::try_from(submesh.indices.len()).map_err(|_| {
                    BackendError::Upload {
                        what: "mesh",
                        message: format!("{} indices exceed u32", submesh.indices.len()),
                    }
                })?;
                Ok(GpuSubmesh {
                    vertices: device.create_buffer_init(&BufferInitDescriptor {
                        label: Some("mesh vertices"),
                        contents: bytemuck::cast_slice(&submesh.vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    indices: device.create_buffer_init(&BufferInitDescriptor {
                        label: Some("mesh indices"),
                        contents: bytemuck::cast_slice(&submesh.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count,
                })
            })
            .collect::<Result<_, _>>()?;
        tracing::debug!(submeshes = self.meshes.len(), "uploaded mesh");
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> (u32, u32) {
        let applied = self.context.resize(width, height);
        if width > 0 && height > 0 && applied != (width, height) {
            tracing::debug!(width, height, ?applied, "surface size clamped");
        }
        applied
    }

    fn max_dimension(&self) -> u32 {
        self.context.max_dimension()
    }

    fn render(
        &mut self,
        draw: DrawCall,
        capture: bool,
    ) -> Result<Option<Framebuffer>, BackendError> {
        if let DrawCall::Mesh { transforms } = &draw {
            self.context
                .queue
                .write_buffer(&self.transform_buffer, 0, bytemuck::bytes_of(transforms));
        }

        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                let err = map_surface_error(err);
                if matches!(err, BackendError::SurfaceLost) {
                    self.context.reconfigure();
                }
                return Err(err);
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let depth = match draw {
            DrawCall::Mesh { .. } => Some(self.depth_view()),
            DrawCall::Quad { .. } => None,
        };
        if capture {
            self.ensure_capture_target();
        }

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });
        self.encode_pass(&mut encoder, &view, depth.as_ref(), &draw);
        if let Some(target) = self.capture.as_ref().filter(|_| capture) {
            self.encode_pass(&mut encoder, &target.view, depth.as_ref(), &draw);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        tracing::trace!(?draw, "presented frame");

        if !capture {
            return Ok(None);
        }
        let target = self
            .capture
            .as_ref()
            .ok_or_else(|| BackendError::Readback("capture target missing".to_string()))?;
        read_target(
            &self.context.device,
            &self.context.queue,
            target,
            self.context.surface_format,
        )
        .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_uses_top_down_origin() {
        let display = DisplayGeometry::fit(800, 400, 1920, 1080);
        assert_eq!(
            viewport(&display, (1920, 1080)),
            Some((0.0, 60.0, 1920.0, 960.0))
        );
    }

    #[test]
    fn viewport_is_clipped_to_surface() {
        let display = DisplayGeometry::full_canvas(1920, 1080);
        assert_eq!(
            viewport(&display, (1280, 720)),
            Some((0.0, 0.0, 1280.0, 720.0))
        );
        assert_eq!(viewport(&DisplayGeometry::fit(0, 0, 10, 10), (10, 10)), None);
    }

    #[test]
    fn texture_is_rebound_before_each_submesh() {
        let steps: Vec<_> = mesh_steps(3).collect();
        assert_eq!(
            steps,
            vec![
                MeshStep::BindTexture,
                MeshStep::Draw(0),
                MeshStep::BindTexture,
                MeshStep::Draw(1),
                MeshStep::BindTexture,
                MeshStep::Draw(2),
            ]
        );
        assert_eq!(mesh_steps(0).count(), 0);
    }
}
