//! Offscreen capture target and synchronous texture readback.
use std::sync::mpsc;

use gallery::{BackendError, Framebuffer, RowOrder};

/// Color target used for frames that must be read back. Surface textures are
/// not guaranteed to support `COPY_SRC`, so captures render here as well.
pub(crate) struct CaptureTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl CaptureTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("capture target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

pub(crate) fn align_to(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

/// Byte order of an 8-bit, four-channel format, or `None` when the readback
/// path cannot convert it.
pub(crate) fn channel_order(format: wgpu::TextureFormat) -> Option<ChannelOrder> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => {
            Some(ChannelOrder::Rgba)
        }
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => {
            Some(ChannelOrder::Bgra)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelOrder {
    Rgba,
    Bgra,
}

/// Copies `target` into a mappable buffer and returns tightly packed RGBA rows,
/// top row first.
pub(crate) fn read_target(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    target: &CaptureTarget,
    format: wgpu::TextureFormat,
) -> Result<Framebuffer, BackendError> {
    let order = channel_order(format).ok_or_else(|| {
        BackendError::Readback(format!("unsupported surface format {format:?}"))
    })?;
    let unpadded_bytes_per_row = target.width * 4;
    let padded_bytes_per_row = align_to(unpadded_bytes_per_row, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("capture readback"),
        size: u64::from(padded_bytes_per_row) * u64::from(target.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("capture copy"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &target.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(target.height),
            },
        },
        wgpu::Extent3d {
            width: target.width,
            height: target.height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device
        .poll(wgpu::PollType::Wait)
        .map_err(|err| BackendError::Readback(format!("device poll failed: {err}")))?;
    receiver
        .recv()
        .map_err(|_| BackendError::Readback("map callback never ran".to_string()))?
        .map_err(|err| BackendError::Readback(format!("buffer mapping failed: {err}")))?;

    let mapped = slice.get_mapped_range();
    let pixels = unpad_rows(
        &mapped,
        padded_bytes_per_row as usize,
        unpadded_bytes_per_row as usize,
        target.height as usize,
        order,
    );
    drop(mapped);
    buffer.unmap();

    Ok(Framebuffer {
        width: target.width,
        height: target.height,
        pixels,
        row_order: RowOrder::TopDown,
    })
}

pub(crate) fn unpad_rows(
    padded: &[u8],
    padded_bytes_per_row: usize,
    unpadded_bytes_per_row: usize,
    height: usize,
    order: ChannelOrder,
) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(unpadded_bytes_per_row * height);
    for row in padded.chunks(padded_bytes_per_row).take(height) {
        pixels.extend_from_slice(&row[..unpadded_bytes_per_row]);
    }
    if order == ChannelOrder::Bgra {
        for pixel in pixels.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_aligned_for_copies() {
        assert_eq!(align_to(4, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(1920 * 4, 256), 7680);
        assert_eq!(align_to(1000 * 4, 256), 4096);
    }

    #[test]
    fn unpad_strips_padding_and_swizzles() {
        let padded = [
            1, 2, 3, 4, 0, 0, 0, 0, //
            5, 6, 7, 8, 0, 0, 0, 0,
        ];
        assert_eq!(
            unpad_rows(&padded, 8, 4, 2, ChannelOrder::Rgba),
            vec![1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert_eq!(
            unpad_rows(&padded, 8, 4, 2, ChannelOrder::Bgra),
            vec![3, 2, 1, 4, 7, 6, 5, 8]
        );
    }

    #[test]
    fn only_eight_bit_formats_read_back() {
        assert_eq!(
            channel_order(wgpu::TextureFormat::Bgra8Unorm),
            Some(ChannelOrder::Bgra)
        );
        assert_eq!(channel_order(wgpu::TextureFormat::Rgb10a2Unorm), None);
    }
}
