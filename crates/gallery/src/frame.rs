use std::time::Instant;

use crate::backend::{BackendError, DrawCall, Framebuffer, GpuBackend};
use crate::camera::OrbitCamera;
use crate::input::HeldKeys;
use crate::layout::DisplayGeometry;
use crate::uniforms::{UniformBlock, UniformState};

/// Source of per-frame delta time.
pub trait FrameClock {
    /// Forgets the previous sample so the next delta is zero.
    fn reset(&mut self);
    /// Seconds since the previous call.
    fn delta(&mut self) -> f32;
}

/// Delta time from the monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock {
    last: Option<Instant>,
}

impl FrameClock for SystemClock {
    fn reset(&mut self) {
        self.last = None;
    }

    fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = self
            .last
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        delta
    }
}

/// Fixed step, for deterministic playback.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub step: f32,
}

impl FrameClock for FixedClock {
    fn reset(&mut self) {}

    fn delta(&mut self) -> f32 {
        self.step
    }
}

pub type BoxedFrameClock = Box<dyn FrameClock + Send>;

/// Advances time-derived state and issues the draw for the active program.
/// It reads the gallery's selection but never changes it.
pub struct FrameDriver {
    clock: BoxedFrameClock,
    camera: OrbitCamera,
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("camera", &self.camera)
            .finish_non_exhaustive()
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(Box::new(SystemClock::default()))
    }
}

impl FrameDriver {
    pub fn new(clock: BoxedFrameClock) -> Self {
        Self {
            clock,
            camera: OrbitCamera::default(),
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }

    /// Samples the clock, advances uniforms and steers the camera. Returns the
    /// delta in seconds.
    pub fn advance(&mut self, uniforms: &mut UniformState, keys: &HeldKeys) -> f32 {
        let dt = self.clock.delta();
        uniforms.advance(dt);
        self.camera.update(keys, dt);
        dt
    }

    /// Binds `program`, pushes `block` and draws either the letterboxed quad
    /// or the mesh through the orbit camera.
    pub fn draw<B: GpuBackend>(
        &self,
        backend: &mut B,
        program: &B::Program,
        block: &UniformBlock,
        geometry: &DisplayGeometry,
        is_3d: bool,
        capture: bool,
    ) -> Result<Option<Framebuffer>, BackendError> {
        backend.use_program(program);
        backend.upload_uniforms(block);
        let draw = if is_3d {
            let aspect = geometry.canvas_w.max(1) as f32 / geometry.canvas_h.max(1) as f32;
            DrawCall::Mesh {
                transforms: self.camera.transforms(aspect),
            }
        } else {
            DrawCall::Quad {
                display: *geometry,
            }
        };
        backend.render(draw, capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use crate::PipelineKind;

    #[test]
    fn advance_uses_clock_delta() {
        let mut driver = FrameDriver::new(Box::new(FixedClock { step: 0.5 }));
        let mut uniforms = UniformState::default();
        let dt = driver.advance(&mut uniforms, &HeldKeys::default());
        assert_eq!(dt, 0.5);
        assert!((uniforms.time() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn system_clock_first_delta_is_zero() {
        let mut clock = SystemClock::default();
        assert_eq!(clock.delta(), 0.0);
        assert!(clock.delta() >= 0.0);
    }

    #[test]
    fn draw_selects_path_by_mode() {
        let mut backend = MockBackend::default();
        let program = backend
            .build_program(PipelineKind::Quad2d, "A", "void main() {}")
            .unwrap();
        let driver = FrameDriver::new(Box::new(FixedClock { step: 0.0 }));
        let block = bytemuck::Zeroable::zeroed();
        let geometry = DisplayGeometry::fit(2, 1, 100, 100);

        driver
            .draw(&mut backend, &program, &block, &geometry, false, false)
            .unwrap();
        driver
            .draw(&mut backend, &program, &block, &geometry, true, false)
            .unwrap();

        assert!(matches!(backend.draws[0], DrawCall::Quad { display } if display == geometry));
        assert!(matches!(backend.draws[1], DrawCall::Mesh { .. }));
        assert_eq!(backend.uniforms.len(), 2);
        assert_eq!(backend.bound_name(), Some("A"));
    }
}
