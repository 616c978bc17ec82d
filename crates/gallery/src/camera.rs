use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

use crate::input::HeldKeys;
use crate::mesh::MeshTransforms;

const TURN_RATE: f32 = 1.5;
const DOLLY_RATE: f32 = 2.0;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 20.0;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Orbit camera around the mesh origin, steered from held keys each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_y: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 2.5,
            fov_y: 45f32.to_radians(),
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        Vec3::new(
            self.distance * self.pitch.cos() * self.yaw.sin(),
            self.distance * self.pitch.sin(),
            self.distance * self.pitch.cos() * self.yaw.cos(),
        )
    }

    /// W/S pitch, A/D yaw and `+`/`-` dolly, scaled by `dt` seconds.
    pub fn update(&mut self, keys: &HeldKeys, dt: f32) {
        let axis = |positive: bool, negative: bool| -> f32 {
            f32::from(u8::from(positive)) - f32::from(u8::from(negative))
        };
        self.yaw += axis(keys.yaw_right, keys.yaw_left) * TURN_RATE * dt;
        self.pitch = (self.pitch + axis(keys.pitch_up, keys.pitch_down) * TURN_RATE * dt)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.distance = (self.distance - axis(keys.dolly_in, keys.dolly_out) * DOLLY_RATE * dt)
            .clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), 0.1, 100.0)
    }

    pub fn transforms(&self, aspect: f32) -> MeshTransforms {
        MeshTransforms {
            model_view: self.view_matrix().to_cols_array_2d(),
            projection: self.projection_matrix(aspect).to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_is_clamped() {
        let mut camera = OrbitCamera::default();
        let keys = HeldKeys {
            pitch_up: true,
            ..HeldKeys::default()
        };
        camera.update(&keys, 100.0);
        assert!((camera.pitch - PITCH_LIMIT).abs() < 1e-6);
    }

    #[test]
    fn dolly_moves_toward_origin_within_limits() {
        let mut camera = OrbitCamera::default();
        let keys = HeldKeys {
            dolly_in: true,
            ..HeldKeys::default()
        };
        camera.update(&keys, 0.25);
        assert!((camera.distance - 2.0).abs() < 1e-6);
        camera.update(&keys, 100.0);
        assert_eq!(camera.distance, MIN_DISTANCE);
    }

    #[test]
    fn default_eye_looks_down_negative_z() {
        let camera = OrbitCamera::default();
        let eye = camera.eye();
        assert!((eye - Vec3::new(0.0, 0.0, 2.5)).length() < 1e-6);
        let origin_in_view = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!((origin_in_view.z + 2.5).abs() < 1e-5);
    }
}
