//! Per-effect tunables and the std140 block streamed to every program.
//!
//! Types:
//!
//! - `Tunable` names each clamped scalar so binding layers can get/set by key.
//! - `UniformState` owns the animation clock, mouse state, color grading and
//!   the values derived from the clock every frame.
//! - `UniformBlock` is the GPU-facing mirror of the `EffectParams` block the
//!   renderer injects ahead of every fragment shader.
use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use bytemuck::{Pod, Zeroable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tunable {
    Speed,
    Amplitude,
    Frequency,
    Brightness,
    Contrast,
    Saturation,
    HueShift,
    Zoom,
    Rotation,
    Quality,
}

impl Tunable {
    pub const ALL: [Tunable; 10] = [
        Tunable::Speed,
        Tunable::Amplitude,
        Tunable::Frequency,
        Tunable::Brightness,
        Tunable::Contrast,
        Tunable::Saturation,
        Tunable::HueShift,
        Tunable::Zoom,
        Tunable::Rotation,
        Tunable::Quality,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tunable::Speed => "speed",
            Tunable::Amplitude => "amplitude",
            Tunable::Frequency => "frequency",
            Tunable::Brightness => "brightness",
            Tunable::Contrast => "contrast",
            Tunable::Saturation => "saturation",
            Tunable::HueShift => "hue",
            Tunable::Zoom => "zoom",
            Tunable::Rotation => "rotation",
            Tunable::Quality => "quality",
        }
    }

    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Tunable::Speed | Tunable::Amplitude | Tunable::Frequency => 0.0..=10.0,
            Tunable::Brightness | Tunable::Contrast | Tunable::Saturation => 0.0..=3.0,
            Tunable::HueShift | Tunable::Rotation => -TAU..=TAU,
            Tunable::Zoom => 0.1..=10.0,
            Tunable::Quality => 0.1..=4.0,
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            Tunable::HueShift | Tunable::Rotation => 0.0,
            _ => 1.0,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        let normalized = match normalized.as_str() {
            "hue_shift" | "hueshift" => "hue",
            other => other,
        };
        Tunable::ALL.into_iter().find(|t| t.name() == normalized)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformState {
    time: f32,
    time_delta: f32,
    frame: u64,
    mouse: [f32; 4],
    prev_mouse: [f32; 2],
    mouse_velocity: [f32; 2],
    values: [f32; Tunable::ALL.len()],
    camera_pos: [f32; 3],
    debug: bool,
    beat: f32,
    audio_level: f32,
    seconds: f32,
    minutes: f32,
    hours: f32,
}

impl Default for UniformState {
    fn default() -> Self {
        let mut state = Self {
            time: 0.0,
            time_delta: 0.0,
            frame: 0,
            mouse: [0.0; 4],
            prev_mouse: [0.0; 2],
            mouse_velocity: [0.0; 2],
            values: Tunable::ALL.map(Tunable::default_value),
            camera_pos: [0.0, 0.0, 1.0],
            debug: false,
            beat: 0.0,
            audio_level: 0.0,
            seconds: 0.0,
            minutes: 0.0,
            hours: 0.0,
        };
        state.derive();
        state
    }
}

impl UniformState {
    pub fn get(&self, tunable: Tunable) -> f32 {
        self.values[tunable as usize]
    }

    /// Clamps into the tunable's range. Non-finite input is ignored and
    /// `false` is returned.
    pub fn set(&mut self, tunable: Tunable, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        let range = tunable.range();
        self.values[tunable as usize] = value.clamp(*range.start(), *range.end());
        true
    }

    pub fn speed(&self) -> f32 {
        self.get(Tunable::Speed)
    }

    pub fn set_speed(&mut self, value: f32) -> bool {
        self.set(Tunable::Speed, value)
    }

    pub fn amplitude(&self) -> f32 {
        self.get(Tunable::Amplitude)
    }

    pub fn set_amplitude(&mut self, value: f32) -> bool {
        self.set(Tunable::Amplitude, value)
    }

    pub fn frequency(&self) -> f32 {
        self.get(Tunable::Frequency)
    }

    pub fn set_frequency(&mut self, value: f32) -> bool {
        self.set(Tunable::Frequency, value)
    }

    pub fn brightness(&self) -> f32 {
        self.get(Tunable::Brightness)
    }

    pub fn set_brightness(&mut self, value: f32) -> bool {
        self.set(Tunable::Brightness, value)
    }

    pub fn contrast(&self) -> f32 {
        self.get(Tunable::Contrast)
    }

    pub fn set_contrast(&mut self, value: f32) -> bool {
        self.set(Tunable::Contrast, value)
    }

    pub fn saturation(&self) -> f32 {
        self.get(Tunable::Saturation)
    }

    pub fn set_saturation(&mut self, value: f32) -> bool {
        self.set(Tunable::Saturation, value)
    }

    pub fn hue_shift(&self) -> f32 {
        self.get(Tunable::HueShift)
    }

    pub fn set_hue_shift(&mut self, value: f32) -> bool {
        self.set(Tunable::HueShift, value)
    }

    pub fn zoom(&self) -> f32 {
        self.get(Tunable::Zoom)
    }

    pub fn set_zoom(&mut self, value: f32) -> bool {
        self.set(Tunable::Zoom, value)
    }

    pub fn rotation(&self) -> f32 {
        self.get(Tunable::Rotation)
    }

    pub fn set_rotation(&mut self, value: f32) -> bool {
        self.set(Tunable::Rotation, value)
    }

    pub fn quality(&self) -> f32 {
        self.get(Tunable::Quality)
    }

    pub fn set_quality(&mut self, value: f32) -> bool {
        self.set(Tunable::Quality, value)
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    pub fn camera_pos(&self) -> [f32; 3] {
        self.camera_pos
    }

    pub fn set_camera_pos(&mut self, pos: [f32; 3]) {
        if pos.iter().all(|c| c.is_finite()) {
            self.camera_pos = pos;
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn time_delta(&self) -> f32 {
        self.time_delta
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn beat(&self) -> f32 {
        self.beat
    }

    pub fn audio_level(&self) -> f32 {
        self.audio_level
    }

    /// `(seconds, minutes, hours)` decomposed from the animation clock.
    pub fn clock(&self) -> (f32, f32, f32) {
        (self.seconds, self.minutes, self.hours)
    }

    /// Canvas-space mouse, bottom-left origin: `(x, y, active, click)`.
    pub fn mouse(&self) -> [f32; 4] {
        self.mouse
    }

    pub fn mouse_velocity(&self) -> [f32; 2] {
        self.mouse_velocity
    }

    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        if x.is_finite() && y.is_finite() {
            self.mouse[0] = x;
            self.mouse[1] = y;
        }
    }

    pub fn set_mouse_pressed(&mut self, pressed: bool) {
        let flag = if pressed { 1.0 } else { 0.0 };
        self.mouse[2] = flag;
        self.mouse[3] = flag;
    }

    pub fn mouse_pressed(&self) -> bool {
        self.mouse[2] > 0.5
    }

    /// Zeroes the animation clock. Every other field is left alone.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.derive();
    }

    /// Advances the clock by `dt` scaled by speed and refreshes every derived
    /// value, including mouse velocity since the previous frame.
    pub fn advance(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.time_delta = dt;
        self.time += dt * self.speed();
        self.frame = self.frame.saturating_add(1);
        self.mouse_velocity = [
            self.mouse[0] - self.prev_mouse[0],
            self.mouse[1] - self.prev_mouse[1],
        ];
        self.prev_mouse = [self.mouse[0], self.mouse[1]];
        self.derive();
    }

    fn derive(&mut self) {
        let t = self.time;
        self.beat = 0.5 + 0.5 * (t * TAU).sin();
        self.audio_level = 0.3 + 0.7 * (0.5 + 0.5 * (t * 0.5).sin());
        self.seconds = t.rem_euclid(60.0);
        self.minutes = (t / 60.0).rem_euclid(60.0);
        self.hours = (t / 3600.0).rem_euclid(24.0);
    }
}

/// The region a program renders into: its size and where it sits on the
/// canvas (bottom-left origin). Mouse coordinates are made relative to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFrame {
    pub origin: [f32; 2],
    pub size: [f32; 2],
}

/// Must match the `EffectParams` block emitted by the renderer's GLSL wrapper.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformBlock {
    pub mouse: [f32; 4],
    pub resolution: [f32; 2],
    pub mouse_normalized: [f32; 2],
    pub mouse_velocity: [f32; 2],
    pub time_f: f32,
    pub time_delta: f32,
    pub camera_pos: [f32; 3],
    pub frame: f32,
    pub time: f32,
    pub seconds: f32,
    pub minutes: f32,
    pub hours: f32,
    pub mouse_active: f32,
    pub mouse_click: f32,
    pub aspect_ratio: f32,
    pub speed: f32,
    pub frequency: f32,
    pub amplitude: f32,
    pub hue_shift: f32,
    pub saturation: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub zoom: f32,
    pub rotation: f32,
    pub beat: f32,
    pub audio_level: f32,
    pub debug_mode: f32,
    pub quality: f32,
    pub alpha: f32,
    pub amp: f32,
    pub uamp: f32,
    pub _padding: f32,
}

unsafe impl Zeroable for UniformBlock {}
unsafe impl Pod for UniformBlock {}

impl UniformBlock {
    pub fn from_state(state: &UniformState, view: ViewFrame) -> Self {
        let [w, h] = [view.size[0].max(1.0), view.size[1].max(1.0)];
        let mouse_x = state.mouse[0] - view.origin[0];
        let mouse_y = state.mouse[1] - view.origin[1];
        let click = if state.mouse_pressed() { 1.0 } else { 0.0 };
        let (seconds, minutes, hours) = state.clock();
        Self {
            mouse: [mouse_x, mouse_y, state.mouse[2], state.mouse[3]],
            resolution: [w, h],
            mouse_normalized: [mouse_x / w, 1.0 - mouse_y / h],
            mouse_velocity: state.mouse_velocity,
            time_f: state.time,
            time_delta: state.time_delta,
            camera_pos: state.camera_pos,
            frame: state.frame as f32,
            time: state.time,
            seconds,
            minutes,
            hours,
            mouse_active: click,
            mouse_click: click,
            aspect_ratio: w / h,
            speed: state.speed(),
            frequency: state.frequency(),
            amplitude: state.amplitude(),
            hue_shift: state.hue_shift(),
            saturation: state.saturation(),
            brightness: state.brightness(),
            contrast: state.contrast(),
            zoom: state.zoom(),
            rotation: state.rotation(),
            beat: state.beat,
            audio_level: state.audio_level,
            debug_mode: if state.debug { 1.0 } else { 0.0 },
            quality: state.quality(),
            alpha: 1.0,
            amp: 0.5,
            uamp: 0.5,
            _padding: 0.0,
        }
    }
}
