//! Platform-neutral input events and the small amount of state needed to
//! interpret them: held camera keys and touch double-tap detection.
use std::time::{Duration, Instant};

pub const DOUBLE_TAP_MIN: Duration = Duration::from_millis(80);
pub const DOUBLE_TAP_MAX: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Up,
    Down,
    Space,
    Backspace,
    Home,
    Escape,
    Plus,
    Minus,
    Character(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
}

/// Pointer positions are canvas pixels with a top-left origin, as windowing
/// systems report them. The viewer flips them into the bottom-left frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    Resized { width: u32, height: u32 },
    CursorMoved { x: f32, y: f32 },
    MouseButton { pressed: bool },
    Touch { phase: TouchPhase, x: f32, y: f32, at: Instant },
    Key { key: ViewerKey, pressed: bool },
    CloseRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Continue,
    Exit,
}

/// Camera keys currently held down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub yaw_left: bool,
    pub yaw_right: bool,
    pub pitch_up: bool,
    pub pitch_down: bool,
    pub dolly_in: bool,
    pub dolly_out: bool,
}

impl HeldKeys {
    /// Returns `true` when `key` is a camera key.
    pub fn apply(&mut self, key: ViewerKey, pressed: bool) -> bool {
        let slot = match key {
            ViewerKey::Character(c) => match c.to_ascii_lowercase() {
                'w' => &mut self.pitch_up,
                's' => &mut self.pitch_down,
                'a' => &mut self.yaw_left,
                'd' => &mut self.yaw_right,
                '+' | '=' => &mut self.dolly_in,
                '-' | '_' => &mut self.dolly_out,
                _ => return false,
            },
            ViewerKey::Plus => &mut self.dolly_in,
            ViewerKey::Minus => &mut self.dolly_out,
            _ => return false,
        };
        *slot = pressed;
        true
    }
}

/// Two touches 80..=400 ms apart count as a double tap. Taps closer than the
/// minimum are ignored; a first tap older than the maximum is replaced.
#[derive(Debug, Clone, Default)]
pub struct DoubleTap {
    first: Option<Instant>,
}

impl DoubleTap {
    pub fn register(&mut self, at: Instant) -> bool {
        let Some(first) = self.first else {
            self.first = Some(at);
            return false;
        };
        let elapsed = at.saturating_duration_since(first);
        if (DOUBLE_TAP_MIN..=DOUBLE_TAP_MAX).contains(&elapsed) {
            self.first = None;
            true
        } else {
            if elapsed > DOUBLE_TAP_MAX {
                self.first = Some(at);
            }
            false
        }
    }

    /// Drops a pending first tap once it can no longer pair.
    pub fn expire(&mut self, now: Instant) {
        if let Some(first) = self.first {
            if now.saturating_duration_since(first) > DOUBLE_TAP_MAX {
                self.first = None;
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.first.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_tap_window() {
        let start = Instant::now();
        let mut taps = DoubleTap::default();
        assert!(!taps.register(start));
        assert!(taps.register(start + Duration::from_millis(200)));
        assert!(!taps.is_pending());
    }

    #[test]
    fn too_fast_second_tap_is_ignored() {
        let start = Instant::now();
        let mut taps = DoubleTap::default();
        taps.register(start);
        assert!(!taps.register(start + Duration::from_millis(30)));
        // The original first tap still pairs.
        assert!(taps.register(start + Duration::from_millis(120)));
    }

    #[test]
    fn stale_first_tap_is_replaced_and_expires() {
        let start = Instant::now();
        let mut taps = DoubleTap::default();
        taps.register(start);
        assert!(!taps.register(start + Duration::from_millis(900)));
        assert!(taps.register(start + Duration::from_millis(1_000)));

        taps.register(start + Duration::from_millis(2_000));
        taps.expire(start + Duration::from_millis(2_500));
        assert!(!taps.is_pending());
    }

    #[test]
    fn camera_keys_toggle() {
        let mut keys = HeldKeys::default();
        assert!(keys.apply(ViewerKey::Character('W'), true));
        assert!(keys.pitch_up);
        assert!(keys.apply(ViewerKey::Minus, true));
        assert!(keys.dolly_out);
        assert!(keys.apply(ViewerKey::Character('w'), false));
        assert!(!keys.pitch_up);
        assert!(!keys.apply(ViewerKey::Space, true));
    }
}
