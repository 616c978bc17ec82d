use crate::uniforms::ViewFrame;

/// Letterboxed or pillarboxed placement of the base image on the canvas.
///
/// Coordinates use a bottom-left origin, matching the mouse and the shader's
/// view of the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayGeometry {
    pub canvas_w: u32,
    pub canvas_h: u32,
    pub display_x: u32,
    pub display_y: u32,
    pub display_w: u32,
    pub display_h: u32,
}

impl DisplayGeometry {
    /// Fits a `tex_w` x `tex_h` image into the canvas, preserving aspect.
    ///
    /// A wider image than the canvas fills the width and is centered
    /// vertically; anything else fills the height and is centered
    /// horizontally. Zero-sized inputs produce an empty display rectangle.
    pub fn fit(tex_w: u32, tex_h: u32, canvas_w: u32, canvas_h: u32) -> Self {
        let mut geometry = Self {
            canvas_w,
            canvas_h,
            ..Self::default()
        };
        if tex_w == 0 || tex_h == 0 || canvas_w == 0 || canvas_h == 0 {
            return geometry;
        }

        let image_aspect = f64::from(tex_w) / f64::from(tex_h);
        let canvas_aspect = f64::from(canvas_w) / f64::from(canvas_h);
        if image_aspect > canvas_aspect {
            let display_h = ((f64::from(canvas_w) / image_aspect).round() as u32).min(canvas_h);
            geometry.display_w = canvas_w;
            geometry.display_h = display_h;
            geometry.display_y = (canvas_h - display_h) / 2;
        } else {
            let display_w = ((f64::from(canvas_h) * image_aspect).round() as u32).min(canvas_w);
            geometry.display_w = display_w;
            geometry.display_h = canvas_h;
            geometry.display_x = (canvas_w - display_w) / 2;
        }
        geometry
    }

    /// The whole canvas, used by the mesh path where nothing is letterboxed.
    pub fn full_canvas(canvas_w: u32, canvas_h: u32) -> Self {
        Self {
            canvas_w,
            canvas_h,
            display_x: 0,
            display_y: 0,
            display_w: canvas_w,
            display_h: canvas_h,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.display_w == 0 || self.display_h == 0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        let (left, bottom) = (self.display_x as f32, self.display_y as f32);
        x >= left
            && y >= bottom
            && x < left + self.display_w as f32
            && y < bottom + self.display_h as f32
    }

    /// Offsets a canvas point into the display-local frame.
    pub fn to_local(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.display_x as f32, y - self.display_y as f32)
    }

    /// Top edge of the display rectangle measured from the top of the canvas,
    /// as GPU viewports and top-down readbacks expect.
    pub fn top_down_y(&self) -> u32 {
        self.canvas_h
            .saturating_sub(self.display_y.saturating_add(self.display_h))
    }

    pub fn view_frame(&self) -> ViewFrame {
        ViewFrame {
            origin: [self.display_x as f32, self.display_y as f32],
            size: [self.display_w as f32, self.display_h as f32],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_letterboxed() {
        let geometry = DisplayGeometry::fit(800, 400, 1920, 1080);
        assert_eq!(geometry.display_w, 1920);
        assert_eq!(geometry.display_h, 960);
        assert_eq!(geometry.display_x, 0);
        assert_eq!(geometry.display_y, 60);
    }

    #[test]
    fn tall_image_is_pillarboxed() {
        let geometry = DisplayGeometry::fit(400, 800, 1920, 1080);
        assert_eq!(geometry.display_h, 1080);
        assert_eq!(geometry.display_w, 540);
        assert_eq!(geometry.display_x, 690);
        assert_eq!(geometry.display_y, 0);
    }

    #[test]
    fn equal_aspect_fills_canvas() {
        let geometry = DisplayGeometry::fit(960, 720, 1920, 1440);
        assert_eq!(geometry, DisplayGeometry::full_canvas(1920, 1440));
    }

    #[test]
    fn fit_is_idempotent() {
        let first = DisplayGeometry::fit(1234, 567, 1000, 999);
        let second = DisplayGeometry::fit(1234, 567, 1000, 999);
        assert_eq!(first, second);
        assert!(first.display_w <= first.canvas_w);
        assert!(first.display_h <= first.canvas_h);
    }

    #[test]
    fn zero_inputs_produce_empty_rect() {
        assert!(DisplayGeometry::fit(0, 10, 100, 100).is_empty());
        assert!(DisplayGeometry::fit(10, 10, 0, 100).is_empty());
    }

    #[test]
    fn local_coordinates_offset_by_origin() {
        let geometry = DisplayGeometry::fit(800, 400, 1920, 1080);
        assert_eq!(geometry.to_local(100.0, 100.0), (100.0, 40.0));
        assert!(geometry.contains(10.0, 61.0));
        assert!(!geometry.contains(10.0, 10.0));
        assert_eq!(geometry.top_down_y(), 60);
    }
}
