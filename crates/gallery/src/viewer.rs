//! The application context.
//!
//! `Viewer` owns every engine component and the backend, and is the only
//! object a platform shell talks to. It implements [`Drawable`] for the
//! redraw path and [`EventSink`] for input, and exposes the control surface
//! used by scripting or settings layers.
use std::path::PathBuf;
use std::time::Instant;

use catalog::Catalog;
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, GpuBackend};
use crate::capture::{CaptureError, CaptureService, ImageSink};
use crate::error::GalleryError;
use crate::frame::{BoxedFrameClock, FrameDriver, SystemClock};
use crate::gallery::Gallery;
use crate::input::{DoubleTap, EventOutcome, HeldKeys, TouchPhase, ViewerEvent, ViewerKey};
use crate::layout::DisplayGeometry;
use crate::loader::{LoadProgress, LoadScheduler, LoadState, LoadStrategy};
use crate::mesh::MeshData;
use crate::uniforms::{UniformBlock, UniformState};

pub trait Drawable {
    fn draw_frame(&mut self) -> Result<(), BackendError>;
}

pub trait EventSink {
    fn handle_event(&mut self, event: ViewerEvent) -> EventOutcome;
}

#[derive(Debug, Clone)]
pub enum TextureSource {
    File(PathBuf),
    Pixels(RgbaImage),
}

/// What the effects are applied to. A mesh switches the gallery to the 3D
/// programs for the whole session.
#[derive(Debug, Clone)]
pub struct BaseAsset {
    pub texture: TextureSource,
    pub mesh: Option<MeshData>,
}

impl BaseAsset {
    pub fn image_file(path: impl Into<PathBuf>) -> Self {
        Self {
            texture: TextureSource::File(path.into()),
            mesh: None,
        }
    }

    pub fn is_3d(&self) -> bool {
        self.mesh.is_some()
    }
}

pub struct ViewerOptions {
    pub canvas: (u32, u32),
    pub strategy: LoadStrategy,
    pub sink: Box<dyn ImageSink>,
    pub clock: BoxedFrameClock,
}

impl ViewerOptions {
    pub fn new(canvas: (u32, u32), sink: Box<dyn ImageSink>) -> Self {
        Self {
            canvas,
            strategy: LoadStrategy::Incremental,
            sink,
            clock: Box::new(SystemClock::default()),
        }
    }
}

pub struct Viewer<B: GpuBackend> {
    backend: B,
    gallery: Gallery<B::Program>,
    loader: LoadScheduler,
    strategy: LoadStrategy,
    asset: Option<BaseAsset>,
    uniforms: UniformState,
    geometry: DisplayGeometry,
    texture_size: (u32, u32),
    driver: FrameDriver,
    keys: HeldKeys,
    taps: DoubleTap,
    capture: CaptureService,
    sink: Box<dyn ImageSink>,
}

impl<B: GpuBackend> Viewer<B> {
    pub fn new(backend: B, catalog: Catalog, asset: BaseAsset, options: ViewerOptions) -> Self {
        let (canvas_w, canvas_h) = options.canvas;
        let capture = CaptureService::new(backend.max_dimension());
        let mut viewer = Self {
            backend,
            gallery: Gallery::new(asset.is_3d()),
            loader: LoadScheduler::new(catalog),
            strategy: options.strategy,
            asset: Some(asset),
            uniforms: UniformState::default(),
            geometry: DisplayGeometry::full_canvas(canvas_w, canvas_h),
            texture_size: (0, 0),
            driver: FrameDriver::new(options.clock),
            keys: HeldKeys::default(),
            taps: DoubleTap::default(),
            capture,
            sink: options.sink,
        };
        let (canvas_w, canvas_h) = viewer.apply_canvas(canvas_w, canvas_h);
        viewer.geometry = DisplayGeometry::full_canvas(canvas_w, canvas_h);
        viewer
    }

    /// Hands a canvas size to the backend and returns the one to lay out
    /// against. Zero-sized canvases (minimised windows) stay zero so nothing
    /// is drawn, whatever the surface keeps.
    fn apply_canvas(&mut self, width: u32, height: u32) -> (u32, u32) {
        let applied = self.backend.resize(width, height);
        if width == 0 || height == 0 {
            (width, height)
        } else {
            applied
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn gallery(&self) -> &Gallery<B::Program> {
        &self.gallery
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    pub fn uniforms(&self) -> &UniformState {
        &self.uniforms
    }

    /// Changes land in the program on the next frame.
    pub fn uniforms_mut(&mut self) -> &mut UniformState {
        &mut self.uniforms
    }

    pub fn load_state(&self) -> LoadState {
        self.loader.state()
    }

    pub fn load_progress(&self) -> LoadProgress {
        self.loader.progress()
    }

    pub fn is_ready(&self) -> bool {
        self.loader.state() == LoadState::Ready
    }

    pub fn strategy(&self) -> LoadStrategy {
        self.strategy
    }

    /// Begins loading. The eager strategy finishes here; the incremental one
    /// expects [`Viewer::pump_loading`] once per event-loop turn.
    pub fn start(&mut self) -> Result<LoadState, GalleryError> {
        self.loader.start();
        match self.strategy {
            LoadStrategy::Eager => {
                self.loader
                    .run_to_completion(&mut self.backend, &mut self.gallery)?;
                self.finalize()
            }
            LoadStrategy::Incremental => Ok(self.loader.state()),
        }
    }

    /// Advances an incremental load by one entry, finalizing when the last
    /// entry has been attempted.
    pub fn pump_loading(&mut self) -> Result<LoadState, GalleryError> {
        match self.loader.step(&mut self.backend, &mut self.gallery)? {
            LoadState::Finalizing => self.finalize(),
            state => Ok(state),
        }
    }

    fn finalize(&mut self) -> Result<LoadState, GalleryError> {
        let result = self.install_base_asset();
        self.loader.finish(&result);
        result?;
        self.gallery.mark_loading_complete();
        let block = self.binding_block();
        self.gallery.switch_to(&mut self.backend, 0, &block);
        Ok(self.loader.state())
    }

    fn install_base_asset(&mut self) -> Result<(), GalleryError> {
        let Some(asset) = self.asset.take() else {
            return Ok(());
        };
        let image = match asset.texture {
            TextureSource::File(path) => image::open(&path)
                .map_err(|err| GalleryError::BaseImage(format!("{}: {err}", path.display())))?
                .to_rgba8(),
            TextureSource::Pixels(image) => image,
        };
        if let Some(mesh) = asset.mesh.as_ref() {
            if mesh.is_empty() {
                return Err(GalleryError::EmptyMesh);
            }
            self.backend.upload_mesh(mesh)?;
        }
        self.install_texture(&image)
    }

    fn install_texture(&mut self, image: &RgbaImage) -> Result<(), GalleryError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(GalleryError::EmptyImage);
        }
        self.backend.upload_texture(image)?;
        self.texture_size = image.dimensions();
        debug!(width = image.width(), height = image.height(), "base texture installed");
        self.recompute_geometry();
        Ok(())
    }

    fn recompute_geometry(&mut self) {
        let (canvas_w, canvas_h) = (self.geometry.canvas_w, self.geometry.canvas_h);
        self.geometry = if self.gallery.is_3d() {
            DisplayGeometry::full_canvas(canvas_w, canvas_h)
        } else {
            let (tex_w, tex_h) = self.texture_size;
            DisplayGeometry::fit(tex_w, tex_h, canvas_w, canvas_h)
        };
    }

    /// Uniform block in the display-local frame of the current draw path.
    fn binding_block(&self) -> UniformBlock {
        UniformBlock::from_state(&self.uniforms, self.geometry.view_frame())
    }

    pub fn effect_count(&self) -> usize {
        self.gallery.len()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.gallery.active_index()
    }

    pub fn active_name(&self) -> Option<&str> {
        self.gallery.active_name()
    }

    pub fn effect_names(&self) -> Vec<&str> {
        self.gallery.names()
    }

    pub fn switch_to(&mut self, index: usize) -> bool {
        if !self.gallery.loading_complete() {
            return false;
        }
        let block = self.binding_block();
        self.gallery.switch_to(&mut self.backend, index, &block)
    }

    pub fn next(&mut self) -> bool {
        if !self.gallery.loading_complete() {
            return false;
        }
        let block = self.binding_block();
        self.gallery.next(&mut self.backend, &block)
    }

    pub fn prev(&mut self) -> bool {
        if !self.gallery.loading_complete() {
            return false;
        }
        let block = self.binding_block();
        self.gallery.prev(&mut self.backend, &block)
    }

    pub fn reset_to_default(&mut self) -> bool {
        self.switch_to(0)
    }

    /// Builds `source` into the custom slot and selects it. Refused until
    /// loading has finished so the slot always sits after the catalog.
    pub fn compile_custom(&mut self, source: &str) -> Result<usize, GalleryError> {
        if !self.gallery.loading_complete() {
            return Err(GalleryError::NotReady);
        }
        let block = self.binding_block();
        Ok(self
            .gallery
            .compile_custom(&mut self.backend, source, &block)?)
    }

    pub fn reset_time(&mut self) {
        self.uniforms.reset();
        self.driver.reset_clock();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.geometry.canvas_w, self.geometry.canvas_h) {
            return;
        }
        let (width, height) = self.apply_canvas(width, height);
        self.geometry.canvas_w = width;
        self.geometry.canvas_h = height;
        self.recompute_geometry();
        debug!(width, height, geometry = ?self.geometry, "canvas resized");
    }

    pub fn save_image(&mut self, scale: u32) {
        self.capture.request(scale);
    }

    /// Swaps the base texture and rebinds the active effect against the new
    /// layout.
    pub fn load_new_image(&mut self, image: RgbaImage) -> Result<(), GalleryError> {
        self.install_texture(&image)?;
        info!(width = image.width(), height = image.height(), "loaded new image");
        if let Some(index) = self.gallery.active_index() {
            let block = self.binding_block();
            self.gallery.switch_to(&mut self.backend, index, &block);
        }
        Ok(())
    }

    /// Decodes PNG or JPEG bytes and installs them as the base texture.
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<(), GalleryError> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| GalleryError::BaseImage(err.to_string()))?
            .to_rgba8();
        self.load_new_image(image)
    }

    fn on_key(&mut self, key: ViewerKey, pressed: bool) -> EventOutcome {
        if self.keys.apply(key, pressed) || !pressed {
            return EventOutcome::Continue;
        }
        match key {
            ViewerKey::Down | ViewerKey::Space => {
                self.next();
            }
            ViewerKey::Up | ViewerKey::Backspace => {
                self.prev();
            }
            ViewerKey::Home => {
                self.reset_to_default();
            }
            ViewerKey::Escape => return EventOutcome::Exit,
            ViewerKey::Character(c) => match c.to_ascii_lowercase() {
                'p' => self.save_image(1),
                't' => self.reset_time(),
                _ => {}
            },
            ViewerKey::Plus | ViewerKey::Minus => {}
        }
        EventOutcome::Continue
    }

    fn flip_y(&self, y: f32) -> f32 {
        self.geometry.canvas_h as f32 - y
    }
}

impl<B: GpuBackend> Drawable for Viewer<B> {
    fn draw_frame(&mut self) -> Result<(), BackendError> {
        self.taps.expire(Instant::now());
        if !self.gallery.loading_complete() {
            return Ok(());
        }
        if self.geometry.canvas_w == 0 || self.geometry.canvas_h == 0 {
            if self.capture.take_pending().is_some() {
                let err = CaptureError::EmptyCanvas {
                    width: self.geometry.canvas_w,
                    height: self.geometry.canvas_h,
                };
                warn!(error = %err, "capture aborted");
            }
            return Ok(());
        }

        self.driver.advance(&mut self.uniforms, &self.keys);
        let block = self.binding_block();
        let Some(program) = self.gallery.active_program() else {
            return Ok(());
        };

        let scale = self.capture.take_pending();
        let framebuffer = match self.driver.draw(
            &mut self.backend,
            program,
            &block,
            &self.geometry,
            self.gallery.is_3d(),
            scale.is_some(),
        ) {
            Ok(framebuffer) => framebuffer,
            Err(err) => {
                // The frame never completed; keep the request for the next one.
                if let Some(scale) = scale {
                    self.capture.request(scale);
                }
                return Err(err);
            }
        };

        if let Some(scale) = scale {
            if let Err(err) =
                self.capture
                    .complete(framebuffer, &self.geometry, scale, self.sink.as_mut())
            {
                warn!(error = %err, "capture aborted");
            }
        }
        Ok(())
    }
}

impl<B: GpuBackend> EventSink for Viewer<B> {
    fn handle_event(&mut self, event: ViewerEvent) -> EventOutcome {
        match event {
            ViewerEvent::Resized { width, height } => self.resize(width, height),
            ViewerEvent::CursorMoved { x, y } => {
                let y = self.flip_y(y);
                self.uniforms.set_mouse_position(x, y);
            }
            ViewerEvent::MouseButton { pressed } => self.uniforms.set_mouse_pressed(pressed),
            ViewerEvent::Touch { phase, x, y, at } => {
                let y = self.flip_y(y);
                match phase {
                    TouchPhase::Started => {
                        if self.taps.register(at) {
                            self.next();
                        }
                        self.uniforms.set_mouse_position(x, y);
                        self.uniforms.set_mouse_pressed(true);
                    }
                    TouchPhase::Moved => {
                        self.uniforms.set_mouse_position(x, y);
                        self.uniforms.set_mouse_pressed(true);
                    }
                    TouchPhase::Ended => self.uniforms.set_mouse_pressed(false),
                }
            }
            ViewerEvent::Key { key, pressed } => return self.on_key(key, pressed),
            ViewerEvent::CloseRequested => return EventOutcome::Exit,
        }
        EventOutcome::Continue
    }
}

impl<B: GpuBackend> Drop for Viewer<B> {
    fn drop(&mut self) {
        self.gallery.release_all(&mut self.backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use catalog::CatalogEntry;

    use crate::backend::{DrawCall, RowOrder};
    use crate::frame::FixedClock;
    use crate::testing::MockBackend;

    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<RgbaImage>>>);

    impl ImageSink for SharedSink {
        fn save(&mut self, image: &RgbaImage) -> Result<PathBuf, CaptureError> {
            self.0.borrow_mut().push(image.clone());
            Ok(PathBuf::from("capture.png"))
        }
    }

    fn catalog(entries: &[(&str, &str)]) -> Catalog {
        Catalog::from_entries(
            entries
                .iter()
                .map(|(name, source)| CatalogEntry::new(*name, *source))
                .collect(),
        )
    }

    fn viewer_with(
        entries: &[(&str, &str)],
        strategy: LoadStrategy,
        sink: SharedSink,
    ) -> Viewer<MockBackend> {
        let asset = BaseAsset {
            texture: TextureSource::Pixels(RgbaImage::new(800, 400)),
            mesh: None,
        };
        let mut options = ViewerOptions::new((1920, 1080), Box::new(sink));
        options.strategy = strategy;
        options.clock = Box::new(FixedClock { step: 0.016 });
        Viewer::new(MockBackend::default(), catalog(entries), asset, options)
    }

    const ABC: [(&str, &str); 3] = [
        ("A", "void main() {}"),
        ("B", "INVALID"),
        ("C", "void main() {}"),
    ];

    #[test]
    fn eager_load_drops_invalid_and_selects_first() {
        let mut viewer = viewer_with(&ABC, LoadStrategy::Eager, SharedSink::default());
        assert_eq!(viewer.start().unwrap(), LoadState::Ready);
        assert_eq!(viewer.effect_names(), vec!["A", "C"]);
        assert_eq!(viewer.active_index(), Some(0));

        assert!(viewer.next());
        assert_eq!(viewer.active_name(), Some("C"));
        assert!(viewer.next());
        assert_eq!(viewer.active_name(), Some("A"));
    }

    #[test]
    fn incremental_load_reaches_same_state() {
        let mut viewer = viewer_with(&ABC, LoadStrategy::Incremental, SharedSink::default());
        viewer.start().unwrap();
        let mut turns = 0;
        while !viewer.is_ready() {
            viewer.pump_loading().unwrap();
            turns += 1;
            assert!(turns <= ABC.len());
        }
        assert_eq!(viewer.effect_names(), vec!["A", "C"]);
        assert_eq!(viewer.active_index(), Some(0));
    }

    #[test]
    fn no_draws_or_navigation_before_ready() {
        let mut viewer = viewer_with(&ABC, LoadStrategy::Incremental, SharedSink::default());
        viewer.start().unwrap();
        viewer.pump_loading().unwrap();
        assert!(!viewer.switch_to(0));
        viewer.draw_frame().unwrap();
        assert!(viewer.backend().draws.is_empty());
    }

    #[test]
    fn custom_compile_and_navigation_wait_for_ready() {
        let mut viewer = viewer_with(&ABC, LoadStrategy::Incremental, SharedSink::default());
        viewer.start().unwrap();
        viewer.pump_loading().unwrap();

        assert!(matches!(
            viewer.compile_custom("void main() {}"),
            Err(GalleryError::NotReady)
        ));
        assert!(!viewer.next());
        assert!(!viewer.prev());
        assert!(viewer.backend().bound.is_none());

        while !viewer.is_ready() {
            viewer.pump_loading().unwrap();
        }
        assert_eq!(viewer.effect_names(), vec!["A", "C"]);
        assert_eq!(viewer.compile_custom("void main() {}").unwrap(), 2);
        assert_eq!(viewer.effect_names(), vec!["A", "C", "Custom"]);
    }

    #[test]
    fn total_failure_leaves_no_selection() {
        let mut viewer = viewer_with(
            &[("X", "INVALID")],
            LoadStrategy::Eager,
            SharedSink::default(),
        );
        assert!(matches!(viewer.start(), Err(GalleryError::NoEffects)));
        assert_eq!(viewer.load_state(), LoadState::Failed);
        assert_eq!(viewer.active_index(), None);
    }

    #[test]
    fn missing_base_image_fails_the_load() {
        let asset = BaseAsset::image_file("/definitely/not/here.png");
        let mut options = ViewerOptions::new((640, 480), Box::new(SharedSink::default()));
        options.strategy = LoadStrategy::Eager;
        let mut viewer = Viewer::new(MockBackend::default(), catalog(&ABC), asset, options);

        assert!(matches!(viewer.start(), Err(GalleryError::BaseImage(_))));
        assert_eq!(viewer.load_state(), LoadState::Failed);
        assert_eq!(viewer.active_index(), None);
    }

    #[test]
    fn layout_follows_texture_and_canvas() {
        let mut viewer = viewer_with(&ABC, LoadStrategy::Eager, SharedSink::default());
        viewer.start().unwrap();
        let geometry = *viewer.geometry();
        assert_eq!(
            (geometry.display_x, geometry.display_y, geometry.display_w, geometry.display_h),
            (0, 60, 1920, 960)
        );

        viewer.resize(400, 400);
        assert_eq!(viewer.geometry().display_h, 200);
        assert_eq!(viewer.backend().canvas, (400, 400));
    }

    #[test]
    fn oversized_canvas_follows_the_backend_limit() {
        let asset = BaseAsset {
            texture: TextureSource::Pixels(RgbaImage::new(800, 400)),
            mesh: None,
        };
        let backend = MockBackend {
            max_dimension: Some(4096),
            ..MockBackend::default()
        };
        let mut options = ViewerOptions::new((1920, 1080), Box::new(SharedSink::default()));
        options.strategy = LoadStrategy::Eager;
        let mut viewer = Viewer::new(backend, catalog(&ABC), asset, options);
        viewer.start().unwrap();

        viewer.resize(10_000, 2_000);
        assert_eq!(viewer.backend().canvas, (4096, 2000));
        let geometry = *viewer.geometry();
        assert_eq!((geometry.canvas_w, geometry.canvas_h), (4096, 2000));
        assert_eq!((geometry.display_w, geometry.display_h), (4000, 2000));
    }

    #[test]
    fn switch_binds_display_local_mouse() {
        let mut viewer = viewer_with(&ABC, LoadStrategy::Eager, SharedSink::default());
        viewer.start().unwrap();
        viewer.handle_event(ViewerEvent::CursorMoved { x: 100.0, y: 980.0 });
        viewer.switch_to(1);

        let block = viewer.backend().uniforms.last().copied().unwrap();
        // Canvas y 980 from the top is 100 from the bottom; the letterbox
        // starts 60 pixels up.
        assert_eq!(&block.mouse[..2], &[100.0, 40.0]);
        assert_eq!(block.resolution, [1920.0, 960.0]);
    }

    #[test]
    fn keys_navigate_and_escape_exits() {
        let mut viewer = viewer_with(&ABC, LoadStrategy::Eager, SharedSink::default());
        viewer.start().unwrap();
        let press = |key| ViewerEvent::Key { key, pressed: true };

        viewer.handle_event(press(ViewerKey::Down));
        assert_eq!(viewer.active_index(), Some(1));
        viewer.handle_event(press(ViewerKey::Backspace));
        assert_eq!(viewer.active_index(), Some(0));
        viewer.handle_event(press(ViewerKey::Up));
        assert_eq!(viewer.active_index(), Some(1));
        viewer.handle_event(press(ViewerKey::Home));
        assert_eq!(viewer.active_index(), Some(0));
        assert_eq!(viewer.handle_event(press(ViewerKey::Escape)), EventOutcome::Exit);
    }

    #[test]
    fn double_tap_advances() {
        let mut viewer = viewer_with(&ABC, LoadStrategy::Eager, SharedSink::default());
        viewer.start().unwrap();
        let at = Instant::now();
        let tap = |phase, at| ViewerEvent::Touch {
            phase,
            x: 10.0,
            y: 10.0,
            at,
        };
        viewer.handle_event(tap(TouchPhase::Started, at));
        viewer.handle_event(tap(TouchPhase::Ended, at));
        assert!(viewer.uniforms().mouse()[2] == 0.0);
        viewer.handle_event(tap(TouchPhase::Started, at + Duration::from_millis(150)));
        assert_eq!(viewer.active_index(), Some(1));
    }

    #[test]
    fn frame_draws_active_program_and_captures() {
        let sink = SharedSink::default();
        let mut viewer = viewer_with(&ABC, LoadStrategy::Eager, sink.clone());
        viewer.start().unwrap();
        viewer.switch_to(1);
        viewer.save_image(2);
        viewer.draw_frame().unwrap();

        assert_eq!(viewer.backend().bound_name(), Some("C"));
        assert!(matches!(viewer.backend().draws[0], DrawCall::Quad { .. }));
        assert!(viewer.uniforms().time() > 0.0);
        let images = sink.0.borrow();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].dimensions(), (3840, 1920));

        drop(images);
        viewer.draw_frame().unwrap();
        assert_eq!(sink.0.borrow().len(), 1);
    }

    #[test]
    fn capture_with_empty_canvas_is_dropped() {
        let sink = SharedSink::default();
        let mut viewer = viewer_with(&ABC, LoadStrategy::Eager, sink.clone());
        viewer.start().unwrap();
        viewer.resize(0, 720);
        viewer.save_image(1);
        viewer.draw_frame().unwrap();

        assert!(sink.0.borrow().is_empty());
        assert!(viewer.backend().draws.is_empty());
    }

    #[test]
    fn bottom_up_readback_is_accepted() {
        let sink = SharedSink::default();
        let mut viewer = viewer_with(&ABC, LoadStrategy::Eager, sink.clone());
        viewer.start().unwrap();
        viewer.resize(8, 6);
        viewer.load_new_image(RgbaImage::new(8, 2)).unwrap();
        viewer.backend.row_order = Some(RowOrder::BottomUp);
        viewer.save_image(1);
        viewer.draw_frame().unwrap();

        let images = sink.0.borrow();
        assert_eq!(images[0].dimensions(), (8, 2));
        assert_eq!(images[0].get_pixel(0, 0)[0], 3);
    }

    #[test]
    fn mesh_asset_uses_full_canvas_and_3d_programs() {
        let asset = BaseAsset {
            texture: TextureSource::Pixels(RgbaImage::new(4, 4)),
            mesh: Some(MeshData::cube()),
        };
        let mut options = ViewerOptions::new((640, 480), Box::new(SharedSink::default()));
        options.strategy = LoadStrategy::Eager;
        options.clock = Box::new(FixedClock { step: 0.016 });
        let mut viewer = Viewer::new(MockBackend::default(), catalog(&ABC), asset, options);
        viewer.start().unwrap();

        assert_eq!(*viewer.geometry(), DisplayGeometry::full_canvas(640, 480));
        assert_eq!(viewer.backend().meshes, 1);
        viewer.draw_frame().unwrap();
        assert!(matches!(viewer.backend().draws[0], DrawCall::Mesh { .. }));
    }

    #[test]
    fn custom_compile_reports_errors_without_changing_selection() {
        let mut viewer = viewer_with(&ABC, LoadStrategy::Eager, SharedSink::default());
        viewer.start().unwrap();
        assert!(viewer.compile_custom("INVALID").is_err());
        assert_eq!(viewer.active_index(), Some(0));
        assert_eq!(viewer.compile_custom("void main() {}").unwrap(), 2);
        assert_eq!(viewer.active_index(), Some(2));
    }

    #[test]
    fn drop_releases_programs() {
        let mut viewer = viewer_with(&ABC, LoadStrategy::Eager, SharedSink::default());
        viewer.start().unwrap();
        assert_eq!(viewer.backend().live_programs(), 4);
        viewer.gallery.release_all(&mut viewer.backend);
        assert_eq!(viewer.backend().live_programs(), 0);
    }
}
