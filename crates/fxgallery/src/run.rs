use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use gallery::catalog::{Catalog, FsResolver};
use gallery::{
    BackendError, BaseAsset, Drawable, EventOutcome, EventSink, LoadProgress, MeshData,
    PngDirectorySink, TextureSource, TouchPhase, Viewer, ViewerEvent, ViewerOptions,
};
use renderer::WgpuBackend;
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use crate::cli::Cli;
use crate::input::viewer_key;
use crate::settings::{default_settings_path, Launch, Settings};

const APP_NAME: &str = "fxgallery";

pub fn run(cli: Cli) -> Result<()> {
    let settings_path = match &cli.settings {
        Some(path) => path.clone(),
        None => default_settings_path()?,
    };
    let mut settings = Settings::load_or_default(&settings_path)?;
    settings.merge_cli(&cli);
    tracing::debug!(path = %settings_path.display(), "resolved settings");

    if cli.print_settings {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let launch = settings.launch(cli.custom.clone())?;
    let custom_source = launch
        .custom
        .as_deref()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read custom shader at {}", path.display()))
        })
        .transpose()?;
    let catalog = build_catalog(&launch)?;
    tracing::info!(
        effects = catalog.len(),
        image = %launch.image.display(),
        strategy = ?launch.strategy,
        cube = launch.cube,
        "starting {APP_NAME}"
    );

    run_window(launch, catalog, custom_source)
}

pub fn initialise_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Built-in effects followed by whatever the shader index lists.
pub fn build_catalog(launch: &Launch) -> Result<Catalog> {
    let mut catalog = Catalog::builtin();
    let resolver = FsResolver::new(&launch.shader_dir);
    let appended = catalog
        .append_from_index(&resolver, &launch.shader_index)
        .with_context(|| {
            format!(
                "failed to load shader index at {}",
                launch.shader_index.display()
            )
        })?;
    tracing::debug!(appended, total = catalog.len(), "catalog assembled");
    Ok(catalog)
}

/// Owns the viewer and its window. `viewer` is declared first so its surface
/// is dropped before the window it was created from.
struct App {
    viewer: Viewer<WgpuBackend>,
    window: Arc<Window>,
    title: String,
    custom: Option<String>,
}

impl App {
    fn dispatch(&mut self, event: ViewerEvent, elwt: &EventLoopWindowTarget<()>) {
        if self.viewer.handle_event(event) == EventOutcome::Exit {
            elwt.exit();
        }
    }

    /// Runs once per loop turn: advances loading, installs the custom effect
    /// once the gallery is ready and keeps the title current.
    fn tick(&mut self) -> Result<()> {
        if !self.viewer.is_ready() {
            self.viewer
                .pump_loading()
                .context("failed to load effects")?;
        }
        if self.viewer.is_ready() {
            if let Some(source) = self.custom.take() {
                match self.viewer.compile_custom(&source) {
                    Ok(index) => tracing::info!(index, "custom effect installed"),
                    Err(err) => tracing::warn!(error = %err, "custom effect failed to compile"),
                }
            }
        }

        let title = window_title(
            self.viewer.is_ready(),
            self.viewer.load_progress(),
            self.viewer.active_name(),
        );
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
        Ok(())
    }

    fn redraw(&mut self, elwt: &EventLoopWindowTarget<()>) {
        match self.viewer.draw_frame() {
            Ok(()) => {}
            Err(BackendError::SurfaceLost) => {
                tracing::debug!("surface lost; reconfigured for next frame");
            }
            Err(BackendError::OutOfMemory) => {
                tracing::error!("surface out of memory; exiting");
                elwt.exit();
            }
            Err(BackendError::Timeout) => {
                tracing::warn!("surface timeout; retrying next frame");
            }
            Err(err) => {
                tracing::warn!(error = %err, "frame failed; retrying next frame");
            }
        }
    }

    fn load_dropped_file(&mut self, path: &Path) {
        let result = fs::read(path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| {
                self.viewer
                    .load_image_bytes(&bytes)
                    .map_err(anyhow::Error::from)
            });
        match result {
            Ok(()) => tracing::info!(path = %path.display(), "replaced base image"),
            Err(err) => tracing::warn!(path = %path.display(), error = %err, "ignoring dropped file"),
        }
    }
}

fn run_window(launch: Launch, catalog: Catalog, custom: Option<String>) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(APP_NAME)
        .with_inner_size(PhysicalSize::new(launch.canvas.0, launch.canvas.1))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let size = window.inner_size();
    let backend = WgpuBackend::new(window.as_ref(), (size.width, size.height), launch.surface)
        .context("failed to initialise GPU backend")?;

    let asset = if launch.cube {
        BaseAsset {
            texture: TextureSource::File(launch.image.clone()),
            mesh: Some(MeshData::cube()),
        }
    } else {
        BaseAsset::image_file(launch.image.clone())
    };
    let sink = PngDirectorySink::new(launch.capture_dir.clone(), APP_NAME);
    let mut options = ViewerOptions::new((size.width, size.height), Box::new(sink));
    options.strategy = launch.strategy;

    let mut viewer = Viewer::new(backend, catalog, asset, options);
    launch.uniforms.apply(viewer.uniforms_mut());
    viewer
        .start()
        .context("failed to load effects")?;

    let mut app = App {
        viewer,
        window,
        title: String::new(),
        custom,
    };
    let mut failure: Option<anyhow::Error> = None;

    event_loop
        .run(|event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);
            match event {
                Event::WindowEvent { window_id, event } if window_id == app.window.id() => {
                    match event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                            app.dispatch(ViewerEvent::CloseRequested, elwt);
                        }
                        WindowEvent::Resized(new_size) => {
                            app.dispatch(
                                ViewerEvent::Resized {
                                    width: new_size.width,
                                    height: new_size.height,
                                },
                                elwt,
                            );
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            app.dispatch(
                                ViewerEvent::CursorMoved {
                                    x: position.x as f32,
                                    y: position.y as f32,
                                },
                                elwt,
                            );
                        }
                        WindowEvent::MouseInput {
                            state,
                            button: MouseButton::Left,
                            ..
                        } => {
                            app.dispatch(
                                ViewerEvent::MouseButton {
                                    pressed: state == ElementState::Pressed,
                                },
                                elwt,
                            );
                        }
                        WindowEvent::Touch(touch) => {
                            let phase = match touch.phase {
                                winit::event::TouchPhase::Started => TouchPhase::Started,
                                winit::event::TouchPhase::Moved => TouchPhase::Moved,
                                winit::event::TouchPhase::Ended
                                | winit::event::TouchPhase::Cancelled => TouchPhase::Ended,
                            };
                            app.dispatch(
                                ViewerEvent::Touch {
                                    phase,
                                    x: touch.location.x as f32,
                                    y: touch.location.y as f32,
                                    at: Instant::now(),
                                },
                                elwt,
                            );
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            let pressed = event.state == ElementState::Pressed;
                            if pressed && event.repeat {
                                return;
                            }
                            if let Some(key) = viewer_key(&event.logical_key) {
                                app.dispatch(ViewerEvent::Key { key, pressed }, elwt);
                            }
                        }
                        WindowEvent::DroppedFile(path) => app.load_dropped_file(&path),
                        WindowEvent::RedrawRequested => app.redraw(elwt),
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    if let Err(err) = app.tick() {
                        failure = Some(err);
                        elwt.exit();
                        return;
                    }
                    app.window.request_redraw();
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow!("event loop error: {err}"))?;

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn window_title(ready: bool, progress: LoadProgress, active: Option<&str>) -> String {
    if !ready {
        return format!(
            "{APP_NAME}: loading {}/{}",
            progress.attempted, progress.total
        );
    }
    match active {
        Some(name) => format!("{APP_NAME}: {name}"),
        None => APP_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn progress(attempted: usize, total: usize) -> LoadProgress {
        LoadProgress {
            attempted,
            loaded: attempted,
            total,
        }
    }

    #[test]
    fn title_tracks_loading_and_active_effect() {
        assert_eq!(
            window_title(false, progress(3, 12), None),
            "fxgallery: loading 3/12"
        );
        assert_eq!(
            window_title(true, progress(12, 12), Some("ripple")),
            "fxgallery: ripple"
        );
        assert_eq!(window_title(true, progress(0, 0), None), "fxgallery");
    }

    #[test]
    fn catalog_appends_indexed_shaders() {
        let dir = TempDir::new().unwrap();
        let shaders = dir.path().join("shaders");
        fs::create_dir_all(&shaders).unwrap();
        fs::write(
            shaders.join("extra.glsl"),
            "void main() { gl_FragColor = vec4(1.0); }",
        )
        .unwrap();
        fs::write(shaders.join("index.txt"), "# extras\nextra\nmissing\n").unwrap();

        let settings = Settings {
            assets: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let launch = settings.launch(None).unwrap();
        let catalog = build_catalog(&launch).unwrap();
        let builtin = Catalog::builtin().len();
        assert_eq!(catalog.len(), builtin + 1);
        assert_eq!(catalog.names().last().copied(), Some("extra"));
    }

    #[test]
    fn catalog_without_index_is_builtin() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            assets: PathBuf::from(dir.path()),
            ..Settings::default()
        };
        let launch = settings.launch(None).unwrap();
        assert_eq!(
            build_catalog(&launch).unwrap().len(),
            Catalog::builtin().len()
        );
    }
}
