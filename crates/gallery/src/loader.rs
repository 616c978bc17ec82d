//! Incremental effect loading.
//!
//! `LoadScheduler` walks the catalog one entry per [`LoadScheduler::step`], so
//! an event loop can interleave compiles with input and redraws. Running the
//! same steps in a tight loop is the eager strategy; both strategies end with
//! the same effect list in catalog order.
use catalog::Catalog;
use tracing::{debug, error, info};

use crate::backend::GpuBackend;
use crate::compiler::compile_effect;
use crate::error::GalleryError;
use crate::gallery::Gallery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Compile everything before the first frame.
    Eager,
    /// Compile one entry per event-loop turn.
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading { next: usize },
    /// Every entry has been attempted; post-load work is pending.
    Finalizing,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub attempted: usize,
    pub loaded: usize,
    pub total: usize,
}

#[derive(Debug)]
pub struct LoadScheduler {
    catalog: Catalog,
    state: LoadState,
    attempted: usize,
    loaded: usize,
}

impl LoadScheduler {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            state: LoadState::Idle,
            attempted: 0,
            loaded: 0,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, LoadState::Ready | LoadState::Failed)
    }

    pub fn progress(&self) -> LoadProgress {
        LoadProgress {
            attempted: self.attempted,
            loaded: self.loaded,
            total: self.catalog.len(),
        }
    }

    pub fn start(&mut self) {
        if self.state != LoadState::Idle {
            return;
        }
        info!(total = self.catalog.len(), "loading effects");
        self.state = if self.catalog.is_empty() {
            LoadState::Finalizing
        } else {
            LoadState::Loading { next: 0 }
        };
    }

    /// Performs exactly one transition and returns the new state.
    ///
    /// In `Loading` this compiles one catalog entry. Once every entry has been
    /// attempted the scheduler moves to `Finalizing`, or to `Failed` with
    /// [`GalleryError::NoEffects`] when nothing survived. `Finalizing` is left
    /// by [`LoadScheduler::finish`], which the owner calls after its post-load
    /// work.
    pub fn step<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        gallery: &mut Gallery<B::Program>,
    ) -> Result<LoadState, GalleryError> {
        match self.state {
            LoadState::Idle => self.start(),
            LoadState::Loading { next } => {
                if let Some(entry) = self.catalog.get(next) {
                    self.attempted += 1;
                    if let Ok(effect) = compile_effect(backend, &entry.name, &entry.source) {
                        gallery.push(effect);
                        self.loaded += 1;
                    }
                }
                let following = next + 1;
                self.state = if following < self.catalog.len() {
                    LoadState::Loading { next: following }
                } else {
                    LoadState::Finalizing
                };
                debug!(
                    attempted = self.attempted,
                    loaded = self.loaded,
                    total = self.catalog.len(),
                    "load step"
                );
            }
            LoadState::Finalizing | LoadState::Ready | LoadState::Failed => {}
        }

        if self.state == LoadState::Finalizing && gallery.is_empty() {
            error!(total = self.catalog.len(), "no effects compiled");
            self.state = LoadState::Failed;
            return Err(GalleryError::NoEffects);
        }
        Ok(self.state)
    }

    /// Steps until `Finalizing` (or failure).
    pub fn run_to_completion<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        gallery: &mut Gallery<B::Program>,
    ) -> Result<LoadState, GalleryError> {
        self.start();
        loop {
            match self.step(backend, gallery)? {
                LoadState::Loading { .. } | LoadState::Idle => continue,
                state => return Ok(state),
            }
        }
    }

    /// Records the outcome of post-load work.
    pub fn finish(&mut self, result: &Result<(), GalleryError>) {
        if self.state != LoadState::Finalizing {
            return;
        }
        self.state = match result {
            Ok(()) => {
                info!(loaded = self.loaded, total = self.catalog.len(), "effects ready");
                LoadState::Ready
            }
            Err(err) => {
                error!(error = %err, "post-load setup failed");
                LoadState::Failed
            }
        };
    }
}
