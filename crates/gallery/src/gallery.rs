//! Ownership of compiled effects and the single active selection.
//!
//! `Gallery` is the only place that binds a program for drawing. Every switch
//! re-uploads the full uniform block because backends are free to drop
//! uniform values when programs change.
use tracing::{debug, info};

use crate::backend::{CompileError, GpuBackend};
use crate::compiler::{compile_effect, release_effect, CompiledEffect};
use crate::uniforms::UniformBlock;

pub const CUSTOM_EFFECT_NAME: &str = "Custom";

#[derive(Debug)]
pub struct Gallery<P> {
    effects: Vec<CompiledEffect<P>>,
    current: Option<usize>,
    custom_slot: Option<usize>,
    is_3d: bool,
    loading_complete: bool,
}

impl<P> Default for Gallery<P> {
    fn default() -> Self {
        Self {
            effects: Vec::new(),
            current: None,
            custom_slot: None,
            is_3d: false,
            loading_complete: false,
        }
    }
}

impl<P> Gallery<P> {
    pub fn new(is_3d: bool) -> Self {
        Self {
            is_3d,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    pub fn loading_complete(&self) -> bool {
        self.loading_complete
    }

    pub(crate) fn mark_loading_complete(&mut self) {
        self.loading_complete = true;
    }

    pub fn active_index(&self) -> Option<usize> {
        self.current
    }

    pub fn active_name(&self) -> Option<&str> {
        self.current
            .and_then(|index| self.effects.get(index))
            .map(|effect| effect.name.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.effects.iter().map(|effect| effect.name.as_str()).collect()
    }

    /// The program matching the current display mode. Callers must fetch this
    /// every frame rather than holding on to it.
    pub fn active_program(&self) -> Option<&P> {
        self.current
            .and_then(|index| self.effects.get(index))
            .map(|effect| effect.program(self.is_3d))
    }

    pub(crate) fn push(&mut self, effect: CompiledEffect<P>) {
        self.effects.push(effect);
    }

    /// Activates effect `index` and rebinds every uniform. Out-of-range
    /// indices are ignored and leave the selection untouched.
    pub fn switch_to<B>(&mut self, backend: &mut B, index: usize, block: &UniformBlock) -> bool
    where
        B: GpuBackend<Program = P>,
    {
        let Some(effect) = self.effects.get(index) else {
            debug!(index, count = self.effects.len(), "ignoring out-of-range effect switch");
            return false;
        };
        backend.use_program(effect.program(self.is_3d));
        backend.upload_uniforms(block);
        self.current = Some(index);
        info!(index, name = %effect.name, "switched effect");
        true
    }

    pub fn next<B>(&mut self, backend: &mut B, block: &UniformBlock) -> bool
    where
        B: GpuBackend<Program = P>,
    {
        match self.current {
            Some(index) if !self.effects.is_empty() => {
                let target = (index + 1) % self.effects.len();
                self.switch_to(backend, target, block)
            }
            _ => false,
        }
    }

    pub fn prev<B>(&mut self, backend: &mut B, block: &UniformBlock) -> bool
    where
        B: GpuBackend<Program = P>,
    {
        match self.current {
            Some(index) if !self.effects.is_empty() => {
                let count = self.effects.len();
                let target = (index + count - 1) % count;
                self.switch_to(backend, target, block)
            }
            _ => false,
        }
    }

    pub fn reset_to_default<B>(&mut self, backend: &mut B, block: &UniformBlock) -> bool
    where
        B: GpuBackend<Program = P>,
    {
        self.switch_to(backend, 0, block)
    }

    /// Compiles an ad-hoc effect into the single custom slot and activates it.
    ///
    /// A previous custom effect is replaced and its programs released. On
    /// failure nothing changes and the compile error is returned.
    pub fn compile_custom<B>(
        &mut self,
        backend: &mut B,
        source: &str,
        block: &UniformBlock,
    ) -> Result<usize, CompileError>
    where
        B: GpuBackend<Program = P>,
    {
        let effect = compile_effect(backend, CUSTOM_EFFECT_NAME, source)?;
        let index = match self.custom_slot {
            Some(slot) => {
                let previous = std::mem::replace(&mut self.effects[slot], effect);
                release_effect(backend, previous);
                slot
            }
            None => {
                self.effects.push(effect);
                let slot = self.effects.len() - 1;
                self.custom_slot = Some(slot);
                slot
            }
        };
        self.switch_to(backend, index, block);
        Ok(index)
    }

    /// Releases every program, newest first.
    pub fn release_all<B>(&mut self, backend: &mut B)
    where
        B: GpuBackend<Program = P>,
    {
        self.current = None;
        self.custom_slot = None;
        while let Some(effect) = self.effects.pop() {
            release_effect(backend, effect);
        }
    }
}
