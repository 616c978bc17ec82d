use tracing::{debug, warn};

use crate::backend::{CompileError, GpuBackend, PipelineKind};

/// A catalog entry that built for both pipelines.
#[derive(Debug)]
pub struct CompiledEffect<P> {
    pub name: String,
    pub program_3d: P,
    pub program_2d: P,
}

impl<P> CompiledEffect<P> {
    pub fn program(&self, is_3d: bool) -> &P {
        if is_3d {
            &self.program_3d
        } else {
            &self.program_2d
        }
    }
}

/// Builds the mesh and quad programs for one fragment source.
///
/// Either both programs come back or neither does: when one half fails, the
/// half that built is released before the error is returned.
pub fn compile_effect<B: GpuBackend>(
    backend: &mut B,
    name: &str,
    fragment: &str,
) -> Result<CompiledEffect<B::Program>, CompileError> {
    let program_3d = match backend.build_program(PipelineKind::Mesh3d, name, fragment) {
        Ok(program) => program,
        Err(err) => {
            warn!(effect = name, pipeline = %err.pipeline, error = %err.message, "failed to compile effect");
            return Err(err);
        }
    };

    let program_2d = match backend.build_program(PipelineKind::Quad2d, name, fragment) {
        Ok(program) => program,
        Err(err) => {
            warn!(effect = name, pipeline = %err.pipeline, error = %err.message, "failed to compile effect");
            backend.release_program(program_3d);
            return Err(err);
        }
    };

    debug!(effect = name, "compiled effect");
    Ok(CompiledEffect {
        name: name.to_string(),
        program_3d,
        program_2d,
    })
}

pub fn release_effect<B: GpuBackend>(backend: &mut B, effect: CompiledEffect<B::Program>) {
    backend.release_program(effect.program_2d);
    backend.release_program(effect.program_3d);
}
