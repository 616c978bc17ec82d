use thiserror::Error;

use crate::backend::{BackendError, CompileError};

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("no shaders loaded successfully")]
    NoEffects,

    #[error("failed to load base image: {0}")]
    BaseImage(String),

    #[error("base image has zero size")]
    EmptyImage,

    #[error("mesh has no drawable geometry")]
    EmptyMesh,

    #[error("effects are still loading")]
    NotReady,

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
