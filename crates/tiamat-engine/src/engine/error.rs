use crate::backend::BackendError;
use crate::id::Id;

/// Kind tag carried by id-related errors, since ids are only unique per
/// resource table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    VertexBuffer,
    UniformBuffer,
    Texture,
    ShaderProgram,
    RenderPass,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::VertexBuffer => "vertex buffer",
            Self::UniformBuffer => "uniform buffer",
            Self::Texture => "texture",
            Self::ShaderProgram => "shader program",
            Self::RenderPass => "render pass",
        };
        f.write_str(name)
    }
}

/// Engine-level error. Every failure is terminal for the single operation
/// that raised it; nothing is retried and no partial resource state
/// survives a failed allocation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{kind} id {id} is not live")]
    InvalidId { kind: ResourceKind, id: Id },

    #[error("{kind} id {id} data is already borrowed")]
    AlreadyBorrowed { kind: ResourceKind, id: Id },

    #[error("{kind} id {id} data is not currently borrowed")]
    NotBorrowed { kind: ResourceKind, id: Id },

    #[error("texture data is {actual} bytes, expected {expected}")]
    TextureDataSize { expected: usize, actual: usize },

    #[error("uniform write of {len} bytes at offset {offset} exceeds the {capacity}-byte buffer")]
    UniformWriteRange {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl EngineError {
    /// Stable numeric code handed to error callbacks alongside the message.
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidId { .. } => 1,
            Self::AlreadyBorrowed { .. } => 2,
            Self::NotBorrowed { .. } => 3,
            Self::TextureDataSize { .. } => 4,
            Self::UniformWriteRange { .. } => 5,
            Self::Backend(BackendError::Allocation(_)) => 10,
            Self::Backend(BackendError::ShaderCompilation { .. }) => 11,
            Self::Backend(BackendError::Unsupported { .. }) => 12,
            Self::Backend(BackendError::Surface(_)) => 13,
        }
    }
}
