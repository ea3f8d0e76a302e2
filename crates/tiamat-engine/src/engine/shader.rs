//! Shader program descriptors.

/// Pipeline stage a shader source targets.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Scalar/vector/matrix type of a shader variable, shared by vertex
/// attribute declarations.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderVariableType {
    Float,
    Double,
    Integer,
    FVec2,
    FVec3,
    FVec4,
    FMat4x4,
}

impl ShaderVariableType {
    /// Bytes per scalar component.
    pub fn base_size(self) -> u32 {
        match self {
            Self::Double => 8,
            Self::Float | Self::Integer | Self::FVec2 | Self::FVec3 | Self::FVec4
            | Self::FMat4x4 => 4,
        }
    }

    pub fn component_count(self) -> u32 {
        match self {
            Self::Float | Self::Double | Self::Integer => 1,
            Self::FVec2 => 2,
            Self::FVec3 => 3,
            Self::FVec4 => 4,
            Self::FMat4x4 => 16,
        }
    }

    /// Total byte size of one value of this type.
    pub fn size_bytes(self) -> u32 {
        self.base_size() * self.component_count()
    }
}

/// One shader stage source: opaque text compiled by the backend.
#[derive(Debug, Clone)]
pub struct ShaderSourceDescriptor {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub source: String,
}

/// A linked program: one source per stage, vertex + fragment.
#[derive(Debug, Clone)]
pub struct ShaderProgramDescriptor {
    pub sources: Vec<ShaderSourceDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_type_sizes() {
        assert_eq!(ShaderVariableType::Float.size_bytes(), 4);
        assert_eq!(ShaderVariableType::Double.size_bytes(), 8);
        assert_eq!(ShaderVariableType::FVec3.size_bytes(), 12);
        assert_eq!(ShaderVariableType::FMat4x4.size_bytes(), 64);
    }
}
