//! Vertex buffer descriptors and derived memory layout.
//!
//! One vertex buffer owns a single byte region holding all interleaved
//! per-vertex records first, followed by all interleaved per-instance
//! records; indices live in a separate region. Attribute declaration order
//! is memory layout order.

use crate::engine::shader::ShaderVariableType;

/// Primitive topology of a vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RenderTopology {
    Triangles,
    Points,
    Lines,
}

/// Element counts of a vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct VertexBufferSize {
    pub vertex_count: u32,
    pub index_count: u32,
    pub instance_count: u32,
}

/// Caller-supplied attribute declaration: a shader variable type bound to a
/// shader attribute location.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttributeSettings {
    pub variable_type: ShaderVariableType,
    pub location: u32,
}

/// Caller-supplied vertex buffer configuration.
#[derive(Debug, Clone)]
pub struct VertexBufferSettings {
    pub size: VertexBufferSize,
    pub per_vertex_attributes: Vec<VertexAttributeSettings>,
    pub per_instance_attributes: Vec<VertexAttributeSettings>,
    pub topology: RenderTopology,
}

/// Attribute with its resolved byte placement within one record.
///
/// A mat4 attribute occupies 16 scalar components in a single slot here; the
/// backend splits it into 4 consecutive attribute locations when binding.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub location: u32,
    pub variable_type: ShaderVariableType,
    /// Byte offset within one vertex (or instance) record.
    pub offset: u32,
    /// Bytes per scalar component.
    pub base_size: u32,
    pub component_count: u32,
}

/// Fully resolved vertex buffer layout: settings plus running-sum offsets and
/// record strides. This is what the backend materializes GPU storage from.
#[derive(Debug, Clone)]
pub struct VertexBufferLayout {
    pub size: VertexBufferSize,
    pub topology: RenderTopology,
    pub per_vertex_attributes: Vec<VertexAttribute>,
    pub per_instance_attributes: Vec<VertexAttribute>,
    pub per_vertex_stride: u32,
    pub per_instance_stride: u32,
}

impl VertexBufferLayout {
    pub fn from_settings(settings: &VertexBufferSettings) -> Self {
        let (per_vertex_attributes, per_vertex_stride) =
            resolve_attributes(&settings.per_vertex_attributes);
        let (per_instance_attributes, per_instance_stride) =
            resolve_attributes(&settings.per_instance_attributes);

        Self {
            size: settings.size,
            topology: settings.topology,
            per_vertex_attributes,
            per_instance_attributes,
            per_vertex_stride,
            per_instance_stride,
        }
    }

    /// Reconstructs the caller-facing settings, e.g. to allocate a resized
    /// twin of an existing buffer.
    pub fn to_settings(&self, size: VertexBufferSize) -> VertexBufferSettings {
        let declare = |attrs: &[VertexAttribute]| {
            attrs
                .iter()
                .map(|a| VertexAttributeSettings {
                    variable_type: a.variable_type,
                    location: a.location,
                })
                .collect()
        };

        VertexBufferSettings {
            size,
            per_vertex_attributes: declare(&self.per_vertex_attributes),
            per_instance_attributes: declare(&self.per_instance_attributes),
            topology: self.topology,
        }
    }

    /// Byte size of the interleaved per-vertex region.
    pub fn vertices_bytes(&self) -> usize {
        self.size.vertex_count as usize * self.per_vertex_stride as usize
    }

    /// Byte size of the interleaved per-instance region.
    pub fn instances_bytes(&self) -> usize {
        self.size.instance_count as usize * self.per_instance_stride as usize
    }

    /// Byte size of the index region (u32 indices).
    pub fn indices_bytes(&self) -> usize {
        self.size.index_count as usize * std::mem::size_of::<u32>()
    }

    /// Base byte offset of the instance region within the shared buffer.
    /// The vertex region always starts at offset 0.
    pub fn instance_region_offset(&self) -> usize {
        self.vertices_bytes()
    }

    /// Total byte size of the shared vertex + instance buffer.
    pub fn buffer_bytes(&self) -> usize {
        self.vertices_bytes() + self.instances_bytes()
    }
}

/// Computes offsets by a running sum over the declarations, in order.
fn resolve_attributes(settings: &[VertexAttributeSettings]) -> (Vec<VertexAttribute>, u32) {
    let mut stride = 0u32;
    let attributes = settings
        .iter()
        .map(|declaration| {
            let variable_type = declaration.variable_type;
            let offset = stride;
            stride += variable_type.size_bytes();

            VertexAttribute {
                location: declaration.location,
                variable_type,
                offset,
                base_size: variable_type.base_size(),
                component_count: variable_type.component_count(),
            }
        })
        .collect();

    (attributes, stride)
}

/// Exclusive CPU-side view of a vertex buffer's staging bytes, obtained from
/// [`Engine::vertex_buffer_borrow_data`] and handed back through
/// [`Engine::vertex_buffer_return_data`], which uploads the edits.
///
/// [`Engine::vertex_buffer_borrow_data`]: crate::engine::Engine::vertex_buffer_borrow_data
/// [`Engine::vertex_buffer_return_data`]: crate::engine::Engine::vertex_buffer_return_data
#[derive(Debug)]
pub struct VertexBufferData {
    pub(crate) bytes: Vec<u8>,
    pub(crate) index_bytes: Vec<u8>,
    pub(crate) layout: VertexBufferLayout,
}

impl VertexBufferData {
    pub fn size(&self) -> VertexBufferSize {
        self.layout.size
    }

    pub fn layout(&self) -> &VertexBufferLayout {
        &self.layout
    }

    /// Interleaved per-vertex records.
    pub fn vertex_data_mut(&mut self) -> &mut [u8] {
        let len = self.layout.vertices_bytes();
        &mut self.bytes[..len]
    }

    /// Interleaved per-instance records (follows the vertex region in the
    /// shared buffer).
    pub fn instance_data_mut(&mut self) -> &mut [u8] {
        let start = self.layout.instance_region_offset();
        &mut self.bytes[start..]
    }

    pub fn indices_mut(&mut self) -> &mut [u32] {
        bytemuck::cast_slice_mut(&mut self.index_bytes)
    }

    pub fn vertex_data(&self) -> &[u8] {
        &self.bytes[..self.layout.vertices_bytes()]
    }

    pub fn instance_data(&self) -> &[u8] {
        &self.bytes[self.layout.instance_region_offset()..]
    }

    pub fn indices(&self) -> &[u32] {
        bytemuck::cast_slice(&self.index_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_attr(variable_type: ShaderVariableType, location: u32) -> VertexAttributeSettings {
        VertexAttributeSettings {
            variable_type,
            location,
        }
    }

    #[test]
    fn offsets_are_a_running_sum_in_declaration_order() {
        let (attrs, stride) = resolve_attributes(&[
            f32_attr(ShaderVariableType::FVec3, 0),
            f32_attr(ShaderVariableType::FVec4, 1),
            f32_attr(ShaderVariableType::FVec2, 2),
        ]);

        assert_eq!(stride, 36);
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[2].offset, 28);
    }

    #[test]
    fn mat4_counts_as_sixteen_components_in_one_slot() {
        let (attrs, stride) = resolve_attributes(&[
            f32_attr(ShaderVariableType::FMat4x4, 0),
            f32_attr(ShaderVariableType::Float, 4),
        ]);

        assert_eq!(attrs[0].component_count, 16);
        assert_eq!(attrs[1].offset, 64);
        assert_eq!(stride, 68);
    }

    #[test]
    fn instance_region_starts_after_all_vertices() {
        let layout = VertexBufferLayout::from_settings(&VertexBufferSettings {
            size: VertexBufferSize {
                vertex_count: 4,
                index_count: 6,
                instance_count: 2,
            },
            per_vertex_attributes: vec![
                f32_attr(ShaderVariableType::FVec3, 0),
                f32_attr(ShaderVariableType::FVec4, 1),
                f32_attr(ShaderVariableType::FVec2, 2),
            ],
            per_instance_attributes: vec![f32_attr(ShaderVariableType::FVec2, 3)],
            topology: RenderTopology::Triangles,
        });

        assert_eq!(layout.per_vertex_stride, 36);
        assert_eq!(layout.instance_region_offset(), 144);
        assert_eq!(layout.instances_bytes(), 16);
        assert_eq!(layout.buffer_bytes(), 160);
        assert_eq!(layout.indices_bytes(), 24);
    }

    #[test]
    fn settings_round_trip_through_layout() {
        let settings = VertexBufferSettings {
            size: VertexBufferSize {
                vertex_count: 3,
                index_count: 3,
                instance_count: 0,
            },
            per_vertex_attributes: vec![f32_attr(ShaderVariableType::FVec3, 0)],
            per_instance_attributes: vec![],
            topology: RenderTopology::Lines,
        };

        let layout = VertexBufferLayout::from_settings(&settings);
        let rebuilt = layout.to_settings(settings.size);

        assert_eq!(rebuilt.per_vertex_attributes, settings.per_vertex_attributes);
        assert_eq!(rebuilt.topology, settings.topology);
    }
}
