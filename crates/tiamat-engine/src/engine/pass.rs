//! Render pass records.
//!
//! A render pass is a fully resolved, backend-agnostic draw configuration:
//! which buffers, textures and uniforms to bind, what blend and color-mask
//! state to apply, and the dynamic counts for the draw call itself. The pass
//! descriptor is the single source of truth for static GPU state; submission
//! only supplies per-frame timing.

use bitflags::bitflags;

use crate::id::Id;

/// Blend factor for source or destination color.
///
/// Numeric discriminants are deliberately unspecified; these values must
/// never be serialized as raw integers.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AlphaBlend {
    Zero,
    One,
    SrcColor,
    SrcAlpha,
    SrcAlphaSaturate,
    DstColor,
    DstAlpha,
    ConstantColor,
    ConstantAlpha,
    OneMinusSrcColor,
    OneMinusSrcAlpha,
    OneMinusDstColor,
    OneMinusDstAlpha,
    OneMinusConstantColor,
    OneMinusConstantAlpha,
}

/// Blend equation combining the weighted source and destination.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AlphaBlendOperation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Full blend configuration of a pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AlphaBlendingOptions {
    pub src: AlphaBlend,
    pub dst: AlphaBlend,
    pub operation: AlphaBlendOperation,
    pub constant_blend_color: [f32; 4],
}

impl Default for AlphaBlendingOptions {
    /// Standard "source over" transparency.
    fn default() -> Self {
        Self {
            src: AlphaBlend::SrcAlpha,
            dst: AlphaBlend::OneMinusSrcAlpha,
            operation: AlphaBlendOperation::Add,
            constant_blend_color: [0.0; 4],
        }
    }
}

bitflags! {
    /// Optional GPU features a pass opts into.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct PassCapabilities: u32 {
        const ALPHA_BLEND = 1 << 0;
        const INSTANCED_RENDERING = 1 << 1;
    }
}

bitflags! {
    /// Color channel write mask.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct ColorMask: u32 {
        const R = 1 << 0;
        const G = 1 << 1;
        const B = 1 << 2;
        const A = 1 << 3;
        const RGB = Self::R.bits() | Self::G.bits() | Self::B.bits();
        const RGBA = Self::RGB.bits() | Self::A.bits();
    }
}

/// A resource id paired with the shader binding slot it should occupy for
/// one particular pass. The slot lives here, not on the resource, so the
/// same buffer or texture can serve different slots in different passes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct IdWithBinding {
    pub id: Id,
    pub shader_location: u32,
}

/// One ordered draw-call configuration.
///
/// The binding vectors are owned by the pass record: the registry stores its
/// own copy on insert and drops it on removal, independent of whatever the
/// caller built the pass from.
#[derive(Debug, Clone)]
pub struct RenderPass {
    pub alpha_blending: AlphaBlendingOptions,

    pub first_vertex: u32,
    pub vertex_count: u32,
    pub index_count: u32,
    /// Consulted only when `capabilities` contains `INSTANCED_RENDERING`;
    /// the non-instanced draw path ignores it entirely.
    pub instance_count: u32,

    pub uniform_vertex_buffers: Vec<IdWithBinding>,
    pub uniform_fragment_buffers: Vec<IdWithBinding>,
    pub fragment_textures: Vec<IdWithBinding>,

    pub vertex_buffer: Id,
    pub shader_program: Id,

    pub capabilities: PassCapabilities,
    pub color_mask: ColorMask,
}

impl RenderPass {
    /// Minimal pass drawing `index_count` indices from a vertex buffer with
    /// a shader program; everything else at defaults.
    pub fn new(vertex_buffer: Id, shader_program: Id, index_count: u32) -> Self {
        Self {
            alpha_blending: AlphaBlendingOptions::default(),
            first_vertex: 0,
            vertex_count: 0,
            index_count,
            instance_count: 0,
            uniform_vertex_buffers: Vec::new(),
            uniform_fragment_buffers: Vec::new(),
            fragment_textures: Vec::new(),
            vertex_buffer,
            shader_program,
            capabilities: PassCapabilities::empty(),
            color_mask: ColorMask::RGBA,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_mask_composites() {
        assert_eq!(ColorMask::RGB, ColorMask::R | ColorMask::G | ColorMask::B);
        assert!(ColorMask::RGBA.contains(ColorMask::A));
    }

    #[test]
    fn default_pass_writes_all_channels_without_extras() {
        let pass = RenderPass::new(0, 0, 6);
        assert_eq!(pass.color_mask, ColorMask::RGBA);
        assert!(pass.capabilities.is_empty());
    }
}
