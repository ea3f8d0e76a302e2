//! Translation of backend-agnostic descriptor enums into wgpu state.
//!
//! All conversions happen once, at pass or resource preparation time; nothing
//! here runs per frame.

use crate::backend::BackendError;
use crate::engine::pass::{
    AlphaBlend, AlphaBlendOperation, AlphaBlendingOptions, ColorMask, PassCapabilities, RenderPass,
};
use crate::engine::shader::ShaderVariableType;
use crate::engine::texture::{ChannelSwizzleVariant, MinMagFilter, TextureFormat};
use crate::engine::vertex::{RenderTopology, VertexAttribute};

pub(super) fn blend_factor(blend: AlphaBlend) -> Result<wgpu::BlendFactor, BackendError> {
    Ok(match blend {
        AlphaBlend::Zero => wgpu::BlendFactor::Zero,
        AlphaBlend::One => wgpu::BlendFactor::One,
        AlphaBlend::SrcColor => wgpu::BlendFactor::Src,
        AlphaBlend::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        AlphaBlend::SrcAlphaSaturate => wgpu::BlendFactor::SrcAlphaSaturated,
        AlphaBlend::DstColor => wgpu::BlendFactor::Dst,
        AlphaBlend::DstAlpha => wgpu::BlendFactor::DstAlpha,
        AlphaBlend::ConstantColor => wgpu::BlendFactor::Constant,
        AlphaBlend::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
        AlphaBlend::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        AlphaBlend::OneMinusDstColor => wgpu::BlendFactor::OneMinusDst,
        AlphaBlend::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        AlphaBlend::OneMinusConstantColor => wgpu::BlendFactor::OneMinusConstant,
        AlphaBlend::ConstantAlpha | AlphaBlend::OneMinusConstantAlpha => {
            // wgpu only exposes a single blend constant, not a separate
            // constant alpha.
            return Err(BackendError::Unsupported {
                what: "blend factor",
                detail: format!("{blend:?} has no wgpu equivalent"),
            });
        }
    })
}

pub(super) fn blend_operation(operation: AlphaBlendOperation) -> wgpu::BlendOperation {
    match operation {
        AlphaBlendOperation::Add => wgpu::BlendOperation::Add,
        AlphaBlendOperation::Subtract => wgpu::BlendOperation::Subtract,
        AlphaBlendOperation::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
        AlphaBlendOperation::Min => wgpu::BlendOperation::Min,
        AlphaBlendOperation::Max => wgpu::BlendOperation::Max,
    }
}

/// Blend state of a pass, or `None` when the pass did not opt into blending.
pub(super) fn blend_state(pass: &RenderPass) -> Result<Option<wgpu::BlendState>, BackendError> {
    if !pass.capabilities.contains(PassCapabilities::ALPHA_BLEND) {
        return Ok(None);
    }

    let AlphaBlendingOptions {
        src,
        dst,
        operation,
        ..
    } = pass.alpha_blending;
    let component = wgpu::BlendComponent {
        src_factor: blend_factor(src)?,
        dst_factor: blend_factor(dst)?,
        operation: blend_operation(operation),
    };

    Ok(Some(wgpu::BlendState {
        color: component,
        alpha: component,
    }))
}

pub(super) fn color_writes(mask: ColorMask) -> wgpu::ColorWrites {
    let mut writes = wgpu::ColorWrites::empty();
    if mask.contains(ColorMask::R) {
        writes |= wgpu::ColorWrites::RED;
    }
    if mask.contains(ColorMask::G) {
        writes |= wgpu::ColorWrites::GREEN;
    }
    if mask.contains(ColorMask::B) {
        writes |= wgpu::ColorWrites::BLUE;
    }
    if mask.contains(ColorMask::A) {
        writes |= wgpu::ColorWrites::ALPHA;
    }
    writes
}

pub(super) fn primitive_topology(topology: RenderTopology) -> wgpu::PrimitiveTopology {
    match topology {
        RenderTopology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        RenderTopology::Points => wgpu::PrimitiveTopology::PointList,
        RenderTopology::Lines => wgpu::PrimitiveTopology::LineList,
    }
}

pub(super) fn filter_mode(filter: MinMagFilter) -> wgpu::FilterMode {
    match filter {
        MinMagFilter::Nearest => wgpu::FilterMode::Nearest,
        MinMagFilter::Linear => wgpu::FilterMode::Linear,
    }
}

/// GPU texture format a descriptor format is stored as. RGB without alpha is
/// not a wgpu format, so 24-bit RGB data is widened to RGBA at upload.
pub(super) fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::R8 => wgpu::TextureFormat::R8Unorm,
        TextureFormat::Rgb24 | TextureFormat::Rgba32 => wgpu::TextureFormat::Rgba8Unorm,
    }
}

/// Bytes per pixel as uploaded (after any RGB widening).
pub(super) fn upload_bytes_per_pixel(format: TextureFormat) -> u32 {
    match format {
        TextureFormat::R8 => 1,
        TextureFormat::Rgb24 | TextureFormat::Rgba32 => 4,
    }
}

fn vertex_format(variable_type: ShaderVariableType) -> Result<wgpu::VertexFormat, BackendError> {
    Ok(match variable_type {
        ShaderVariableType::Float => wgpu::VertexFormat::Float32,
        ShaderVariableType::Integer => wgpu::VertexFormat::Sint32,
        ShaderVariableType::FVec2 => wgpu::VertexFormat::Float32x2,
        ShaderVariableType::FVec3 => wgpu::VertexFormat::Float32x3,
        ShaderVariableType::FVec4 => wgpu::VertexFormat::Float32x4,
        // Handled by the mat4 expansion in `expand_attributes`.
        ShaderVariableType::FMat4x4 => wgpu::VertexFormat::Float32x4,
        ShaderVariableType::Double => {
            return Err(BackendError::Unsupported {
                what: "vertex attribute type",
                detail: "f64 attributes require the VERTEX_ATTRIBUTE_64BIT feature".into(),
            });
        }
    })
}

/// Expands resolved attributes into wgpu attribute descriptors.
///
/// A mat4 occupies one declaration slot but four consecutive shader
/// locations; it is split into four vec4 columns, 16 bytes apart.
pub(super) fn expand_attributes(
    attributes: &[VertexAttribute],
) -> Result<Vec<wgpu::VertexAttribute>, BackendError> {
    let mut expanded = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        let format = vertex_format(attribute.variable_type)?;
        if attribute.variable_type == ShaderVariableType::FMat4x4 {
            for column in 0..4u32 {
                expanded.push(wgpu::VertexAttribute {
                    format,
                    offset: (attribute.offset + column * 16) as u64,
                    shader_location: attribute.location + column,
                });
            }
        } else {
            expanded.push(wgpu::VertexAttribute {
                format,
                offset: attribute.offset as u64,
                shader_location: attribute.location,
            });
        }
    }
    Ok(expanded)
}

/// Widens pixels to their upload layout and applies the channel swizzle.
pub(super) fn prepare_texture_upload(
    descriptor: &crate::engine::texture::TextureDescriptor,
    data: &[u8],
) -> Vec<u8> {
    let pixel_count = descriptor.width as usize * descriptor.height as usize;

    let mut rgba: Vec<u8> = match descriptor.format {
        TextureFormat::R8 => data.to_vec(),
        TextureFormat::Rgba32 => data.to_vec(),
        TextureFormat::Rgb24 => {
            let mut out = Vec::with_capacity(pixel_count * 4);
            for pixel in data.chunks_exact(3) {
                out.extend_from_slice(pixel);
                out.push(0xFF);
            }
            out
        }
    };

    if let Some(swizzle) = descriptor.swizzle {
        if descriptor.format == TextureFormat::R8 {
            // Single-channel textures carry the swizzle in the shader side;
            // there is nothing to permute in a 1-byte pixel.
            return rgba;
        }
        let mapping = [swizzle.red, swizzle.green, swizzle.blue, swizzle.alpha];
        for pixel in rgba.chunks_exact_mut(4) {
            let source = [pixel[0], pixel[1], pixel[2], pixel[3]];
            for (channel, variant) in pixel.iter_mut().zip(mapping) {
                *channel = match variant {
                    ChannelSwizzleVariant::Zero => 0,
                    ChannelSwizzleVariant::One => 0xFF,
                    ChannelSwizzleVariant::Red => source[0],
                    ChannelSwizzleVariant::Green => source[1],
                    ChannelSwizzleVariant::Blue => source[2],
                    ChannelSwizzleVariant::Alpha => source[3],
                };
            }
        }
    }

    rgba
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::texture::{ChannelsSwizzle, TextureDescriptor};

    #[test]
    fn rgb_pixels_widen_to_opaque_rgba() {
        let descriptor = TextureDescriptor {
            format: TextureFormat::Rgb24,
            width: 2,
            height: 1,
            swizzle: None,
            min_filter: MinMagFilter::Nearest,
            mag_filter: MinMagFilter::Nearest,
        };

        let out = prepare_texture_upload(&descriptor, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(out, vec![1, 2, 3, 0xFF, 4, 5, 6, 0xFF]);
    }

    #[test]
    fn swizzle_permutes_channels() {
        let descriptor = TextureDescriptor {
            format: TextureFormat::Rgba32,
            width: 1,
            height: 1,
            swizzle: Some(ChannelsSwizzle {
                red: ChannelSwizzleVariant::Blue,
                green: ChannelSwizzleVariant::Green,
                blue: ChannelSwizzleVariant::Red,
                alpha: ChannelSwizzleVariant::One,
            }),
            min_filter: MinMagFilter::Nearest,
            mag_filter: MinMagFilter::Nearest,
        };

        let out = prepare_texture_upload(&descriptor, &[10, 20, 30, 40]);
        assert_eq!(out, vec![30, 20, 10, 0xFF]);
    }

    #[test]
    fn mat4_splits_into_four_column_locations() {
        let attributes = [VertexAttribute {
            location: 2,
            variable_type: ShaderVariableType::FMat4x4,
            offset: 8,
            base_size: 4,
            component_count: 16,
        }];

        let expanded = expand_attributes(&attributes).unwrap();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].shader_location, 2);
        assert_eq!(expanded[3].shader_location, 5);
        assert_eq!(expanded[0].offset, 8);
        assert_eq!(expanded[3].offset, 56);
        assert!(
            expanded
                .iter()
                .all(|a| a.format == wgpu::VertexFormat::Float32x4)
        );
    }

    #[test]
    fn constant_alpha_blend_is_rejected() {
        assert!(blend_factor(AlphaBlend::ConstantAlpha).is_err());
        assert!(blend_factor(AlphaBlend::ConstantColor).is_ok());
    }
}
