//! Texture descriptors.

/// Pixel format of a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureFormat {
    /// Single 8-bit channel.
    R8,
    /// Packed 8-bit RGB, 3 bytes per pixel.
    Rgb24,
    /// 8-bit RGBA, 4 bytes per pixel.
    Rgba32,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rgb24 => 3,
            Self::Rgba32 => 4,
        }
    }
}

/// Source channel a texture channel reads from when a swizzle is applied.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChannelSwizzleVariant {
    Zero,
    One,
    Red,
    Green,
    Blue,
    Alpha,
}

/// Per-channel swizzle mapping.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ChannelsSwizzle {
    pub red: ChannelSwizzleVariant,
    pub green: ChannelSwizzleVariant,
    pub blue: ChannelSwizzleVariant,
    pub alpha: ChannelSwizzleVariant,
}

impl Default for ChannelsSwizzle {
    /// Identity mapping.
    fn default() -> Self {
        Self {
            red: ChannelSwizzleVariant::Red,
            green: ChannelSwizzleVariant::Green,
            blue: ChannelSwizzleVariant::Blue,
            alpha: ChannelSwizzleVariant::Alpha,
        }
    }
}

/// Minification/magnification filter.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MinMagFilter {
    Nearest,
    Linear,
}

/// Creation parameters for a texture. Immutable once allocated except for
/// the pixel data itself.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextureDescriptor {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub swizzle: Option<ChannelsSwizzle>,
    pub min_filter: MinMagFilter,
    pub mag_filter: MinMagFilter,
}

impl TextureDescriptor {
    /// Exact byte size `set_data` payloads must have.
    pub fn data_bytes(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_bytes_follows_format_layout() {
        let descriptor = TextureDescriptor {
            format: TextureFormat::Rgb24,
            width: 4,
            height: 2,
            swizzle: None,
            min_filter: MinMagFilter::Nearest,
            mag_filter: MinMagFilter::Nearest,
        };

        assert_eq!(descriptor.data_bytes(), 24);
    }
}
