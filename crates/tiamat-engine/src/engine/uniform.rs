//! Uniform buffer descriptors.
//!
//! A uniform buffer is a fixed-size opaque blob. Its shader binding slot is
//! chosen per render pass (see [`IdWithBinding`]), never at creation time, so
//! one buffer can serve different slots in different passes.
//!
//! [`IdWithBinding`]: crate::engine::pass::IdWithBinding

use crate::engine::error::EngineError;

/// Creation parameters for a uniform buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformBufferDescriptor {
    pub data_bytes: usize,
}

/// Exclusive CPU-side view of a uniform buffer's staging bytes. Hand it back
/// through [`Engine::uniform_buffer_return_data`] to upload the edits.
///
/// [`Engine::uniform_buffer_return_data`]: crate::engine::Engine::uniform_buffer_return_data
#[derive(Debug)]
pub struct UniformBufferData {
    pub(crate) bytes: Vec<u8>,
}

impl UniformBufferData {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Writes a plain-old-data value at a byte offset. Fails if the value
    /// does not fit inside the buffer at that offset.
    pub fn write<T: bytemuck::NoUninit>(&mut self, offset: usize, value: &T) -> Result<(), EngineError> {
        let raw = bytemuck::bytes_of(value);
        let end = offset
            .checked_add(raw.len())
            .filter(|end| *end <= self.bytes.len())
            .ok_or(EngineError::UniformWriteRange {
                offset,
                len: raw.len(),
                capacity: self.bytes.len(),
            })?;
        self.bytes[offset..end].copy_from_slice(raw);
        Ok(())
    }
}
