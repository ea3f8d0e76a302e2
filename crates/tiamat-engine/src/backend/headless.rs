//! CPU-only backend that records frame operations instead of drawing.
//!
//! Every resource becomes a plain staging allocation in a hash map and every
//! frame call appends a [`FrameEvent`], so tests can assert on submission
//! order, draw parameters and teardown without a GPU.

use std::collections::HashMap;

use log::trace;

use super::{BackendError, RenderBackend, VertexBufferBytes};
use crate::engine::pass::{PassCapabilities, RenderPass};
use crate::engine::shader::ShaderSourceDescriptor;
use crate::engine::texture::TextureDescriptor;
use crate::engine::uniform::UniformBufferDescriptor;
use crate::engine::vertex::VertexBufferLayout;
use crate::id::Id;

/// One recorded frame operation.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    Clear {
        color: [f32; 4],
    },
    DrawIndexed {
        pass: Id,
        index_count: u32,
        first_vertex: u32,
    },
    Draw {
        pass: Id,
        vertex_count: u32,
        first_vertex: u32,
    },
    DrawInstanced {
        pass: Id,
        index_count: u32,
        first_vertex: u32,
        instance_count: u32,
    },
    Present,
}

struct HeadlessVertexBuffer {
    bytes: Vec<u8>,
    index_bytes: Vec<u8>,
}

/// Recording backend. Resources are staging allocations keyed by id; frames
/// append to [`events`](HeadlessBackend::events).
#[derive(Default)]
pub struct HeadlessBackend {
    vertex_buffers: HashMap<Id, HeadlessVertexBuffer>,
    uniform_buffers: HashMap<Id, Vec<u8>>,
    textures: HashMap<Id, Vec<u8>>,
    shaders: HashMap<Id, usize>,
    passes: HashMap<Id, ()>,

    /// When set, the next `init_*` call fails with an allocation error and
    /// clears the flag. Exercises the caller's rollback path.
    pub fail_next_init: bool,

    pub events: Vec<FrameEvent>,
    pub surface_size: (u32, u32),
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_buffer_bytes(&self, id: Id) -> Option<&[u8]> {
        self.vertex_buffers.get(&id).map(|b| b.bytes.as_slice())
    }

    pub fn texture_bytes(&self, id: Id) -> Option<&[u8]> {
        self.textures.get(&id).map(Vec::as_slice)
    }

    pub fn live_resource_count(&self) -> usize {
        self.vertex_buffers.len()
            + self.uniform_buffers.len()
            + self.textures.len()
            + self.shaders.len()
            + self.passes.len()
    }

    fn check_fault(&mut self, what: &str) -> Result<(), BackendError> {
        if self.fail_next_init {
            self.fail_next_init = false;
            return Err(BackendError::Allocation(format!(
                "injected {what} failure"
            )));
        }
        Ok(())
    }
}

impl RenderBackend for HeadlessBackend {
    fn init_vertex_buffer(
        &mut self,
        id: Id,
        layout: &VertexBufferLayout,
    ) -> Result<(), BackendError> {
        self.check_fault("vertex buffer")?;
        self.vertex_buffers.insert(
            id,
            HeadlessVertexBuffer {
                bytes: vec![0; layout.buffer_bytes()],
                index_bytes: vec![0; layout.indices_bytes()],
            },
        );
        Ok(())
    }

    fn free_vertex_buffer(&mut self, id: Id) {
        self.vertex_buffers.remove(&id);
    }

    fn borrow_vertex_data(&mut self, id: Id) -> Result<VertexBufferBytes, BackendError> {
        let buffer = self
            .vertex_buffers
            .get_mut(&id)
            .ok_or_else(|| BackendError::Allocation(format!("no vertex buffer {id}")))?;
        Ok(VertexBufferBytes {
            bytes: std::mem::take(&mut buffer.bytes),
            index_bytes: std::mem::take(&mut buffer.index_bytes),
        })
    }

    fn return_vertex_data(&mut self, id: Id, data: VertexBufferBytes) {
        if let Some(buffer) = self.vertex_buffers.get_mut(&id) {
            buffer.bytes = data.bytes;
            buffer.index_bytes = data.index_bytes;
        }
    }

    fn swap_vertex_buffers(&mut self, a: Id, b: Id) {
        if let (Some(buf_a), Some(buf_b)) = (
            self.vertex_buffers.remove(&a),
            self.vertex_buffers.remove(&b),
        ) {
            self.vertex_buffers.insert(a, buf_b);
            self.vertex_buffers.insert(b, buf_a);
        }
    }

    fn init_uniform_buffer(
        &mut self,
        id: Id,
        descriptor: &UniformBufferDescriptor,
    ) -> Result<(), BackendError> {
        self.check_fault("uniform buffer")?;
        self.uniform_buffers
            .insert(id, vec![0; descriptor.data_bytes]);
        Ok(())
    }

    fn free_uniform_buffer(&mut self, id: Id) {
        self.uniform_buffers.remove(&id);
    }

    fn borrow_uniform_data(&mut self, id: Id) -> Result<Vec<u8>, BackendError> {
        let buffer = self
            .uniform_buffers
            .get_mut(&id)
            .ok_or_else(|| BackendError::Allocation(format!("no uniform buffer {id}")))?;
        Ok(std::mem::take(buffer))
    }

    fn return_uniform_data(&mut self, id: Id, bytes: Vec<u8>) {
        if let Some(buffer) = self.uniform_buffers.get_mut(&id) {
            *buffer = bytes;
        }
    }

    fn init_texture(&mut self, id: Id, descriptor: &TextureDescriptor) -> Result<(), BackendError> {
        self.check_fault("texture")?;
        self.textures.insert(id, vec![0; descriptor.data_bytes()]);
        Ok(())
    }

    fn free_texture(&mut self, id: Id) {
        self.textures.remove(&id);
    }

    fn set_texture_data(
        &mut self,
        id: Id,
        _descriptor: &TextureDescriptor,
        data: &[u8],
    ) -> Result<(), BackendError> {
        let texture = self
            .textures
            .get_mut(&id)
            .ok_or_else(|| BackendError::Allocation(format!("no texture {id}")))?;
        texture.clear();
        texture.extend_from_slice(data);
        Ok(())
    }

    fn init_shader_program(
        &mut self,
        id: Id,
        sources: &[ShaderSourceDescriptor],
    ) -> Result<(), BackendError> {
        self.check_fault("shader program")?;
        self.shaders.insert(id, sources.len());
        Ok(())
    }

    fn free_shader_program(&mut self, id: Id) {
        self.shaders.remove(&id);
    }

    fn prepare_pass(
        &mut self,
        id: Id,
        _pass: &RenderPass,
        _vertex_layout: &VertexBufferLayout,
    ) -> Result<(), BackendError> {
        self.check_fault("render pass")?;
        self.passes.insert(id, ());
        Ok(())
    }

    fn free_pass(&mut self, id: Id) {
        self.passes.remove(&id);
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<(), BackendError> {
        self.events.push(FrameEvent::Clear { color: clear_color });
        Ok(())
    }

    fn draw_pass(&mut self, id: Id, pass: &RenderPass) -> Result<(), BackendError> {
        // Mirrors the GPU path: a zero index count means a plain vertex-range
        // draw instead of an indexed one.
        if pass.capabilities.contains(PassCapabilities::INSTANCED_RENDERING) {
            self.events.push(FrameEvent::DrawInstanced {
                pass: id,
                index_count: pass.index_count,
                first_vertex: pass.first_vertex,
                instance_count: pass.instance_count,
            });
        } else if pass.index_count > 0 {
            self.events.push(FrameEvent::DrawIndexed {
                pass: id,
                index_count: pass.index_count,
                first_vertex: pass.first_vertex,
            });
        } else {
            self.events.push(FrameEvent::Draw {
                pass: id,
                vertex_count: pass.vertex_count,
                first_vertex: pass.first_vertex,
            });
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        self.events.push(FrameEvent::Present);
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        trace!("headless surface resized to {width}x{height}");
        self.surface_size = (width, height);
    }
}
