//! Engine state: resource contexts and frame submission.
//!
//! [`Engine`] owns one pool per resource kind (vertex buffers, uniform
//! buffers, textures, shader programs) plus the ordered render pass
//! registry, and drives a [`RenderBackend`] that mirrors every lifecycle
//! operation with the actual GPU work. All state is explicit; nothing lives
//! in globals.

pub mod error;
pub mod pass;
pub mod pool;
pub mod shader;
pub mod texture;
pub mod uniform;
pub mod vertex;

use crate::backend::{RenderBackend, VertexBufferBytes};
use crate::id::Id;

pub use error::{EngineError, ResourceKind};

use pass::RenderPass;
use pool::{OrderedPool, Pool};
use shader::{ShaderProgramDescriptor, ShaderSourceDescriptor};
use texture::TextureDescriptor;
use uniform::{UniformBufferData, UniformBufferDescriptor};
use vertex::{VertexBufferData, VertexBufferLayout, VertexBufferSettings, VertexBufferSize};

/// Initial id-table capacity of every resource context.
const INITIAL_CONTEXT_CAPACITY: u32 = 10;

struct VertexBufferSlot {
    layout: VertexBufferLayout,
    borrowed: bool,
}

struct UniformBufferSlot {
    descriptor: UniformBufferDescriptor,
    borrowed: bool,
}

/// Central engine state, passed explicitly to every subsystem call.
///
/// Single-threaded by design: the run loop, all callbacks and all GPU work
/// happen on the thread that owns the backend. Borrow/return pairs must not
/// be held across a frame boundary.
pub struct Engine<B: RenderBackend> {
    backend: B,

    vertex_buffers: Pool<VertexBufferSlot>,
    uniform_buffers: Pool<UniformBufferSlot>,
    textures: Pool<TextureDescriptor>,
    shaders: Pool<ShaderProgramDescriptor>,
    passes: OrderedPool<RenderPass>,

    clear_color: [f32; 4],
}

impl<B: RenderBackend> Engine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            vertex_buffers: Pool::new(INITIAL_CONTEXT_CAPACITY),
            uniform_buffers: Pool::new(INITIAL_CONTEXT_CAPACITY),
            textures: Pool::new(INITIAL_CONTEXT_CAPACITY),
            shaders: Pool::new(INITIAL_CONTEXT_CAPACITY),
            passes: OrderedPool::new(INITIAL_CONTEXT_CAPACITY),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    // ── vertex buffers ────────────────────────────────────────────────────

    /// Allocates a vertex buffer, computing attribute offsets and strides
    /// from the declarations (declaration order is memory layout order).
    pub fn vertex_buffer_alloc(
        &mut self,
        settings: &VertexBufferSettings,
    ) -> Result<Id, EngineError> {
        let layout = VertexBufferLayout::from_settings(settings);
        let backend_layout = layout.clone();
        let id = self.vertex_buffers.insert(VertexBufferSlot {
            layout,
            borrowed: false,
        });

        if let Err(err) = self.backend.init_vertex_buffer(id, &backend_layout) {
            // Roll the id back so no live handle points at uninitialized
            // backend storage.
            let _ = self.vertex_buffers.remove(id);
            return Err(err.into());
        }

        Ok(id)
    }

    pub fn vertex_buffer_free(&mut self, id: Id) -> Result<(), EngineError> {
        let slot = self
            .vertex_buffers
            .get(id)
            .map_err(|_| dead(ResourceKind::VertexBuffer, id))?;
        if slot.borrowed {
            return Err(EngineError::AlreadyBorrowed {
                kind: ResourceKind::VertexBuffer,
                id,
            });
        }

        self.backend.free_vertex_buffer(id);
        let _ = self.vertex_buffers.remove(id);
        Ok(())
    }

    pub fn vertex_buffer_layout(&self, id: Id) -> Result<&VertexBufferLayout, EngineError> {
        self.vertex_buffers
            .get(id)
            .map(|slot| &slot.layout)
            .map_err(|_| dead(ResourceKind::VertexBuffer, id))
    }

    /// Takes exclusive hold of the buffer's staging bytes. Fails if the same
    /// buffer is already borrowed; nesting borrows of one resource is a
    /// contract violation, not a supported pattern.
    pub fn vertex_buffer_borrow_data(&mut self, id: Id) -> Result<VertexBufferData, EngineError> {
        let slot = self
            .vertex_buffers
            .get_mut(id)
            .map_err(|_| dead(ResourceKind::VertexBuffer, id))?;
        if slot.borrowed {
            return Err(EngineError::AlreadyBorrowed {
                kind: ResourceKind::VertexBuffer,
                id,
            });
        }

        slot.borrowed = true;
        let layout = slot.layout.clone();
        let data = self.backend.borrow_vertex_data(id)?;

        Ok(VertexBufferData {
            bytes: data.bytes,
            index_bytes: data.index_bytes,
            layout,
        })
    }

    /// Hands the staging bytes back and uploads the edits.
    pub fn vertex_buffer_return_data(
        &mut self,
        id: Id,
        data: VertexBufferData,
    ) -> Result<(), EngineError> {
        let slot = self
            .vertex_buffers
            .get_mut(id)
            .map_err(|_| dead(ResourceKind::VertexBuffer, id))?;
        if !slot.borrowed {
            return Err(EngineError::NotBorrowed {
                kind: ResourceKind::VertexBuffer,
                id,
            });
        }

        slot.borrowed = false;
        self.backend.return_vertex_data(
            id,
            VertexBufferBytes {
                bytes: data.bytes,
                index_bytes: data.index_bytes,
            },
        );
        Ok(())
    }

    /// Resizes a vertex buffer while preserving the caller-held id.
    ///
    /// A temporary buffer with the new size is allocated, the vertex, index
    /// and instance regions are copied independently (each clamped to the
    /// smaller of the old and new extents), then the two ids swap storage
    /// and the temporary id is freed. Render passes referencing `id` keep
    /// working untouched.
    pub fn vertex_buffer_resize(
        &mut self,
        id: Id,
        new_size: VertexBufferSize,
    ) -> Result<(), EngineError> {
        let old_layout = self.vertex_buffer_layout(id)?.clone();
        let settings = old_layout.to_settings(new_size);
        let temp_id = self.vertex_buffer_alloc(&settings)?;

        let result = self.copy_vertex_regions(id, temp_id, &old_layout);
        if let Err(err) = result {
            let _ = self.vertex_buffer_free(temp_id);
            return Err(err);
        }

        self.backend.swap_vertex_buffers(id, temp_id);
        self.vertex_buffers
            .swap(id, temp_id)
            .map_err(|e| dead(ResourceKind::VertexBuffer, e.0))?;
        self.vertex_buffer_free(temp_id)?;
        Ok(())
    }

    fn copy_vertex_regions(
        &mut self,
        src: Id,
        dst: Id,
        src_layout: &VertexBufferLayout,
    ) -> Result<(), EngineError> {
        let src_data = self.vertex_buffer_borrow_data(src)?;
        let mut dst_data = match self.vertex_buffer_borrow_data(dst) {
            Ok(data) => data,
            Err(err) => {
                self.vertex_buffer_return_data(src, src_data)?;
                return Err(err);
            }
        };
        let dst_layout = dst_data.layout.clone();

        let vertex_bytes = src_layout.vertices_bytes().min(dst_layout.vertices_bytes());
        dst_data.vertex_data_mut()[..vertex_bytes]
            .copy_from_slice(&src_data.vertex_data()[..vertex_bytes]);

        let instance_bytes = src_layout
            .instances_bytes()
            .min(dst_layout.instances_bytes());
        dst_data.instance_data_mut()[..instance_bytes]
            .copy_from_slice(&src_data.instance_data()[..instance_bytes]);

        let index_bytes = src_layout.indices_bytes().min(dst_layout.indices_bytes());
        dst_data.index_bytes[..index_bytes].copy_from_slice(&src_data.index_bytes[..index_bytes]);

        self.vertex_buffer_return_data(dst, dst_data)?;
        self.vertex_buffer_return_data(src, src_data)?;
        Ok(())
    }

    // ── uniform buffers ───────────────────────────────────────────────────

    pub fn uniform_buffer_alloc(
        &mut self,
        descriptor: UniformBufferDescriptor,
    ) -> Result<Id, EngineError> {
        let id = self.uniform_buffers.insert(UniformBufferSlot {
            descriptor,
            borrowed: false,
        });

        if let Err(err) = self.backend.init_uniform_buffer(id, &descriptor) {
            let _ = self.uniform_buffers.remove(id);
            return Err(err.into());
        }

        Ok(id)
    }

    pub fn uniform_buffer_free(&mut self, id: Id) -> Result<(), EngineError> {
        let slot = self
            .uniform_buffers
            .get(id)
            .map_err(|_| dead(ResourceKind::UniformBuffer, id))?;
        if slot.borrowed {
            return Err(EngineError::AlreadyBorrowed {
                kind: ResourceKind::UniformBuffer,
                id,
            });
        }

        self.backend.free_uniform_buffer(id);
        let _ = self.uniform_buffers.remove(id);
        Ok(())
    }

    pub fn uniform_buffer_descriptor(
        &self,
        id: Id,
    ) -> Result<UniformBufferDescriptor, EngineError> {
        self.uniform_buffers
            .get(id)
            .map(|slot| slot.descriptor)
            .map_err(|_| dead(ResourceKind::UniformBuffer, id))
    }

    pub fn uniform_buffer_borrow_data(&mut self, id: Id) -> Result<UniformBufferData, EngineError> {
        let slot = self
            .uniform_buffers
            .get_mut(id)
            .map_err(|_| dead(ResourceKind::UniformBuffer, id))?;
        if slot.borrowed {
            return Err(EngineError::AlreadyBorrowed {
                kind: ResourceKind::UniformBuffer,
                id,
            });
        }

        slot.borrowed = true;
        let bytes = self.backend.borrow_uniform_data(id)?;
        Ok(UniformBufferData { bytes })
    }

    pub fn uniform_buffer_return_data(
        &mut self,
        id: Id,
        data: UniformBufferData,
    ) -> Result<(), EngineError> {
        let slot = self
            .uniform_buffers
            .get_mut(id)
            .map_err(|_| dead(ResourceKind::UniformBuffer, id))?;
        if !slot.borrowed {
            return Err(EngineError::NotBorrowed {
                kind: ResourceKind::UniformBuffer,
                id,
            });
        }

        slot.borrowed = false;
        self.backend.return_uniform_data(id, data.bytes);
        Ok(())
    }

    // ── textures ──────────────────────────────────────────────────────────

    pub fn texture_alloc(&mut self, descriptor: TextureDescriptor) -> Result<Id, EngineError> {
        let id = self.textures.insert(descriptor);

        if let Err(err) = self.backend.init_texture(id, &descriptor) {
            let _ = self.textures.remove(id);
            return Err(err.into());
        }

        Ok(id)
    }

    pub fn texture_free(&mut self, id: Id) -> Result<(), EngineError> {
        self.textures
            .get(id)
            .map_err(|_| dead(ResourceKind::Texture, id))?;
        self.backend.free_texture(id);
        let _ = self.textures.remove(id);
        Ok(())
    }

    pub fn texture_descriptor(&self, id: Id) -> Result<TextureDescriptor, EngineError> {
        self.textures
            .get(id)
            .copied()
            .map_err(|_| dead(ResourceKind::Texture, id))
    }

    /// Uploads pixel data. The payload must match the declared
    /// width × height × format byte layout exactly.
    pub fn texture_set_data(&mut self, id: Id, data: &[u8]) -> Result<(), EngineError> {
        let descriptor = *self
            .textures
            .get(id)
            .map_err(|_| dead(ResourceKind::Texture, id))?;

        let expected = descriptor.data_bytes();
        if data.len() != expected {
            return Err(EngineError::TextureDataSize {
                expected,
                actual: data.len(),
            });
        }

        self.backend.set_texture_data(id, &descriptor, data)?;
        Ok(())
    }

    // ── shader programs ───────────────────────────────────────────────────

    /// Compiles and links the stage sources into one backend program.
    /// Compile or link failure surfaces as a single error carrying the
    /// backend's diagnostic text; no partial program survives.
    pub fn shader_program_alloc(
        &mut self,
        sources: Vec<ShaderSourceDescriptor>,
    ) -> Result<Id, EngineError> {
        let backend_sources = sources.clone();
        let id = self.shaders.insert(ShaderProgramDescriptor { sources });

        if let Err(err) = self.backend.init_shader_program(id, &backend_sources) {
            let _ = self.shaders.remove(id);
            return Err(err.into());
        }

        Ok(id)
    }

    pub fn shader_program_free(&mut self, id: Id) -> Result<(), EngineError> {
        self.shaders
            .get(id)
            .map_err(|_| dead(ResourceKind::ShaderProgram, id))?;
        self.backend.free_shader_program(id);
        let _ = self.shaders.remove(id);
        Ok(())
    }

    // ── render passes ─────────────────────────────────────────────────────

    /// Registers a render pass, establishing its position in the submission
    /// order (insertion order among live passes). The backend pre-resolves
    /// derived state (blend translation, pipelines) here, once, rather than
    /// per frame.
    pub fn render_pass_alloc(&mut self, pass: RenderPass) -> Result<Id, EngineError> {
        // All referenced handles must be live before the pass is stored;
        // passes reference resources but never own them.
        self.shaders
            .get(pass.shader_program)
            .map_err(|_| dead(ResourceKind::ShaderProgram, pass.shader_program))?;
        for binding in pass
            .uniform_vertex_buffers
            .iter()
            .chain(&pass.uniform_fragment_buffers)
        {
            self.uniform_buffers
                .get(binding.id)
                .map_err(|_| dead(ResourceKind::UniformBuffer, binding.id))?;
        }
        for binding in &pass.fragment_textures {
            self.textures
                .get(binding.id)
                .map_err(|_| dead(ResourceKind::Texture, binding.id))?;
        }

        let vertex_layout = self
            .vertex_buffers
            .get(pass.vertex_buffer)
            .map_err(|_| dead(ResourceKind::VertexBuffer, pass.vertex_buffer))?
            .layout
            .clone();

        let backend_pass = pass.clone();
        let id = self.passes.insert(pass);
        if let Err(err) = self.backend.prepare_pass(id, &backend_pass, &vertex_layout) {
            let _ = self.passes.remove(id);
            return Err(err.into());
        }

        Ok(id)
    }

    pub fn render_pass_free(&mut self, id: Id) -> Result<(), EngineError> {
        self.passes
            .get(id)
            .map_err(|_| dead(ResourceKind::RenderPass, id))?;
        self.backend.free_pass(id);
        let _ = self.passes.remove(id);
        Ok(())
    }

    /// Takes a copy of a stored pass for editing. Hand it back through
    /// [`render_pass_return`] to apply the edits in place (the pass keeps
    /// its id and submission position).
    ///
    /// [`render_pass_return`]: Engine::render_pass_return
    pub fn render_pass_borrow(&self, id: Id) -> Result<RenderPass, EngineError> {
        self.passes
            .get(id)
            .cloned()
            .map_err(|_| dead(ResourceKind::RenderPass, id))
    }

    /// Stores an edited pass and re-runs backend pre-resolution so changed
    /// static state (blend options, masks) takes effect next frame.
    pub fn render_pass_return(&mut self, id: Id, pass: RenderPass) -> Result<(), EngineError> {
        self.passes
            .get(id)
            .map_err(|_| dead(ResourceKind::RenderPass, id))?;

        let vertex_layout = self
            .vertex_buffers
            .get(pass.vertex_buffer)
            .map_err(|_| dead(ResourceKind::VertexBuffer, pass.vertex_buffer))?
            .layout
            .clone();

        // prepare_pass overwrites the backend slot in place, so a failed
        // re-preparation leaves the previous pipeline intact and the stored
        // record untouched.
        self.backend.prepare_pass(id, &pass, &vertex_layout)?;
        *self
            .passes
            .get_mut(id)
            .map_err(|_| dead(ResourceKind::RenderPass, id))? = pass;
        Ok(())
    }

    /// Live pass ids in submission order.
    pub fn render_pass_order(&self) -> &[Id] {
        self.passes.ordered_ids()
    }

    // ── frame submission ──────────────────────────────────────────────────

    /// Draws one frame: clears to the engine clear color, then submits every
    /// live render pass in stable insertion order. Zero passes still clear.
    pub fn draw_frame(&mut self) -> Result<(), EngineError> {
        self.backend.begin_frame(self.clear_color)?;

        // Submission order is load-bearing: overlapping geometry relies on
        // painter's-algorithm blending, so passes are never reordered.
        for id in self.passes.ordered_ids().to_vec() {
            if let Ok(pass) = self.passes.get(id) {
                self.backend.draw_pass(id, pass)?;
            }
        }

        self.backend.end_frame()?;
        Ok(())
    }

    /// Tears down every resource context in reverse dependency order:
    /// render passes first (they reference everything else), then textures,
    /// uniform and vertex buffers, then shader programs.
    pub fn finalize(&mut self) {
        for id in self.passes.ordered_ids().to_vec() {
            let _ = self.render_pass_free(id);
        }
        for id in self.textures.live_ids() {
            let _ = self.texture_free(id);
        }
        for id in self.uniform_buffers.live_ids() {
            let _ = self.uniform_buffer_free(id);
        }
        for id in self.vertex_buffers.live_ids() {
            let _ = self.vertex_buffer_free(id);
        }
        for id in self.shaders.live_ids() {
            let _ = self.shader_program_free(id);
        }
    }

    /// Forwards a framebuffer size change to the backend.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        self.backend.resize_surface(width, height);
    }

    /// Direct backend access, for runtime integration and tests.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

fn dead(kind: ResourceKind, id: Id) -> EngineError {
    EngineError::InvalidId { kind, id }
}

#[cfg(test)]
mod tests;
