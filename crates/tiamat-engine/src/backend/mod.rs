//! Render backend contract and implementations.
//!
//! The engine core never talks to a GPU API directly. For every resource
//! lifecycle operation it calls the mirrored method on a [`RenderBackend`],
//! which materializes, destroys, maps and draws GPU objects keyed by the
//! same ids the core hands to the application.
//!
//! Two implementations ship with the crate:
//! - [`wgpu::WgpuBackend`]: the real GPU path (covers Vulkan/Metal/DX/GL
//!   through wgpu itself);
//! - [`headless::HeadlessBackend`]: a CPU-only backend that records frame
//!   operations, for tests and CI machines without a GPU.

pub mod headless;
pub mod wgpu;

use crate::engine::pass::RenderPass;
use crate::engine::shader::ShaderSourceDescriptor;
use crate::engine::texture::TextureDescriptor;
use crate::engine::uniform::UniformBufferDescriptor;
use crate::engine::vertex::VertexBufferLayout;
use crate::id::Id;

/// Error raised by a backend implementation. Backends report failure through
/// these values and never panic across the trait boundary.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend allocation failed: {0}")]
    Allocation(String),

    #[error("shader compilation failed: {log}")]
    ShaderCompilation { log: String },

    #[error("unsupported {what}: {detail}")]
    Unsupported {
        what: &'static str,
        detail: String,
    },

    #[error("surface error: {0}")]
    Surface(String),
}

/// Staging bytes of one vertex buffer: the shared vertex + instance region
/// and the separate index region.
#[derive(Debug, Default)]
pub struct VertexBufferBytes {
    pub bytes: Vec<u8>,
    pub index_bytes: Vec<u8>,
}

/// GPU-side mirror of the engine's resource contexts.
///
/// Contract, uniform across resource kinds:
/// - `init_*` materializes a backend object for an id the core has already
///   allocated; on failure the core rolls the id back, so the backend must
///   leave no state behind for it.
/// - `free_*` destroys the object; the core guarantees the id was live.
/// - borrow/return pairs are scoped exclusive access to a CPU staging
///   region; return uploads the edits. The core serializes borrows, so an
///   implementation may simply move its staging vector out and back.
pub trait RenderBackend {
    // Vertex buffers.
    fn init_vertex_buffer(&mut self, id: Id, layout: &VertexBufferLayout)
    -> Result<(), BackendError>;
    fn free_vertex_buffer(&mut self, id: Id);
    fn borrow_vertex_data(&mut self, id: Id) -> Result<VertexBufferBytes, BackendError>;
    fn return_vertex_data(&mut self, id: Id, data: VertexBufferBytes);
    /// Exchanges the GPU objects (and staging) behind two live ids. Used by
    /// resize so callers holding the original id see the new storage.
    fn swap_vertex_buffers(&mut self, a: Id, b: Id);

    // Uniform buffers.
    fn init_uniform_buffer(
        &mut self,
        id: Id,
        descriptor: &UniformBufferDescriptor,
    ) -> Result<(), BackendError>;
    fn free_uniform_buffer(&mut self, id: Id);
    fn borrow_uniform_data(&mut self, id: Id) -> Result<Vec<u8>, BackendError>;
    fn return_uniform_data(&mut self, id: Id, bytes: Vec<u8>);

    // Textures.
    fn init_texture(&mut self, id: Id, descriptor: &TextureDescriptor)
    -> Result<(), BackendError>;
    fn free_texture(&mut self, id: Id);
    /// Uploads pixel data; the core has already validated the byte length
    /// against the descriptor.
    fn set_texture_data(
        &mut self,
        id: Id,
        descriptor: &TextureDescriptor,
        data: &[u8],
    ) -> Result<(), BackendError>;

    // Shader programs.
    fn init_shader_program(
        &mut self,
        id: Id,
        sources: &[ShaderSourceDescriptor],
    ) -> Result<(), BackendError>;
    fn free_shader_program(&mut self, id: Id);

    // Render passes. `prepare_pass` pre-resolves backend state (pipelines,
    // blend enum translation) once at alloc time rather than per frame.
    // Calling it again for a live id replaces that state in place; on error
    // the previous state must survive unchanged.
    fn prepare_pass(
        &mut self,
        id: Id,
        pass: &RenderPass,
        vertex_layout: &VertexBufferLayout,
    ) -> Result<(), BackendError>;
    fn free_pass(&mut self, id: Id);

    // Frame submission.
    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<(), BackendError>;
    fn draw_pass(&mut self, id: Id, pass: &RenderPass) -> Result<(), BackendError>;
    fn end_frame(&mut self) -> Result<(), BackendError>;

    /// Window framebuffer size changed.
    fn resize_surface(&mut self, width: u32, height: u32);
}
