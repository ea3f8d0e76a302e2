//! wgpu implementation of the render backend.
//!
//! Resources live in hash maps keyed by the engine's ids, each pairing the
//! GPU object with a CPU staging copy for the borrow/return protocol. Pass
//! preparation builds the full render pipeline up front (blend state, color
//! mask and vertex layout are baked in), so frame submission only binds and
//! draws.

mod convert;
mod surface;

use std::collections::HashMap;

use anyhow::{Context, Result};
use log::{debug, warn};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::{BackendError, RenderBackend, VertexBufferBytes};
use crate::engine::pass::{PassCapabilities, RenderPass};
use crate::engine::shader::{ShaderSourceDescriptor, ShaderStage};
use crate::engine::texture::TextureDescriptor;
use crate::engine::uniform::UniformBufferDescriptor;
use crate::engine::vertex::VertexBufferLayout;
use crate::id::Id;

pub use surface::SurfaceErrorAction;

/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct WgpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior). FIFO is broadly supported.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode
    /// is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features. Favor an empty set for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface. This value is a hint;
    /// support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for WgpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

struct GpuVertexBuffer {
    buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    staging: VertexBufferBytes,
    layout: VertexBufferLayout,
}

struct GpuUniformBuffer {
    buffer: wgpu::Buffer,
    staging: Vec<u8>,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

struct GpuShaderStage {
    module: wgpu::ShaderModule,
    entry_point: String,
}

struct GpuShaderProgram {
    vertex: GpuShaderStage,
    fragment: GpuShaderStage,
}

/// Bind group assignment, fixed across all passes:
/// group 0 holds vertex-stage uniforms, group 1 fragment-stage uniforms,
/// group 2 fragment textures (texture at `2 * slot`, sampler at
/// `2 * slot + 1`).
struct GpuPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layouts: [wgpu::BindGroupLayout; 3],
}

struct FrameState {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// The real GPU path. The surface lifetime is tied to the window; the
/// architecture must ensure the window outlives the backend.
pub struct WgpuBackend<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,

    vertex_buffers: HashMap<Id, GpuVertexBuffer>,
    uniform_buffers: HashMap<Id, GpuUniformBuffer>,
    textures: HashMap<Id, GpuTexture>,
    shaders: HashMap<Id, GpuShaderProgram>,
    passes: HashMap<Id, GpuPass>,

    frame: Option<FrameState>,
}

impl<'w> WgpuBackend<'w> {
    /// Creates a GPU backend bound to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: WgpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let WgpuInit {
            prefer_srgb,
            present_mode,
            alpha_mode,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tiamat-engine device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&surface_caps, prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = surface::choose_alpha_mode(&surface_caps, alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);
        debug!("wgpu backend ready: {format:?}, {}x{}", size.width, size.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            vertex_buffers: HashMap::new(),
            uniform_buffers: HashMap::new(),
            textures: HashMap::new(),
            shaders: HashMap::new(),
            passes: HashMap::new(),
            frame: None,
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn compile_stage(&self, source: &ShaderSourceDescriptor) -> Result<GpuShaderStage, BackendError> {
        // An error scope turns the otherwise-async validation failure into a
        // synchronous compile diagnostic.
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: None,
                source: wgpu::ShaderSource::Wgsl(source.source.as_str().into()),
            });
        if let Some(error) = pollster::block_on(scope.pop()) {
            return Err(BackendError::ShaderCompilation {
                log: error.to_string(),
            });
        }

        Ok(GpuShaderStage {
            module,
            entry_point: source.entry_point.clone(),
        })
    }

    fn pass_bind_group_layouts(
        &self,
        pass: &RenderPass,
    ) -> [wgpu::BindGroupLayout; 3] {
        let uniform_entries = |bindings: &[crate::engine::pass::IdWithBinding],
                               visibility: wgpu::ShaderStages| {
            bindings
                .iter()
                .map(|binding| wgpu::BindGroupLayoutEntry {
                    binding: binding.shader_location,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                })
                .collect::<Vec<_>>()
        };

        let vertex_uniforms = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tiamat vertex uniforms"),
                entries: &uniform_entries(&pass.uniform_vertex_buffers, wgpu::ShaderStages::VERTEX),
            });
        let fragment_uniforms =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("tiamat fragment uniforms"),
                    entries: &uniform_entries(
                        &pass.uniform_fragment_buffers,
                        wgpu::ShaderStages::FRAGMENT,
                    ),
                });

        let mut texture_entries = Vec::new();
        for binding in &pass.fragment_textures {
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding: binding.shader_location * 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding: binding.shader_location * 2 + 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
        let textures = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tiamat fragment textures"),
                entries: &texture_entries,
            });

        [vertex_uniforms, fragment_uniforms, textures]
    }

    /// Builds the three per-pass bind groups. Groups are rebuilt every draw,
    /// not cached, so buffer swaps from resize take effect immediately.
    fn pass_bind_groups(
        &self,
        pass: &RenderPass,
        layouts: &[wgpu::BindGroupLayout; 3],
    ) -> Result<[wgpu::BindGroup; 3], BackendError> {
        let uniform_group = |bindings: &[crate::engine::pass::IdWithBinding],
                             layout: &wgpu::BindGroupLayout|
         -> Result<wgpu::BindGroup, BackendError> {
            let mut entries = Vec::with_capacity(bindings.len());
            for binding in bindings {
                let buffer = self.uniform_buffers.get(&binding.id).ok_or_else(|| {
                    BackendError::Allocation(format!("no uniform buffer {}", binding.id))
                })?;
                entries.push(wgpu::BindGroupEntry {
                    binding: binding.shader_location,
                    resource: buffer.buffer.as_entire_binding(),
                });
            }
            Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: None,
                layout,
                entries: &entries,
            }))
        };

        let vertex_uniforms = uniform_group(&pass.uniform_vertex_buffers, &layouts[0])?;
        let fragment_uniforms = uniform_group(&pass.uniform_fragment_buffers, &layouts[1])?;

        let mut texture_entries = Vec::new();
        for binding in &pass.fragment_textures {
            let texture = self.textures.get(&binding.id).ok_or_else(|| {
                BackendError::Allocation(format!("no texture {}", binding.id))
            })?;
            texture_entries.push(wgpu::BindGroupEntry {
                binding: binding.shader_location * 2,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            texture_entries.push(wgpu::BindGroupEntry {
                binding: binding.shader_location * 2 + 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }
        let textures = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &layouts[2],
            entries: &texture_entries,
        });

        Ok([vertex_uniforms, fragment_uniforms, textures])
    }
}

impl RenderBackend for WgpuBackend<'_> {
    fn init_vertex_buffer(
        &mut self,
        id: Id,
        layout: &VertexBufferLayout,
    ) -> Result<(), BackendError> {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tiamat vertex buffer"),
            size: layout.buffer_bytes() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tiamat index buffer"),
            size: layout.indices_bytes() as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.vertex_buffers.insert(
            id,
            GpuVertexBuffer {
                buffer,
                index_buffer,
                staging: VertexBufferBytes {
                    bytes: vec![0; layout.buffer_bytes()],
                    index_bytes: vec![0; layout.indices_bytes()],
                },
                layout: layout.clone(),
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
        Ok(std::mem::take(&mut buffer.staging))
    }

    fn return_vertex_data(&mut self, id: Id, data: VertexBufferBytes) {
        let Some(buffer) = self.vertex_buffers.get_mut(&id) else {
            return;
        };
        self.queue.write_buffer(&buffer.buffer, 0, &data.bytes);
        self.queue
            .write_buffer(&buffer.index_buffer, 0, &data.index_bytes);
        buffer.staging = data;
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
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tiamat uniform buffer"),
            size: descriptor.data_bytes as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.uniform_buffers.insert(
            id,
            GpuUniformBuffer {
                buffer,
                staging: vec![0; descriptor.data_bytes],
            },
        );
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
        Ok(std::mem::take(&mut buffer.staging))
    }

    fn return_uniform_data(&mut self, id: Id, bytes: Vec<u8>) {
        let Some(buffer) = self.uniform_buffers.get_mut(&id) else {
            return;
        };
        self.queue.write_buffer(&buffer.buffer, 0, &bytes);
        buffer.staging = bytes;
    }

    fn init_texture(&mut self, id: Id, descriptor: &TextureDescriptor) -> Result<(), BackendError> {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tiamat texture"),
            size: wgpu::Extent3d {
                width: descriptor.width,
                height: descriptor.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: convert::texture_format(descriptor.format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tiamat sampler"),
            min_filter: convert::filter_mode(descriptor.min_filter),
            mag_filter: convert::filter_mode(descriptor.mag_filter),
            ..Default::default()
        });

        self.textures.insert(
            id,
            GpuTexture {
                texture,
                view,
                sampler,
            },
        );
        Ok(())
    }

    fn free_texture(&mut self, id: Id) {
        self.textures.remove(&id);
    }

    fn set_texture_data(
        &mut self,
        id: Id,
        descriptor: &TextureDescriptor,
        data: &[u8],
    ) -> Result<(), BackendError> {
        let texture = self
            .textures
            .get(&id)
            .ok_or_else(|| BackendError::Allocation(format!("no texture {id}")))?;

        let upload = convert::prepare_texture_upload(descriptor, data);
        let bytes_per_row = convert::upload_bytes_per_pixel(descriptor.format) * descriptor.width;

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &upload,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(descriptor.height),
            },
            wgpu::Extent3d {
                width: descriptor.width,
                height: descriptor.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn init_shader_program(
        &mut self,
        id: Id,
        sources: &[ShaderSourceDescriptor],
    ) -> Result<(), BackendError> {
        let mut vertex = None;
        let mut fragment = None;
        for source in sources {
            let stage = self.compile_stage(source)?;
            match source.stage {
                ShaderStage::Vertex => vertex = Some(stage),
                ShaderStage::Fragment => fragment = Some(stage),
            }
        }

        let (Some(vertex), Some(fragment)) = (vertex, fragment) else {
            return Err(BackendError::Unsupported {
                what: "shader program",
                detail: "a program needs one vertex and one fragment source".into(),
            });
        };

        self.shaders.insert(id, GpuShaderProgram { vertex, fragment });
        Ok(())
    }

    fn free_shader_program(&mut self, id: Id) {
        self.shaders.remove(&id);
    }

    fn prepare_pass(
        &mut self,
        id: Id,
        pass: &RenderPass,
        vertex_layout: &VertexBufferLayout,
    ) -> Result<(), BackendError> {
        let shader = self
            .shaders
            .get(&pass.shader_program)
            .ok_or_else(|| {
                BackendError::Allocation(format!("no shader program {}", pass.shader_program))
            })?;

        let blend = convert::blend_state(pass)?;
        let vertex_attributes = convert::expand_attributes(&vertex_layout.per_vertex_attributes)?;
        let instance_attributes =
            convert::expand_attributes(&vertex_layout.per_instance_attributes)?;

        let mut buffers = vec![wgpu::VertexBufferLayout {
            array_stride: vertex_layout.per_vertex_stride as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &vertex_attributes,
        }];
        if !instance_attributes.is_empty() {
            buffers.push(wgpu::VertexBufferLayout {
                array_stride: vertex_layout.per_instance_stride as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &instance_attributes,
            });
        }

        let bind_group_layouts = self.pass_bind_group_layouts(pass);
        let layout_refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
        let pipeline_layout =
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("tiamat pass pipeline layout"),
                    bind_group_layouts: &layout_refs,
                    immediate_size: 0,
                });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("tiamat pass pipeline"),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &shader.vertex.module,
                    entry_point: Some(&shader.vertex.entry_point),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },

                fragment: Some(wgpu::FragmentState {
                    module: &shader.fragment.module,
                    entry_point: Some(&shader.fragment.entry_point),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend,
                        write_mask: convert::color_writes(pass.color_mask),
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: convert::primitive_topology(vertex_layout.topology),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        self.passes.insert(
            id,
            GpuPass {
                pipeline,
                bind_group_layouts,
            },
        );
        Ok(())
    }

    fn free_pass(&mut self, id: Id) {
        self.passes.remove(&id);
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<(), BackendError> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => {
                let action = surface::map_surface_error(
                    &self.surface,
                    &self.device,
                    &self.config,
                    self.size,
                    err,
                );
                if action == SurfaceErrorAction::Fatal {
                    return Err(BackendError::Surface("surface out of memory".into()));
                }
                // Transient; skip this frame entirely.
                warn!("skipping frame after surface error: {action:?}");
                self.frame = None;
                return Ok(());
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tiamat frame encoder"),
            });

        // Dedicated clear pass; each draw pass then loads the accumulated
        // frame so painter's-algorithm ordering holds.
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tiamat clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear_color[0] as f64,
                            g: clear_color[1] as f64,
                            b: clear_color[2] as f64,
                            a: clear_color[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.frame = Some(FrameState {
            surface_texture,
            view,
            encoder,
        });
        Ok(())
    }

    fn draw_pass(&mut self, id: Id, pass: &RenderPass) -> Result<(), BackendError> {
        let gpu_pass = self
            .passes
            .get(&id)
            .ok_or_else(|| BackendError::Allocation(format!("no render pass {id}")))?;
        let vertex_buffer = self
            .vertex_buffers
            .get(&pass.vertex_buffer)
            .ok_or_else(|| {
                BackendError::Allocation(format!("no vertex buffer {}", pass.vertex_buffer))
            })?;
        let bind_groups = self.pass_bind_groups(pass, &gpu_pass.bind_group_layouts)?;

        // Frame is absent when begin_frame skipped after a transient surface
        // error; drop the draw quietly.
        let Some(frame) = self.frame.as_mut() else {
            return Ok(());
        };

        let layout = &vertex_buffer.layout;
        let mut rpass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tiamat draw pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

        rpass.set_pipeline(&gpu_pass.pipeline);
        if pass.capabilities.contains(PassCapabilities::ALPHA_BLEND) {
            let [r, g, b, a] = pass.alpha_blending.constant_blend_color;
            rpass.set_blend_constant(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            });
        }
        for (group, bind_group) in bind_groups.iter().enumerate() {
            rpass.set_bind_group(group as u32, bind_group, &[]);
        }

        rpass.set_vertex_buffer(
            0,
            vertex_buffer
                .buffer
                .slice(..layout.instance_region_offset() as u64),
        );
        if !layout.per_instance_attributes.is_empty() {
            rpass.set_vertex_buffer(
                1,
                vertex_buffer
                    .buffer
                    .slice(layout.instance_region_offset() as u64..),
            );
        }

        let instances = if pass
            .capabilities
            .contains(PassCapabilities::INSTANCED_RENDERING)
        {
            pass.instance_count
        } else {
            1
        };

        if pass.index_count > 0 {
            rpass.set_index_buffer(
                vertex_buffer.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            rpass.draw_indexed(0..pass.index_count, pass.first_vertex as i32, 0..instances);
        } else {
            rpass.draw(
                pass.first_vertex..pass.first_vertex + pass.vertex_count,
                0..instances,
            );
        }

        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };

        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        frame.surface_texture.present();
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            PhysicalSize::new(width, height),
        );
    }
}
