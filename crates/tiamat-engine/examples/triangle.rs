//! Spinning triangle: one vertex buffer, one uniform, one render pass.

use anyhow::Result;
use tiamat_engine::backend::wgpu::WgpuBackend;
use tiamat_engine::core::{App, AppControl};
use tiamat_engine::engine::pass::{IdWithBinding, RenderPass};
use tiamat_engine::engine::shader::{ShaderSourceDescriptor, ShaderStage, ShaderVariableType};
use tiamat_engine::engine::uniform::UniformBufferDescriptor;
use tiamat_engine::engine::vertex::{
    RenderTopology, VertexAttributeSettings, VertexBufferSettings, VertexBufferSize,
};
use tiamat_engine::engine::{Engine, EngineError};
use tiamat_engine::id::Id;
use tiamat_engine::logging::{LoggingConfig, init_logging};
use tiamat_engine::settings::EngineSettings;
use tiamat_engine::time::FrameTime;
use tiamat_engine::window::Runtime;

const SHADER: &str = r#"
struct Rotation {
    angle: f32,
}

@group(0) @binding(0) var<uniform> rotation: Rotation;

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(@location(0) pos: vec2<f32>, @location(1) color: vec4<f32>) -> VertexOut {
    let c = cos(rotation.angle);
    let s = sin(rotation.angle);
    let rotated = vec2<f32>(pos.x * c - pos.y * s, pos.x * s + pos.y * c);

    var out: VertexOut;
    out.position = vec4<f32>(rotated, 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

#[derive(Default)]
struct Triangle {
    rotation_ubo: Id,
    angle: f32,
}

impl App for Triangle {
    fn init(&mut self, engine: &mut Engine<WgpuBackend<'_>>) -> Result<(), EngineError> {
        let vertex_buffer = engine.vertex_buffer_alloc(&VertexBufferSettings {
            size: VertexBufferSize {
                vertex_count: 3,
                index_count: 3,
                instance_count: 0,
            },
            per_vertex_attributes: vec![
                VertexAttributeSettings {
                    variable_type: ShaderVariableType::FVec2,
                    location: 0,
                },
                VertexAttributeSettings {
                    variable_type: ShaderVariableType::FVec4,
                    location: 1,
                },
            ],
            per_instance_attributes: vec![],
            topology: RenderTopology::Triangles,
        })?;

        let mut data = engine.vertex_buffer_borrow_data(vertex_buffer)?;
        #[rustfmt::skip]
        let vertices: [f32; 18] = [
            -0.6, -0.5,   1.0, 0.2, 0.2, 1.0,
             0.6, -0.5,   0.2, 1.0, 0.2, 1.0,
             0.0,  0.7,   0.2, 0.2, 1.0, 1.0,
        ];
        data.vertex_data_mut()
            .copy_from_slice(bytemuck::cast_slice(&vertices));
        data.indices_mut().copy_from_slice(&[0, 1, 2]);
        engine.vertex_buffer_return_data(vertex_buffer, data)?;

        let shader = engine.shader_program_alloc(vec![
            ShaderSourceDescriptor {
                stage: ShaderStage::Vertex,
                entry_point: "vs_main".to_string(),
                source: SHADER.to_string(),
            },
            ShaderSourceDescriptor {
                stage: ShaderStage::Fragment,
                entry_point: "fs_main".to_string(),
                source: SHADER.to_string(),
            },
        ])?;

        self.rotation_ubo = engine.uniform_buffer_alloc(UniformBufferDescriptor {
            data_bytes: std::mem::size_of::<f32>(),
        })?;

        let mut pass = RenderPass::new(vertex_buffer, shader, 3);
        pass.uniform_vertex_buffers = vec![IdWithBinding {
            id: self.rotation_ubo,
            shader_location: 0,
        }];
        engine.render_pass_alloc(pass)?;

        Ok(())
    }

    fn draw(&mut self, engine: &mut Engine<WgpuBackend<'_>>, time: FrameTime) -> AppControl {
        self.angle += time.dt;

        let result = engine
            .uniform_buffer_borrow_data(self.rotation_ubo)
            .and_then(|mut data| {
                data.write(0, &self.angle)?;
                engine.uniform_buffer_return_data(self.rotation_ubo, data)
            });

        match result {
            Ok(()) => AppControl::Continue,
            Err(err) => self.on_error(&err),
        }
    }

    fn on_error(&mut self, error: &EngineError) -> AppControl {
        log::error!("triangle demo error: {error}");
        AppControl::Exit
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(
        EngineSettings {
            window_title: "tiamat triangle".to_string(),
            clear_color: [0.05, 0.05, 0.08, 1.0],
            ..EngineSettings::default()
        },
        Triangle::default(),
    )
}
