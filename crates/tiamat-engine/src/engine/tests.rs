use super::*;
use crate::backend::headless::{FrameEvent, HeadlessBackend};
use crate::engine::pass::{IdWithBinding, PassCapabilities, RenderPass};
use crate::engine::shader::{ShaderSourceDescriptor, ShaderStage, ShaderVariableType};
use crate::engine::texture::{MinMagFilter, TextureDescriptor, TextureFormat};
use crate::engine::vertex::{
    RenderTopology, VertexAttributeSettings, VertexBufferSettings, VertexBufferSize,
};

fn engine() -> Engine<HeadlessBackend> {
    Engine::new(HeadlessBackend::new())
}

fn quad_settings(vertex_count: u32, index_count: u32, instance_count: u32) -> VertexBufferSettings {
    VertexBufferSettings {
        size: VertexBufferSize {
            vertex_count,
            index_count,
            instance_count,
        },
        per_vertex_attributes: vec![VertexAttributeSettings {
            variable_type: ShaderVariableType::FVec2,
            location: 0,
        }],
        per_instance_attributes: vec![],
        topology: RenderTopology::Triangles,
    }
}

fn trivial_shader(engine: &mut Engine<HeadlessBackend>) -> Id {
    engine
        .shader_program_alloc(vec![
            ShaderSourceDescriptor {
                stage: ShaderStage::Vertex,
                entry_point: "vs_main".into(),
                source: String::new(),
            },
            ShaderSourceDescriptor {
                stage: ShaderStage::Fragment,
                entry_point: "fs_main".into(),
                source: String::new(),
            },
        ])
        .unwrap()
}

// ── allocation and rollback ──────────────────────────────────────────────

#[test]
fn failed_alloc_rolls_the_id_back() {
    let mut engine = engine();
    let first = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();

    engine.backend_mut().fail_next_init = true;
    let err = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0));
    assert!(matches!(err, Err(EngineError::Backend(_))));

    // The id released by the rollback is handed out again, and no backend
    // state leaked for the failed attempt.
    let second = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();
    assert_ne!(first, second);
    assert_eq!(engine.backend().live_resource_count(), 2);
}

#[test]
fn freed_id_is_rejected_afterwards() {
    let mut engine = engine();
    let id = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();
    engine.vertex_buffer_free(id).unwrap();

    let err = engine.vertex_buffer_free(id);
    assert!(matches!(
        err,
        Err(EngineError::InvalidId {
            kind: ResourceKind::VertexBuffer,
            ..
        })
    ));
}

#[test]
fn pass_alloc_requires_live_references() {
    let mut engine = engine();
    let vb = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();
    let shader = trivial_shader(&mut engine);

    let mut pass = RenderPass::new(vb, shader, 6);
    pass.fragment_textures = vec![IdWithBinding {
        id: 99,
        shader_location: 0,
    }];

    let err = engine.render_pass_alloc(pass);
    assert!(matches!(
        err,
        Err(EngineError::InvalidId {
            kind: ResourceKind::Texture,
            id: 99,
        })
    ));
    assert!(engine.render_pass_order().is_empty());
}

// ── borrow and return ────────────────────────────────────────────────────

#[test]
fn nested_borrow_of_one_buffer_fails() {
    let mut engine = engine();
    let id = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();

    let data = engine.vertex_buffer_borrow_data(id).unwrap();
    assert!(matches!(
        engine.vertex_buffer_borrow_data(id),
        Err(EngineError::AlreadyBorrowed { .. })
    ));

    engine.vertex_buffer_return_data(id, data).unwrap();
    let data = engine.vertex_buffer_borrow_data(id).unwrap();
    engine.vertex_buffer_return_data(id, data).unwrap();
}

#[test]
fn borrowed_buffer_cannot_be_freed() {
    let mut engine = engine();
    let id = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();

    let data = engine.vertex_buffer_borrow_data(id).unwrap();
    assert!(matches!(
        engine.vertex_buffer_free(id),
        Err(EngineError::AlreadyBorrowed { .. })
    ));
    engine.vertex_buffer_return_data(id, data).unwrap();
    engine.vertex_buffer_free(id).unwrap();
}

#[test]
fn returned_edits_reach_the_backend() {
    let mut engine = engine();
    let id = engine.vertex_buffer_alloc(&quad_settings(3, 3, 0)).unwrap();

    let mut data = engine.vertex_buffer_borrow_data(id).unwrap();
    data.vertex_data_mut()[0] = 0xAB;
    data.indices_mut().copy_from_slice(&[0, 1, 2]);
    engine.vertex_buffer_return_data(id, data).unwrap();

    assert_eq!(engine.backend().vertex_buffer_bytes(id).unwrap()[0], 0xAB);
}

#[test]
fn uniform_write_round_trips() {
    let mut engine = engine();
    let id = engine
        .uniform_buffer_alloc(UniformBufferDescriptor { data_bytes: 16 })
        .unwrap();

    let mut data = engine.uniform_buffer_borrow_data(id).unwrap();
    data.write(0, &[1.0f32, 2.0, 3.0, 4.0]).unwrap();
    engine.uniform_buffer_return_data(id, data).unwrap();

    let data = engine.uniform_buffer_borrow_data(id).unwrap();
    assert_eq!(&data.bytes()[0..4], 1.0f32.to_ne_bytes());
    engine.uniform_buffer_return_data(id, data).unwrap();
}

#[test]
fn uniform_write_rejects_out_of_range_offsets() {
    let mut engine = engine();
    let id = engine
        .uniform_buffer_alloc(UniformBufferDescriptor { data_bytes: 8 })
        .unwrap();

    let mut data = engine.uniform_buffer_borrow_data(id).unwrap();
    assert!(matches!(
        data.write(8, &1.0f32),
        Err(EngineError::UniformWriteRange {
            offset: 8,
            len: 4,
            capacity: 8,
        })
    ));
    assert!(matches!(
        data.write(usize::MAX, &1.0f32),
        Err(EngineError::UniformWriteRange { .. })
    ));

    // A write that exactly fills the tail still lands.
    data.write(4, &2.0f32).unwrap();
    engine.uniform_buffer_return_data(id, data).unwrap();
}

// ── textures ─────────────────────────────────────────────────────────────

#[test]
fn texture_data_size_is_validated() {
    let mut engine = engine();
    let id = engine
        .texture_alloc(TextureDescriptor {
            format: TextureFormat::Rgba32,
            width: 2,
            height: 2,
            swizzle: None,
            min_filter: MinMagFilter::Nearest,
            mag_filter: MinMagFilter::Nearest,
        })
        .unwrap();

    assert!(matches!(
        engine.texture_set_data(id, &[0; 15]),
        Err(EngineError::TextureDataSize {
            expected: 16,
            actual: 15,
        })
    ));

    engine.texture_set_data(id, &[7; 16]).unwrap();
    assert_eq!(engine.backend().texture_bytes(id).unwrap(), &[7; 16]);
}

// ── submission order ─────────────────────────────────────────────────────

#[test]
fn passes_draw_in_stable_insertion_order() {
    let mut engine = engine();
    let vb = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();
    let shader = trivial_shader(&mut engine);

    let p1 = engine.render_pass_alloc(RenderPass::new(vb, shader, 6)).unwrap();
    let p2 = engine.render_pass_alloc(RenderPass::new(vb, shader, 6)).unwrap();
    let p3 = engine.render_pass_alloc(RenderPass::new(vb, shader, 6)).unwrap();

    // Removing a middle pass compacts the order without touching the rest.
    engine.render_pass_free(p2).unwrap();
    let p4 = engine.render_pass_alloc(RenderPass::new(vb, shader, 6)).unwrap();
    assert_eq!(engine.render_pass_order(), &[p1, p3, p4]);

    engine.draw_frame().unwrap();
    let drawn: Vec<Id> = engine
        .backend()
        .events
        .iter()
        .filter_map(|event| match event {
            FrameEvent::DrawIndexed { pass, .. } => Some(*pass),
            _ => None,
        })
        .collect();
    assert_eq!(drawn, vec![p1, p3, p4]);
}

#[test]
fn empty_frame_still_clears_and_presents() {
    let mut engine = engine();
    engine.set_clear_color([0.1, 0.2, 0.3, 1.0]);
    engine.draw_frame().unwrap();

    assert_eq!(
        engine.backend().events,
        vec![
            FrameEvent::Clear {
                color: [0.1, 0.2, 0.3, 1.0],
            },
            FrameEvent::Present,
        ]
    );
}

#[test]
fn instanced_capability_selects_the_instanced_draw() {
    let mut engine = engine();
    let vb = engine.vertex_buffer_alloc(&quad_settings(4, 6, 3)).unwrap();
    let shader = trivial_shader(&mut engine);

    let mut pass = RenderPass::new(vb, shader, 6);
    pass.instance_count = 3;
    pass.capabilities = PassCapabilities::INSTANCED_RENDERING;
    let instanced = engine.render_pass_alloc(pass).unwrap();

    // A plain pass ignores instance_count entirely.
    let mut plain = RenderPass::new(vb, shader, 6);
    plain.instance_count = 500;
    let indexed = engine.render_pass_alloc(plain).unwrap();

    engine.draw_frame().unwrap();
    assert_eq!(
        engine.backend().events[1..3],
        [
            FrameEvent::DrawInstanced {
                pass: instanced,
                index_count: 6,
                first_vertex: 0,
                instance_count: 3,
            },
            FrameEvent::DrawIndexed {
                pass: indexed,
                index_count: 6,
                first_vertex: 0,
            },
        ]
    );
}

#[test]
fn edited_pass_keeps_its_submission_position() {
    let mut engine = engine();
    let vb = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();
    let shader = trivial_shader(&mut engine);

    let p1 = engine.render_pass_alloc(RenderPass::new(vb, shader, 6)).unwrap();
    let p2 = engine.render_pass_alloc(RenderPass::new(vb, shader, 6)).unwrap();

    let mut pass = engine.render_pass_borrow(p1).unwrap();
    pass.index_count = 3;
    engine.render_pass_return(p1, pass).unwrap();

    assert_eq!(engine.render_pass_order(), &[p1, p2]);
    assert_eq!(engine.render_pass_borrow(p1).unwrap().index_count, 3);
}

#[test]
fn failed_pass_edit_leaves_the_pass_untouched() {
    let mut engine = engine();
    let vb = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();
    let shader = trivial_shader(&mut engine);
    let id = engine.render_pass_alloc(RenderPass::new(vb, shader, 6)).unwrap();

    let before = engine.backend().live_resource_count();
    let mut pass = engine.render_pass_borrow(id).unwrap();
    pass.index_count = 3;

    engine.backend_mut().fail_next_init = true;
    assert!(matches!(
        engine.render_pass_return(id, pass),
        Err(EngineError::Backend(_))
    ));

    // The previous record and its backend state both survive the failure.
    assert_eq!(engine.backend().live_resource_count(), before);
    assert_eq!(engine.render_pass_order(), &[id]);
    assert_eq!(engine.render_pass_borrow(id).unwrap().index_count, 6);
    engine.draw_frame().unwrap();
    assert!(engine
        .backend()
        .events
        .iter()
        .any(|event| matches!(event, FrameEvent::DrawIndexed { pass: p, index_count: 6, .. } if *p == id)));
}

#[test]
fn zero_index_count_takes_the_plain_draw_path() {
    let mut engine = engine();
    let vb = engine.vertex_buffer_alloc(&quad_settings(4, 0, 0)).unwrap();
    let shader = trivial_shader(&mut engine);

    let mut pass = RenderPass::new(vb, shader, 0);
    pass.vertex_count = 4;
    pass.first_vertex = 1;
    let id = engine.render_pass_alloc(pass).unwrap();

    engine.draw_frame().unwrap();
    assert_eq!(
        engine.backend().events[1],
        FrameEvent::Draw {
            pass: id,
            vertex_count: 4,
            first_vertex: 1,
        }
    );
}

// ── resize ───────────────────────────────────────────────────────────────

#[test]
fn resize_keeps_the_id_and_clamps_contents() {
    let mut engine = engine();
    let id = engine.vertex_buffer_alloc(&quad_settings(3, 3, 0)).unwrap();

    let mut data = engine.vertex_buffer_borrow_data(id).unwrap();
    data.vertex_data_mut().copy_from_slice(&[1; 24]);
    data.indices_mut().copy_from_slice(&[10, 11, 12]);
    engine.vertex_buffer_return_data(id, data).unwrap();

    // Grow vertices, shrink indices.
    engine
        .vertex_buffer_resize(
            id,
            VertexBufferSize {
                vertex_count: 5,
                index_count: 2,
                instance_count: 0,
            },
        )
        .unwrap();

    let layout = engine.vertex_buffer_layout(id).unwrap();
    assert_eq!(layout.size.vertex_count, 5);
    assert_eq!(layout.size.index_count, 2);

    let data = engine.vertex_buffer_borrow_data(id).unwrap();
    // Old vertex bytes survive at the front, new tail is zeroed.
    assert_eq!(&data.vertex_data()[..24], &[1; 24]);
    assert_eq!(&data.vertex_data()[24..], &[0; 16]);
    // Index region clamped to the smaller count.
    assert_eq!(data.indices(), &[10, 11]);
    engine.vertex_buffer_return_data(id, data).unwrap();

    // Exactly one buffer is left behind; the temporary was freed.
    assert_eq!(engine.backend().live_resource_count(), 1);
}

#[test]
fn passes_survive_a_resize_of_their_buffer() {
    let mut engine = engine();
    let vb = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();
    let shader = trivial_shader(&mut engine);
    let pass = engine.render_pass_alloc(RenderPass::new(vb, shader, 6)).unwrap();

    engine
        .vertex_buffer_resize(
            vb,
            VertexBufferSize {
                vertex_count: 8,
                index_count: 12,
                instance_count: 0,
            },
        )
        .unwrap();

    engine.draw_frame().unwrap();
    assert!(engine
        .backend()
        .events
        .iter()
        .any(|event| matches!(event, FrameEvent::DrawIndexed { pass: p, .. } if *p == pass)));
}

// ── teardown ─────────────────────────────────────────────────────────────

#[test]
fn finalize_releases_every_resource() {
    let mut engine = engine();
    let vb = engine.vertex_buffer_alloc(&quad_settings(4, 6, 0)).unwrap();
    let shader = trivial_shader(&mut engine);
    engine
        .uniform_buffer_alloc(UniformBufferDescriptor { data_bytes: 64 })
        .unwrap();
    engine
        .texture_alloc(TextureDescriptor {
            format: TextureFormat::R8,
            width: 8,
            height: 8,
            swizzle: None,
            min_filter: MinMagFilter::Linear,
            mag_filter: MinMagFilter::Linear,
        })
        .unwrap();
    engine.render_pass_alloc(RenderPass::new(vb, shader, 6)).unwrap();

    engine.finalize();
    assert_eq!(engine.backend().live_resource_count(), 0);
    assert!(engine.render_pass_order().is_empty());
}
