//! Quad batch lifecycle tests against a real GPU.
//!
//! The GPU-backed tests are ignored by default; run them with:
//! `cargo test --test quad_batch_tests -- --ignored`

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use vetra_render::{
    ClearOp, Color, Framebuffer, FrameContext, GraphicsContext, GraphicsError, QuadBatch,
    QuadBatchConfig, QuadEncoder, QuadInfo, RenderPassBuilder, Transform, VertexAttribute,
    VertexLayout, default_quad_material,
};

fn gpu() -> Arc<GraphicsContext> {
    GraphicsContext::new_sync().expect("these tests require a GPU adapter")
}

fn framebuffer(ctx: &GraphicsContext) -> Framebuffer {
    Framebuffer::builder(64, 64).build(ctx)
}

#[test]
#[ignore] // Requires GPU - run with: cargo test --test quad_batch_tests -- --ignored
fn test_full_cycle_draws_once() {
    let ctx = gpu();
    let target = framebuffer(&ctx);
    let material = Arc::new(default_quad_material(&ctx));
    let mut batch = QuadBatch::new(&ctx, QuadBatchConfig::default(), material, target.format());

    batch.begin();
    for i in 0..3 {
        batch.add(&QuadInfo {
            transform: Transform::from_translation(glam::Vec3::new(i as f32 * 0.1, 0.0, 0.0)),
            color: Color::RED,
            ..QuadInfo::default()
        });
    }
    assert_eq!(batch.staged_vertex_count(), 18);

    batch.end();
    assert_eq!(batch.uploaded_vertex_count(), 18);

    let mut frame = FrameContext::new(ctx.clone());
    {
        let mut pass = RenderPassBuilder::new()
            .label("quad batch test pass")
            .target(&target)
            .clear_color(ClearOp::Clear(wgpu::Color::BLACK))
            .build(&mut frame);
        batch.submit(&mut pass);
    }
    assert_eq!(frame.stats().draw_calls, 1);
    frame.finish();
}

#[test]
#[ignore] // Requires GPU
fn test_empty_cycle_draws_nothing() {
    let ctx = gpu();
    let target = framebuffer(&ctx);
    let material = Arc::new(default_quad_material(&ctx));
    let mut batch = QuadBatch::new(&ctx, QuadBatchConfig::default(), material, target.format());

    batch.begin();
    batch.end();
    assert_eq!(batch.uploaded_vertex_count(), 0);

    let mut frame = FrameContext::new(ctx.clone());
    {
        let mut pass = RenderPassBuilder::new()
            .target(&target)
            .clear_color(ClearOp::Clear(wgpu::Color::BLACK))
            .build(&mut frame);
        batch.submit(&mut pass);
    }
    assert_eq!(frame.stats().draw_calls, 0);
    frame.finish();
}

#[test]
#[ignore] // Requires GPU
fn test_end_is_idempotent() {
    let ctx = gpu();
    let target = framebuffer(&ctx);
    let material = Arc::new(default_quad_material(&ctx));
    let mut batch = QuadBatch::new(&ctx, QuadBatchConfig::default(), material, target.format());

    batch.begin();
    batch.add(&QuadInfo::default());
    batch.end();
    let uploaded = batch.uploaded_vertex_count();

    // No intervening begin/add: a second end re-uploads identical content.
    batch.end();
    assert_eq!(batch.uploaded_vertex_count(), uploaded);
    assert_eq!(uploaded, 6);
}

#[test]
#[ignore] // Requires GPU
fn test_begin_discards_previous_cycle() {
    let ctx = gpu();
    let target = framebuffer(&ctx);
    let material = Arc::new(default_quad_material(&ctx));
    let mut batch = QuadBatch::new(&ctx, QuadBatchConfig::default(), material, target.format());

    batch.begin();
    batch.add(&QuadInfo::default());
    batch.add(&QuadInfo::default());
    batch.end();
    assert_eq!(batch.uploaded_vertex_count(), 12);

    batch.begin();
    assert_eq!(batch.staged_vertex_count(), 0);
    batch.add(&QuadInfo::default());
    batch.end();
    assert_eq!(batch.uploaded_vertex_count(), 6);
}

#[test]
#[ignore] // Requires GPU
fn test_free_releases_staging_only() {
    let ctx = gpu();
    let target = framebuffer(&ctx);
    let material = Arc::new(default_quad_material(&ctx));
    let mut batch = QuadBatch::new(&ctx, QuadBatchConfig::default(), material, target.format());

    batch.begin();
    batch.add(&QuadInfo::default());
    batch.end();
    batch.free();

    // Uploaded geometry is still drawable after freeing the CPU side.
    assert_eq!(batch.staged_vertex_count(), 0);
    assert_eq!(batch.uploaded_vertex_count(), 6);
}

// A two-attribute vertex for the custom-encoder test below.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct FlatVertex {
    position: [f32; 2],
    color: [f32; 4],
}

struct FlatQuadEncoder {
    half_extent: f32,
}

impl QuadEncoder for FlatQuadEncoder {
    type Quad = (Vec2, Color);
    type Vertex = FlatVertex;

    fn encode(&self, quad: &(Vec2, Color), out: &mut Vec<FlatVertex>) {
        let (center, color) = *quad;
        let color = color.to_array();
        let h = self.half_extent;
        let corner = |dx: f32, dy: f32| FlatVertex {
            position: [center.x + dx * h, center.y + dy * h],
            color,
        };
        let (tl, tr, bl, br) = (
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(-1.0, 1.0),
            corner(1.0, 1.0),
        );
        out.extend_from_slice(&[tl, br, bl, tl, tr, br]);
    }
}

const FLAT_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) color: vec4<f32>) -> VertexOutput {
    var output: VertexOutput;
    output.position = vec4<f32>(position, 0.0, 1.0);
    output.color = color;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return input.color;
}
"#;

#[test]
#[ignore] // Requires GPU
fn test_custom_encoder_and_layout() {
    let ctx = gpu();
    let target = framebuffer(&ctx);

    let config = QuadBatchConfig::default()
        .with_layout(VertexLayout::new(vec![
            VertexAttribute::Float2,
            VertexAttribute::Float4,
        ]))
        .with_shader_source(FLAT_SHADER)
        .with_label("Flat Quad Batch");

    let material = Arc::new(
        vetra_render::MaterialBuilder::new()
            .shader_source(FLAT_SHADER, Some("Flat Shader"))
            .build(&ctx),
    );

    let mut batch = QuadBatch::with_encoder(
        &ctx,
        config,
        material,
        target.format(),
        FlatQuadEncoder { half_extent: 0.25 },
    );
    assert_eq!(batch.stride(), std::mem::size_of::<FlatVertex>());

    batch.begin();
    batch.add(&(Vec2::ZERO, Color::GREEN));
    batch.add(&(Vec2::new(0.5, 0.5), Color::BLUE));
    batch.end();
    assert_eq!(batch.uploaded_vertex_count(), 12);

    let mut frame = FrameContext::new(ctx.clone());
    {
        let mut pass = RenderPassBuilder::new()
            .target(&target)
            .clear_color(ClearOp::Clear(wgpu::Color::BLACK))
            .build(&mut frame);
        batch.submit(&mut pass);
    }
    assert_eq!(frame.stats().draw_calls, 1);
    frame.finish();
}

#[test]
#[ignore] // Requires GPU
fn test_batches_snapshot_their_layout() {
    let ctx = gpu();
    let target = framebuffer(&ctx);
    let material = Arc::new(default_quad_material(&ctx));

    let config = QuadBatchConfig::default();
    let batch = QuadBatch::new(&ctx, config.clone(), material, target.format());
    assert_eq!(batch.stride(), 36);

    // Building a new config with another layout does not touch the
    // already-constructed batch.
    let _other = config.with_layout(VertexLayout::new(vec![VertexAttribute::Float4]));
    assert_eq!(batch.stride(), 36);
}

#[test]
fn test_graphics_error_display() {
    assert_eq!(
        GraphicsError::NoAdapter.to_string(),
        "no suitable GPU adapter found"
    );
    let err = GraphicsError::RequestDevice("limits".into());
    assert!(err.to_string().contains("limits"));
}
