//! Headless quad batch demo: accumulate a row of tinted quads, upload them
//! in one transfer, and draw them with a single call into an offscreen
//! framebuffer.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use vetra_render::{
    ClearOp, Color, FrameContext, Framebuffer, GraphicsContext, MaterialParameter, QuadBatch,
    QuadBatchConfig, QuadInfo, RenderPassBuilder, Transform, default_quad_material,
};

fn main() {
    vetra_core::logging::init();

    let ctx = GraphicsContext::new_sync().expect("failed to acquire a GPU");
    let target = Framebuffer::builder(512, 512).label("Demo Target").build(&ctx);

    let material = Arc::new(default_quad_material(&ctx));
    // Y-down 2D space: 8x8 units across the framebuffer.
    material.set_uniform(
        "view_proj",
        MaterialParameter::Matrix4(Mat4::orthographic_rh(0.0, 8.0, 8.0, 0.0, -1.0, 1.0)),
    );

    let mut batch = QuadBatch::new(
        &ctx,
        QuadBatchConfig::default(),
        material,
        target.format(),
    );

    let tints = [Color::RED, Color::GREEN, Color::BLUE, Color::WHITE];

    batch.begin();
    for (i, tint) in tints.iter().enumerate() {
        batch.add(&QuadInfo {
            transform: Transform::from_translation_scale(
                Vec3::new(1.5 + 1.6 * i as f32, 4.0, 0.0),
                Vec3::new(1.2, 1.2, 1.0),
            ),
            color: *tint,
            ..QuadInfo::default()
        });
    }
    batch.end();

    let mut frame = FrameContext::new(ctx.clone());
    {
        let mut pass = RenderPassBuilder::new()
            .label("demo pass")
            .target(&target)
            .clear_color(ClearOp::Clear(wgpu::Color {
                r: 0.05,
                g: 0.05,
                b: 0.08,
                a: 1.0,
            }))
            .build(&mut frame);
        batch.submit(&mut pass);
    }

    tracing::info!(
        "Drew {} vertices in {} draw call(s)",
        batch.uploaded_vertex_count(),
        frame.stats().draw_calls
    );
    frame.finish();
}
