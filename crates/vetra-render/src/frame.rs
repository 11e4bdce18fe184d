//! Per-frame command recording.
//!
//! A [`FrameContext`] owns the command encoder for one frame. Render passes
//! borrow the encoder through [`RenderPassBuilder`] and hand it back when
//! dropped; dropping the frame context submits the recorded commands to the
//! queue.

use std::sync::Arc;

use vetra_core::profiling::{profile_function, profile_scope};

use crate::context::GraphicsContext;
use crate::framebuffer::Framebuffer;

/// Statistics for a recorded frame.
pub struct FrameStats {
    pub passes: usize,
    pub draw_calls: usize,
}

impl FrameStats {
    pub(crate) fn new() -> Self {
        Self {
            passes: 0,
            draw_calls: 0,
        }
    }
}

/// Context for a single frame of rendering.
pub struct FrameContext {
    pub(crate) stats: FrameStats,
    pub(crate) encoder: Option<wgpu::CommandEncoder>,
    pub(crate) context: Arc<GraphicsContext>,
}

impl FrameContext {
    /// Begin recording a new frame.
    pub fn new(context: Arc<GraphicsContext>) -> Self {
        let encoder = context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        Self {
            stats: FrameStats::new(),
            encoder: Some(encoder),
            context,
        }
    }

    pub fn increment_passes(&mut self) {
        self.stats.passes += 1;
    }

    pub fn increment_draw_calls(&mut self) {
        self.stats.draw_calls += 1;
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn graphics_context(&self) -> &Arc<GraphicsContext> {
        &self.context
    }

    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        self.encoder.as_mut().expect("Encoder already taken")
    }

    /// Submit the frame. Equivalent to dropping the context.
    pub fn finish(self) {
        drop(self);
    }
}

impl Drop for FrameContext {
    fn drop(&mut self) {
        profile_function!();

        if self.stats.passes == 0 {
            tracing::error!("No render passes were executed for this frame!");
        }

        if let Some(encoder) = self.encoder.take() {
            profile_scope!("submit_commands");
            self.context
                .queue()
                .submit(std::iter::once(encoder.finish()));
        }
    }
}

/// Clear operation for a render pass.
#[derive(Debug, Clone, Copy)]
pub enum ClearOp {
    /// Load existing contents (no clear).
    Load,
    /// Clear to the specified color.
    Clear(wgpu::Color),
}

impl Default for ClearOp {
    fn default() -> Self {
        ClearOp::Load
    }
}

impl From<wgpu::Color> for ClearOp {
    fn from(color: wgpu::Color) -> Self {
        ClearOp::Clear(color)
    }
}

impl From<crate::Color> for ClearOp {
    fn from(color: crate::Color) -> Self {
        ClearOp::Clear(color.to_wgpu())
    }
}

/// Builder for creating render passes targeting a [`Framebuffer`].
pub struct RenderPassBuilder<'a> {
    label: Option<&'a str>,
    target: Option<&'a Framebuffer>,
    clear_op: ClearOp,
}

impl<'a> RenderPassBuilder<'a> {
    pub fn new() -> Self {
        Self {
            label: None,
            target: None,
            clear_op: ClearOp::Load,
        }
    }

    /// Set a debug label for the render pass.
    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    /// Set the framebuffer to render into.
    pub fn target(mut self, target: &'a Framebuffer) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the clear color, or pass [`ClearOp::Load`] to preserve contents.
    pub fn clear_color(mut self, color: impl Into<ClearOp>) -> Self {
        self.clear_op = color.into();
        self
    }

    /// Builds the render pass and begins it on the provided frame context.
    ///
    /// Takes ownership of the command encoder from the frame context and
    /// releases it back when the [`RenderPass`] is dropped or
    /// [`finish`](RenderPass::finish) is called.
    ///
    /// # Panics
    ///
    /// Panics if no target was set.
    pub fn build(self, frame_context: &'a mut FrameContext) -> RenderPass<'a> {
        let target = self.target.expect("render pass requires a target");
        let mut encoder = frame_context.encoder.take().expect("Encoder already taken");

        let ops = match self.clear_op {
            ClearOp::Load => wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
            ClearOp::Clear(color) => wgpu::Operations {
                load: wgpu::LoadOp::Clear(color),
                store: wgpu::StoreOp::Store,
            },
        };

        let descriptor = wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                resolve_target: None,
                ops,
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        };

        let render_pass = encoder.begin_render_pass(&descriptor).forget_lifetime();

        frame_context.increment_passes();

        RenderPass {
            context: frame_context,
            encoder: Some(encoder),
            descriptor: Some(render_pass),
        }
    }
}

impl Default for RenderPassBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// A render pass wrapper that returns the encoder to the frame context.
pub struct RenderPass<'a> {
    pub context: &'a mut FrameContext,
    pub(crate) encoder: Option<wgpu::CommandEncoder>,
    pub(crate) descriptor: Option<wgpu::RenderPass<'static>>,
}

impl<'a> RenderPass<'a> {
    /// The underlying wgpu render pass, for recording bind and draw calls.
    pub fn descriptor(&mut self) -> &mut wgpu::RenderPass<'static> {
        self.descriptor.as_mut().unwrap()
    }

    /// End the pass. Equivalent to dropping it.
    pub fn finish(self) {
        drop(self);
    }
}

impl Drop for RenderPass<'_> {
    fn drop(&mut self) {
        drop(self.descriptor.take());

        // Return the encoder to the frame context
        self.context.encoder = self.encoder.take();
    }
}
