//! GPU-side mesh storage for batched geometry.
//!
//! A [`BatchMesh`] owns a growable vertex buffer with a fixed attribute
//! layout. It is deliberately minimal: construct with a layout, replace the
//! contents wholesale each frame, bind for drawing. Index buffers are not
//! used — batches emit expanded triangle lists.

use crate::buffer::GrowableBuffer;
use crate::context::GraphicsContext;
use crate::vertex::VertexLayout;

/// Device-resident vertex storage for one batch.
pub struct BatchMesh {
    buffer: GrowableBuffer,
    layout: VertexLayout,
    vertex_count: u32,
}

impl BatchMesh {
    /// Create an empty mesh whose vertex buffer matches `layout`.
    pub fn new(ctx: &GraphicsContext, layout: VertexLayout, label: &'static str) -> Self {
        let buffer = GrowableBuffer::new(ctx, label, wgpu::BufferUsages::VERTEX);
        Self {
            buffer,
            layout,
            vertex_count: 0,
        }
    }

    /// Replace the mesh contents with `data`, one transfer, sized exactly
    /// to the slice.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is not a multiple of the layout stride —
    /// a partial vertex record can never be valid.
    pub fn update(&mut self, ctx: &GraphicsContext, data: &[u8]) {
        let stride = self.layout.stride();
        assert!(
            data.len() as u64 % stride == 0,
            "vertex data of {} bytes is not a whole number of {}-byte records",
            data.len(),
            stride
        );
        self.buffer.write(ctx, data);
        self.vertex_count = (data.len() as u64 / stride) as u32;
    }

    /// Bind the vertex buffer for drawing. No-op while the mesh is empty.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.vertex_count > 0 {
            pass.set_vertex_buffer(0, self.buffer.valid_slice());
        }
    }

    /// Number of vertices uploaded by the last [`update`].
    ///
    /// [`update`]: BatchMesh::update
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// The attribute layout this mesh was constructed with.
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }
}
