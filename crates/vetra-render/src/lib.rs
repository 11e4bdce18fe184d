//! Vetra Rendering Module
//!
//! Quad batching over wgpu: accumulate per-quad vertex data from many draw
//! calls into one contiguous vertex buffer, then issue a single draw call
//! per batch. The batch consumes the graphics context, mesh, material and
//! frame abstractions in this crate; the vertex layout, shader and per-quad
//! encoding are pluggable per batch.

pub mod buffer;
pub mod color;
pub mod context;
pub mod frame;
pub mod framebuffer;
pub mod material;
pub mod mesh;
pub mod quad_batch;
pub mod transform;
pub mod vertex;

pub use buffer::GrowableBuffer;
pub use color::Color;
pub use context::{GraphicsContext, GraphicsContextDescriptor, GraphicsError};
pub use frame::{ClearOp, FrameContext, FrameStats, RenderPass, RenderPassBuilder};
pub use framebuffer::{Framebuffer, FramebufferBuilder};
pub use material::{Material, MaterialBuilder, MaterialParameter};
pub use mesh::BatchMesh;
pub use quad_batch::{
    DEFAULT_QUAD_SHADER, DefaultQuadEncoder, QuadBatch, QuadBatchConfig, QuadEncoder, QuadInfo,
    QuadVertex, UvRect, default_quad_material,
};
pub use transform::Transform;
pub use vertex::{VertexAttribute, VertexLayout};
