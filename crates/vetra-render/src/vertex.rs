//! Vertex attribute tags and runtime-configurable vertex layouts.
//!
//! A [`VertexLayout`] is an ordered list of attribute type tags describing
//! one vertex record. The byte stride and the wgpu attribute table are both
//! derived from the order, so a layout value fully determines how a batch
//! packs and binds its vertex data. Layouts are plain values: a batch
//! snapshots the layout it was constructed with, and building a new layout
//! never affects existing batches.

/// Type tag for a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexAttribute {
    /// One `f32`.
    Float,
    /// Two `f32`s (e.g. UV).
    Float2,
    /// Three `f32`s (e.g. position).
    Float3,
    /// Four `f32`s (e.g. RGBA color).
    Float4,
}

impl VertexAttribute {
    /// Size of this attribute in bytes.
    pub const fn size(&self) -> u64 {
        match self {
            VertexAttribute::Float => 4,
            VertexAttribute::Float2 => 8,
            VertexAttribute::Float3 => 12,
            VertexAttribute::Float4 => 16,
        }
    }

    /// The matching wgpu vertex format.
    pub const fn format(&self) -> wgpu::VertexFormat {
        match self {
            VertexAttribute::Float => wgpu::VertexFormat::Float32,
            VertexAttribute::Float2 => wgpu::VertexFormat::Float32x2,
            VertexAttribute::Float3 => wgpu::VertexFormat::Float32x3,
            VertexAttribute::Float4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// An ordered vertex attribute layout.
///
/// # Example
///
/// ```
/// use vetra_render::{VertexAttribute, VertexLayout};
///
/// let layout = VertexLayout::new(vec![
///     VertexAttribute::Float3, // position
///     VertexAttribute::Float2, // uv
///     VertexAttribute::Float4, // color
/// ]);
/// assert_eq!(layout.stride(), 36);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Create a layout from an ordered attribute list.
    ///
    /// # Panics
    ///
    /// Panics if `attributes` is empty; a zero-stride layout cannot
    /// describe vertex records.
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        assert!(
            !attributes.is_empty(),
            "a vertex layout needs at least one attribute"
        );
        Self { attributes }
    }

    /// The default quad layout: float3 position, float2 uv, float4 color.
    pub fn quad_default() -> Self {
        Self::new(vec![
            VertexAttribute::Float3,
            VertexAttribute::Float2,
            VertexAttribute::Float4,
        ])
    }

    /// The attribute tags, in order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Byte stride of one vertex record.
    pub fn stride(&self) -> u64 {
        self.attributes.iter().map(|a| a.size()).sum()
    }

    /// Build the wgpu attribute table with running offsets and sequential
    /// shader locations.
    ///
    /// The returned vector is borrowed by a `wgpu::VertexBufferLayout` at
    /// pipeline creation; it must outlive that call.
    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        let mut offset = 0;
        self.attributes
            .iter()
            .enumerate()
            .map(|(location, attr)| {
                let out = wgpu::VertexAttribute {
                    format: attr.format(),
                    offset,
                    shader_location: location as u32,
                };
                offset += attr.size();
                out
            })
            .collect()
    }
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self::quad_default()
    }
}
