//! Quad batching: accumulate many quads into one vertex buffer and draw
//! them with a single call.
//!
//! A [`QuadBatch`] cycles through `begin` → `add`* → `end` once per frame:
//! `begin` resets the CPU staging buffer, each `add` encodes one quad into
//! packed vertex records, `end` uploads the whole staging buffer to the GPU
//! in one transfer, and [`submit`](QuadBatch::submit) records a single
//! non-indexed draw. The vertex layout and shader are per-batch
//! configuration ([`QuadBatchConfig`]), and the per-quad encoding is
//! pluggable through the [`QuadEncoder`] trait.
//!
//! # Example
//!
//! ```ignore
//! use vetra_render::*;
//!
//! let material = std::sync::Arc::new(default_quad_material(&ctx));
//! let mut batch = QuadBatch::new(&ctx, QuadBatchConfig::default(), material, format);
//!
//! batch.begin();
//! batch.add(&QuadInfo {
//!     transform: Transform::from_translation(glam::Vec3::new(0.25, 0.0, 0.0)),
//!     uv: UvRect::FULL,
//!     color: Color::RED,
//! });
//! batch.end();
//!
//! // inside a render pass
//! batch.submit(&mut pass);
//! ```

use std::borrow::Cow;
use std::mem;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use static_assertions::const_assert_eq;
use vetra_core::profiling::{profile_function, profile_scope};

use crate::color::Color;
use crate::context::GraphicsContext;
use crate::frame::RenderPass;
use crate::material::{Material, MaterialBuilder, MaterialParameter};
use crate::mesh::BatchMesh;
use crate::transform::Transform;
use crate::vertex::VertexLayout;

/// WGSL shader used by the default quad material: unlit, textured,
/// modulated by the per-vertex color.
pub const DEFAULT_QUAD_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: Globals;
@group(0) @binding(1)
var t_color: texture_2d<f32>;
@group(0) @binding(2)
var s_color: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    output.position = globals.view_proj * vec4<f32>(input.position, 1.0);
    output.uv = input.uv;
    output.color = input.color;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return input.color * textureSample(t_color, s_color, input.uv);
}
"#;

/// A UV rectangle selecting a region of the bound texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    /// Top-left corner in UV space.
    pub min: Vec2,
    /// Bottom-right corner in UV space.
    pub max: Vec2,
}

impl UvRect {
    /// The whole texture, (0,0) to (1,1).
    pub const FULL: UvRect = UvRect {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    /// Create a UV rectangle from min/max corners.
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// The default per-quad input: a transform, a UV rectangle and a color.
///
/// Transient — consumed entirely by one [`QuadBatch::add`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadInfo {
    pub transform: Transform,
    pub uv: UvRect,
    pub color: Color,
}

impl Default for QuadInfo {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            uv: UvRect::FULL,
            color: Color::WHITE,
        }
    }
}

/// The vertex record produced by [`DefaultQuadEncoder`], matching
/// [`VertexLayout::quad_default`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

// The default layout stride and the default vertex type must agree.
const_assert_eq!(mem::size_of::<QuadVertex>(), 36);

/// Encodes one quad description into whole vertex records.
///
/// This is the customization seam of the batch: implement it with your own
/// `Quad` input and `Vertex` record to feed a batch whose
/// [`QuadBatchConfig`] carries the matching layout and shader. Encoders can
/// only append typed records, so a partial vertex can never reach the
/// staging buffer.
pub trait QuadEncoder {
    /// Input consumed per `add` call.
    type Quad;
    /// Vertex record type; its size must equal the batch layout stride.
    type Vertex: Pod;

    /// Append the vertices for `quad` to `out`.
    fn encode(&self, quad: &Self::Quad, out: &mut Vec<Self::Vertex>);
}

/// Default encoder: one quad in, six vertices (two triangles) out.
///
/// The unit quad is centered at the origin with Y-down corner naming:
/// "top-left" is (-0.5, -0.5). Each corner is transformed by the quad's
/// model matrix and divided by the resulting `w`, so non-affine transforms
/// (perspective skew) work too.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultQuadEncoder;

impl QuadEncoder for DefaultQuadEncoder {
    type Quad = QuadInfo;
    type Vertex = QuadVertex;

    fn encode(&self, quad: &QuadInfo, out: &mut Vec<QuadVertex>) {
        let model = quad.transform.to_matrix();
        let color = quad.color.to_array();
        let UvRect { min, max } = quad.uv;

        // Local corners (Y-down): TL, TR, BL, BR. UVs map the rectangle's
        // corners onto them in the same order.
        let corners = [
            (Vec2::new(-0.5, -0.5), Vec2::new(min.x, min.y)),
            (Vec2::new(0.5, -0.5), Vec2::new(max.x, min.y)),
            (Vec2::new(-0.5, 0.5), Vec2::new(min.x, max.y)),
            (Vec2::new(0.5, 0.5), Vec2::new(max.x, max.y)),
        ];

        let mut transformed = [QuadVertex::zeroed(); 4];
        for (vertex, (corner, uv)) in transformed.iter_mut().zip(corners) {
            let mut position = model * corner.extend(0.0).extend(1.0);
            position /= position.w;
            *vertex = QuadVertex {
                position: [position.x, position.y, position.z],
                uv: [uv.x, uv.y],
                color,
            };
        }

        let [tl, tr, bl, br] = transformed;
        // Two triangles sharing the TL-BR diagonal; order matters for
        // backface culling and wireframe output.
        out.extend_from_slice(&[tl, br, bl, tl, tr, br]);
    }
}

/// Per-batch configuration: vertex layout and shader source.
///
/// A batch snapshots its config at construction; replacing the layout or
/// shader in a config value only affects batches constructed afterwards.
#[derive(Debug, Clone)]
pub struct QuadBatchConfig {
    layout: VertexLayout,
    shader_source: Cow<'static, str>,
    label: &'static str,
}

impl QuadBatchConfig {
    /// Replace the vertex layout wholesale.
    pub fn with_layout(mut self, layout: VertexLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Replace the shader source wholesale.
    pub fn with_shader_source(mut self, source: impl Into<Cow<'static, str>>) -> Self {
        self.shader_source = source.into();
        self
    }

    /// Set the debug label used for the batch's GPU objects.
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// The configured vertex layout.
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// The configured shader source.
    pub fn shader_source(&self) -> &str {
        &self.shader_source
    }
}

impl Default for QuadBatchConfig {
    fn default() -> Self {
        Self {
            layout: VertexLayout::quad_default(),
            shader_source: Cow::Borrowed(DEFAULT_QUAD_SHADER),
            label: "Quad Batch",
        }
    }
}

/// Build the default quad material: the default shader, a `view_proj`
/// uniform seeded with identity, and the white-pixel fallback texture.
pub fn default_quad_material(ctx: &Arc<GraphicsContext>) -> Material {
    MaterialBuilder::new()
        .shader_source(DEFAULT_QUAD_SHADER, Some("Default Quad Shader"))
        .uniform("view_proj", MaterialParameter::Matrix4(glam::Mat4::IDENTITY))
        .label("Default Quad Material")
        .build(ctx)
}

/// CPU-side staging buffer of packed vertex records.
///
/// Invariant: `bytes.len() == vertex_count * stride` after every mutation.
struct VertexStaging {
    bytes: Vec<u8>,
    stride: usize,
    vertex_count: u32,
}

impl VertexStaging {
    fn new(stride: usize) -> Self {
        Self {
            bytes: Vec::new(),
            stride,
            vertex_count: 0,
        }
    }

    /// Logical reset; capacity is retained for reuse.
    fn clear(&mut self) {
        self.bytes.clear();
        self.vertex_count = 0;
    }

    /// Append whole typed records.
    fn push_vertices<V: Pod>(&mut self, vertices: &[V]) {
        assert!(
            mem::size_of::<V>() == self.stride,
            "vertex type is {} bytes but the batch stride is {}",
            mem::size_of::<V>(),
            self.stride
        );
        self.bytes.extend_from_slice(bytemuck::cast_slice(vertices));
        self.vertex_count += vertices.len() as u32;
        debug_assert_eq!(self.bytes.len(), self.vertex_count as usize * self.stride);
    }

    /// Append raw record bytes. The length must be a whole number of
    /// records — partial vertices are rejected rather than silently
    /// truncating the count.
    fn push_bytes(&mut self, data: &[u8]) {
        assert!(
            data.len() % self.stride == 0,
            "{} bytes is not a whole number of {}-byte vertex records",
            data.len(),
            self.stride
        );
        self.bytes.extend_from_slice(data);
        self.vertex_count += (data.len() / self.stride) as u32;
        debug_assert_eq!(self.bytes.len(), self.vertex_count as usize * self.stride);
    }

    /// Release the backing allocation.
    fn free(&mut self) {
        self.bytes = Vec::new();
        self.vertex_count = 0;
    }
}

/// Accumulates quads into a contiguous vertex buffer and draws them with a
/// single call.
///
/// See the [module documentation](self) for the lifecycle. A batch is
/// single-threaded: one producer drives `begin`/`add`/`end`, and `submit`
/// runs on the thread that owns the [`FrameContext`](crate::FrameContext).
/// Batches are independent of each other.
pub struct QuadBatch<E: QuadEncoder = DefaultQuadEncoder> {
    context: Arc<GraphicsContext>,
    staging: VertexStaging,
    mesh: BatchMesh,
    material: Arc<Material>,
    pipeline: wgpu::RenderPipeline,
    encoder: E,
    scratch: Vec<E::Vertex>,
    /// Staged data not yet uploaded by `end`.
    pending: bool,
}

impl QuadBatch<DefaultQuadEncoder> {
    /// Create a batch with the default encoder.
    pub fn new(
        ctx: &Arc<GraphicsContext>,
        config: QuadBatchConfig,
        material: Arc<Material>,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        Self::with_encoder(ctx, config, material, target_format, DefaultQuadEncoder)
    }
}

impl<E: QuadEncoder> QuadBatch<E> {
    /// Create a batch with a custom encoder.
    ///
    /// The pipeline is built from the material's shader, the config's
    /// vertex layout and the target format.
    ///
    /// # Panics
    ///
    /// Panics if the encoder's vertex type size differs from the config
    /// layout's stride — a mismatch would corrupt every staged record, so
    /// it is rejected here instead of at draw time.
    pub fn with_encoder(
        ctx: &Arc<GraphicsContext>,
        config: QuadBatchConfig,
        material: Arc<Material>,
        target_format: wgpu::TextureFormat,
        encoder: E,
    ) -> Self {
        let stride = config.layout.stride();
        assert!(
            mem::size_of::<E::Vertex>() as u64 == stride,
            "encoder vertex type is {} bytes but the layout stride is {}",
            mem::size_of::<E::Vertex>(),
            stride
        );

        let pipeline = build_pipeline(ctx, &config, &material, target_format);
        let mesh = BatchMesh::new(ctx, config.layout.clone(), config.label);

        Self {
            context: ctx.clone(),
            staging: VertexStaging::new(stride as usize),
            mesh,
            material,
            pipeline,
            encoder,
            scratch: Vec::new(),
            pending: false,
        }
    }

    /// Start a new accumulation cycle, discarding staged data from the
    /// previous one. Capacity is retained; no GPU interaction.
    pub fn begin(&mut self) {
        self.staging.clear();
        self.pending = false;
    }

    /// Encode one quad and append its vertices to the staging buffer.
    pub fn add(&mut self, quad: &E::Quad) {
        let mut scratch = mem::take(&mut self.scratch);
        scratch.clear();
        self.encoder.encode(quad, &mut scratch);
        self.push_vertices(&scratch);
        self.scratch = scratch;
    }

    /// Append whole vertex records directly.
    ///
    /// This is the low-level primitive `add` is built on; custom callers
    /// can use it to stage vertices without going through the encoder.
    ///
    /// # Panics
    ///
    /// Panics if `V`'s size differs from the batch stride.
    pub fn push_vertices<V: Pod>(&mut self, vertices: &[V]) {
        self.staging.push_vertices(vertices);
        self.pending = true;
    }

    /// Append raw vertex bytes.
    ///
    /// # Panics
    ///
    /// Panics if the length is not a whole number of records.
    pub fn push_vertex_bytes(&mut self, data: &[u8]) {
        self.staging.push_bytes(data);
        self.pending = true;
    }

    /// Upload the staged vertices to the GPU in one transfer, sized
    /// exactly to the staged length. Idempotent until the next mutation.
    pub fn end(&mut self) {
        profile_function!();
        self.mesh.update(&self.context, &self.staging.bytes);
        self.pending = false;
    }

    /// Record this batch's draw into a render pass: bind the material,
    /// bind the vertex buffer, issue one non-indexed draw.
    ///
    /// An empty batch records nothing. Calling `submit` with staged data
    /// that was never uploaded is a caller error; it is logged and the
    /// previously uploaded contents are drawn instead.
    pub fn submit(&self, pass: &mut RenderPass<'_>) {
        profile_scope!("quad_batch_submit");

        if self.pending {
            tracing::warn!(
                "QuadBatch::submit: {} staged vertices were never uploaded; call end() first",
                self.staging.vertex_count
            );
        }

        let vertex_count = self.mesh.vertex_count();
        if vertex_count == 0 {
            return;
        }

        {
            let rp = pass.descriptor();
            rp.set_pipeline(&self.pipeline);
            self.material.bind(rp, 0);
            self.mesh.bind(rp);
            rp.draw(0..vertex_count, 0..1);
        }
        pass.context.increment_draw_calls();
    }

    /// Release the CPU staging allocation. The GPU buffer and the material
    /// are untouched; their lifetimes are managed by ownership.
    pub fn free(&mut self) {
        self.staging.free();
        self.scratch = Vec::new();
        self.pending = false;
    }

    /// Number of vertices staged since the last `begin`.
    pub fn staged_vertex_count(&self) -> u32 {
        self.staging.vertex_count
    }

    /// Number of vertices uploaded by the last `end`.
    pub fn uploaded_vertex_count(&self) -> u32 {
        self.mesh.vertex_count()
    }

    /// Byte stride of one vertex record.
    pub fn stride(&self) -> usize {
        self.staging.stride
    }

    /// The shared material this batch draws with.
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

/// Build the batch render pipeline: alpha-blended triangle list, no
/// culling, vertex buffer shaped by the config layout.
fn build_pipeline(
    ctx: &GraphicsContext,
    config: &QuadBatchConfig,
    material: &Material,
    target_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let attributes = config.layout.wgpu_attributes();

    let pipeline_layout = ctx
        .device()
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(config.label),
            bind_group_layouts: &[material.bind_group_layout()],
            push_constant_ranges: &[],
        });

    ctx.device()
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(config.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: material.shader(),
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: config.layout.stride(),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: material.shader(),
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn encode_one(quad: &QuadInfo) -> Vec<QuadVertex> {
        let mut out = Vec::new();
        DefaultQuadEncoder.encode(quad, &mut out);
        out
    }

    #[test]
    fn test_identity_quad_corners_and_order() {
        let verts = encode_one(&QuadInfo::default());
        assert_eq!(verts.len(), 6);

        let tl = [-0.5, -0.5, 0.0];
        let tr = [0.5, -0.5, 0.0];
        let bl = [-0.5, 0.5, 0.0];
        let br = [0.5, 0.5, 0.0];

        // Emission order: TL, BR, BL, TL, TR, BR.
        assert_eq!(verts[0].position, tl);
        assert_eq!(verts[1].position, br);
        assert_eq!(verts[2].position, bl);
        assert_eq!(verts[3].position, tl);
        assert_eq!(verts[4].position, tr);
        assert_eq!(verts[5].position, br);
    }

    #[test]
    fn test_identity_quad_uvs() {
        let verts = encode_one(&QuadInfo::default());

        // TL=(0,0), BR=(1,1), BL=(0,1), TR=(1,0) in emission order.
        assert_eq!(verts[0].uv, [0.0, 0.0]);
        assert_eq!(verts[1].uv, [1.0, 1.0]);
        assert_eq!(verts[2].uv, [0.0, 1.0]);
        assert_eq!(verts[3].uv, [0.0, 0.0]);
        assert_eq!(verts[4].uv, [1.0, 0.0]);
        assert_eq!(verts[5].uv, [1.0, 1.0]);
    }

    #[test]
    fn test_uv_rect_maps_to_corners() {
        let quad = QuadInfo {
            uv: UvRect::new(Vec2::new(0.25, 0.5), Vec2::new(0.75, 1.0)),
            ..QuadInfo::default()
        };
        let verts = encode_one(&quad);

        assert_eq!(verts[0].uv, [0.25, 0.5]); // TL
        assert_eq!(verts[4].uv, [0.75, 0.5]); // TR
        assert_eq!(verts[2].uv, [0.25, 1.0]); // BL
        assert_eq!(verts[1].uv, [0.75, 1.0]); // BR
    }

    #[test]
    fn test_color_is_flat_across_vertices() {
        let quad = QuadInfo {
            color: Color::rgba(0.1, 0.2, 0.3, 0.4),
            ..QuadInfo::default()
        };
        for vertex in encode_one(&quad) {
            assert_eq!(vertex.color, [0.1, 0.2, 0.3, 0.4]);
        }
    }

    #[test]
    fn test_transform_moves_and_scales_corners() {
        let quad = QuadInfo {
            transform: Transform::from_translation_scale(
                Vec3::new(10.0, 20.0, 0.0),
                Vec3::new(4.0, 2.0, 1.0),
            ),
            ..QuadInfo::default()
        };
        let verts = encode_one(&quad);

        // TL: (-0.5 * 4 + 10, -0.5 * 2 + 20, 0)
        assert_eq!(verts[0].position, [8.0, 19.0, 0.0]);
        // BR: (0.5 * 4 + 10, 0.5 * 2 + 20, 0)
        assert_eq!(verts[1].position, [12.0, 21.0, 0.0]);
    }

    #[test]
    fn test_rotated_quad_stays_centered() {
        let quad = QuadInfo {
            transform: Transform {
                rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                ..Transform::IDENTITY
            },
            ..QuadInfo::default()
        };
        let verts = encode_one(&quad);

        // A quarter turn maps TL(-0.5,-0.5) onto (0.5,-0.5).
        assert!((verts[0].position[0] - 0.5).abs() < 1e-6);
        assert!((verts[0].position[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_staging_invariant_across_cycle() {
        let stride = mem::size_of::<QuadVertex>();
        let mut staging = VertexStaging::new(stride);

        for n in 1..=4u32 {
            let verts = encode_one(&QuadInfo::default());
            staging.push_vertices(&verts);
            assert_eq!(staging.vertex_count, 6 * n);
            assert_eq!(staging.bytes.len(), staging.vertex_count as usize * stride);
        }

        staging.clear();
        assert_eq!(staging.vertex_count, 0);
        assert!(staging.bytes.is_empty());
    }

    #[test]
    fn test_staging_clear_retains_capacity() {
        let mut staging = VertexStaging::new(mem::size_of::<QuadVertex>());
        staging.push_vertices(&encode_one(&QuadInfo::default()));
        let capacity = staging.bytes.capacity();

        staging.clear();
        assert_eq!(staging.bytes.capacity(), capacity);

        staging.free();
        assert_eq!(staging.bytes.capacity(), 0);
    }

    #[test]
    fn test_push_bytes_whole_records() {
        let mut staging = VertexStaging::new(4);
        staging.push_bytes(&[0u8; 12]);
        assert_eq!(staging.vertex_count, 3);
    }

    #[test]
    #[should_panic(expected = "not a whole number")]
    fn test_push_bytes_rejects_partial_record() {
        let mut staging = VertexStaging::new(36);
        staging.push_bytes(&[0u8; 35]);
    }

    #[test]
    #[should_panic(expected = "batch stride")]
    fn test_push_vertices_rejects_wrong_size() {
        let mut staging = VertexStaging::new(36);
        staging.push_vertices(&[0.0f32; 4]);
    }

    #[test]
    fn test_config_replacement_is_wholesale() {
        let config = QuadBatchConfig::default();
        assert_eq!(config.layout().stride(), 36);

        let custom = config.clone().with_layout(VertexLayout::new(vec![
            crate::vertex::VertexAttribute::Float2,
            crate::vertex::VertexAttribute::Float4,
        ]));
        assert_eq!(custom.layout().stride(), 24);

        // The original config value is unaffected.
        assert_eq!(config.layout().stride(), 36);
    }

    #[test]
    fn test_default_config_carries_default_shader() {
        let config = QuadBatchConfig::default();
        assert!(config.shader_source().contains("vs_main"));
        assert!(config.shader_source().contains("fs_main"));
    }
}
