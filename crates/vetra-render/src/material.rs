//! Material abstraction: a shader plus its uniform and texture bindings.
//!
//! A material is built once and then shared — batches hold `Arc<Material>`
//! and only read it at draw time. Uniform *values* can still be updated in
//! place through [`Material::set_uniform`] (the write goes through the
//! queue at the offset recorded at build time); the uniform *structure* is
//! fixed after [`MaterialBuilder::build`].
//!
//! # Example
//!
//! ```ignore
//! use vetra_render::{Material, MaterialParameter};
//! use glam::Mat4;
//!
//! let material = Material::builder()
//!     .shader_source(MY_SHADER, Some("my shader"))
//!     .uniform("view_proj", MaterialParameter::Matrix4(Mat4::IDENTITY))
//!     .build(&ctx);
//!
//! material.set_uniform("view_proj", MaterialParameter::Matrix4(vp));
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use ahash::HashMap;
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::color::Color;
use crate::context::GraphicsContext;

/// A uniform value that can be bound through a material.
#[derive(Debug, Clone)]
pub enum MaterialParameter {
    /// Single float value.
    Float(f32),
    /// 2D vector.
    Vec2(Vec2),
    /// 3D vector (padded to 16 bytes on upload).
    Vec3(Vec3),
    /// 4D vector.
    Vec4(Vec4),
    /// RGBA color.
    Color(Color),
    /// 4x4 matrix.
    Matrix4(Mat4),
}

impl MaterialParameter {
    /// Convert the parameter to bytes for GPU upload.
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            MaterialParameter::Float(v) => bytemuck::bytes_of(v).to_vec(),
            MaterialParameter::Vec2(v) => bytemuck::bytes_of(v).to_vec(),
            MaterialParameter::Vec3(v) => {
                // Pad Vec3 to 16 bytes for uniform alignment
                let mut bytes = Vec::with_capacity(16);
                bytes.extend_from_slice(bytemuck::bytes_of(v));
                bytes.extend_from_slice(&[0u8; 4]);
                bytes
            }
            MaterialParameter::Vec4(v) => bytemuck::bytes_of(v).to_vec(),
            MaterialParameter::Color(c) => bytemuck::bytes_of(c).to_vec(),
            MaterialParameter::Matrix4(m) => bytemuck::bytes_of(m).to_vec(),
        }
    }

    /// Size of the parameter in bytes, including padding.
    pub fn size(&self) -> u64 {
        match self {
            MaterialParameter::Float(_) => 4,
            MaterialParameter::Vec2(_) => 8,
            MaterialParameter::Vec3(_) => 16,
            MaterialParameter::Vec4(_) => 16,
            MaterialParameter::Color(_) => 16,
            MaterialParameter::Matrix4(_) => 64,
        }
    }
}

/// Round `offset` up to the next 16-byte uniform boundary.
fn align_uniform(offset: u64) -> u64 {
    (offset + 15) & !15
}

/// A shader with its uniform buffer, texture and bind group, built once.
pub struct Material {
    context: Arc<GraphicsContext>,
    shader: wgpu::ShaderModule,
    uniform_buffer: Option<wgpu::Buffer>,
    /// Uniform name -> (offset, size) in the uniform buffer.
    uniform_offsets: HashMap<String, (u64, u64)>,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    texture: wgpu::Texture,
    texture_view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl Material {
    /// Start building a material.
    pub fn builder() -> MaterialBuilder {
        MaterialBuilder::new()
    }

    /// The shader module.
    pub fn shader(&self) -> &wgpu::ShaderModule {
        &self.shader
    }

    /// The bind group layout, for pipeline creation.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// The bound texture view.
    pub fn texture_view(&self) -> &wgpu::TextureView {
        &self.texture_view
    }

    /// The bound sampler.
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// The bound texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Write a new value for a uniform declared at build time.
    ///
    /// # Panics
    ///
    /// Panics if `name` was not declared through
    /// [`MaterialBuilder::uniform`], or if the new value's size differs
    /// from the declared one.
    pub fn set_uniform(&self, name: &str, value: MaterialParameter) {
        let Some(&(offset, size)) = self.uniform_offsets.get(name) else {
            panic!("material has no uniform named '{}'", name);
        };
        assert!(
            value.size() == size,
            "uniform '{}' was declared with {} bytes, got {}",
            name,
            size,
            value.size()
        );
        let buffer = self
            .uniform_buffer
            .as_ref()
            .expect("uniform offsets imply a uniform buffer");
        self.context
            .queue()
            .write_buffer(buffer, offset, &value.as_bytes());
    }

    /// Bind this material's resources into a render pass.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, group_index: u32) {
        pass.set_bind_group(group_index, &self.bind_group, &[]);
    }
}

/// Builder collecting shader, uniforms and texture for a [`Material`].
pub struct MaterialBuilder {
    shader_source: Option<(Cow<'static, str>, Option<&'static str>)>,
    /// Declaration order determines uniform buffer packing.
    uniforms: Vec<(String, MaterialParameter)>,
    texture: Option<(wgpu::Texture, wgpu::TextureView, wgpu::Sampler)>,
    label: Option<&'static str>,
}

impl MaterialBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            shader_source: None,
            uniforms: Vec::new(),
            texture: None,
            label: None,
        }
    }

    /// Set the WGSL shader source.
    pub fn shader_source(
        mut self,
        source: impl Into<Cow<'static, str>>,
        label: Option<&'static str>,
    ) -> Self {
        self.shader_source = Some((source.into(), label));
        self
    }

    /// Declare a uniform with its initial value. Declaration order fixes
    /// the packing order in the uniform buffer.
    pub fn uniform(mut self, name: impl Into<String>, value: MaterialParameter) -> Self {
        self.uniforms.push((name.into(), value));
        self
    }

    /// Bind a texture and sampler. When omitted, a 1x1 white pixel with a
    /// linear sampler is bound so `color * sample` shading is identity.
    pub fn texture(
        mut self,
        texture: wgpu::Texture,
        view: wgpu::TextureView,
        sampler: wgpu::Sampler,
    ) -> Self {
        self.texture = Some((texture, view, sampler));
        self
    }

    /// Set a debug label used for the GPU objects.
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Create the GPU resources and finish the material.
    ///
    /// # Panics
    ///
    /// Panics if no shader source was set.
    pub fn build(self, ctx: &Arc<GraphicsContext>) -> Material {
        let (source, shader_label) = self
            .shader_source
            .expect("a material requires a shader source");

        let shader = ctx
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: shader_label,
                source: wgpu::ShaderSource::Wgsl(source),
            });

        // Pack uniforms in declaration order, each aligned to 16 bytes.
        let mut uniform_offsets = HashMap::default();
        let mut uniform_data = Vec::new();
        for (name, value) in &self.uniforms {
            let offset = align_uniform(uniform_data.len() as u64);
            uniform_data.resize(offset as usize, 0);
            uniform_data.extend_from_slice(&value.as_bytes());
            uniform_offsets.insert(name.clone(), (offset, value.size()));
        }

        let uniform_buffer = if uniform_data.is_empty() {
            None
        } else {
            let buffer = ctx.device().create_buffer(&wgpu::BufferDescriptor {
                label: self.label.or(Some("Material Uniform Buffer")),
                size: align_uniform(uniform_data.len() as u64),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            ctx.queue().write_buffer(&buffer, 0, &uniform_data);
            Some(buffer)
        };

        let (texture, texture_view, sampler) = match self.texture {
            Some(bound) => bound,
            None => white_pixel(ctx),
        };

        // Layout: binding 0 = uniforms (when present), then texture and
        // sampler on the following bindings.
        let mut layout_entries = Vec::new();
        let mut binding = 0u32;
        if uniform_buffer.is_some() {
            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
            binding += 1;
        }
        let texture_binding = binding;
        layout_entries.push(wgpu::BindGroupLayoutEntry {
            binding: texture_binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        layout_entries.push(wgpu::BindGroupLayoutEntry {
            binding: texture_binding + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });

        let bind_group_layout =
            ctx.device()
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Material Bind Group Layout"),
                    entries: &layout_entries,
                });

        let mut bind_entries = Vec::new();
        if let Some(buffer) = &uniform_buffer {
            bind_entries.push(wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            });
        }
        bind_entries.push(wgpu::BindGroupEntry {
            binding: texture_binding,
            resource: wgpu::BindingResource::TextureView(&texture_view),
        });
        bind_entries.push(wgpu::BindGroupEntry {
            binding: texture_binding + 1,
            resource: wgpu::BindingResource::Sampler(&sampler),
        });

        let bind_group = ctx.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &bind_group_layout,
            entries: &bind_entries,
        });

        Material {
            context: ctx.clone(),
            shader,
            uniform_buffer,
            uniform_offsets,
            bind_group_layout,
            bind_group,
            texture,
            texture_view,
            sampler,
        }
    }
}

impl Default for MaterialBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the 1x1 white fallback texture with a linear sampler.
fn white_pixel(ctx: &GraphicsContext) -> (wgpu::Texture, wgpu::TextureView, wgpu::Sampler) {
    let size = wgpu::Extent3d {
        width: 1,
        height: 1,
        depth_or_array_layers: 1,
    };

    let texture = ctx.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("White Pixel Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    ctx.queue().write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &[255, 255, 255, 255],
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: None,
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let sampler = ctx.device().create_sampler(&wgpu::SamplerDescriptor {
        label: Some("White Pixel Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    (texture, view, sampler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_sizes() {
        assert_eq!(MaterialParameter::Float(0.0).size(), 4);
        assert_eq!(MaterialParameter::Vec2(Vec2::ZERO).size(), 8);
        assert_eq!(MaterialParameter::Vec3(Vec3::ZERO).size(), 16);
        assert_eq!(MaterialParameter::Vec4(Vec4::ZERO).size(), 16);
        assert_eq!(MaterialParameter::Color(Color::WHITE).size(), 16);
        assert_eq!(MaterialParameter::Matrix4(Mat4::IDENTITY).size(), 64);
    }

    #[test]
    fn test_vec3_padding() {
        let bytes = MaterialParameter::Vec3(Vec3::new(1.0, 2.0, 3.0)).as_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[12..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_uniform_alignment() {
        assert_eq!(align_uniform(0), 0);
        assert_eq!(align_uniform(4), 16);
        assert_eq!(align_uniform(16), 16);
        assert_eq!(align_uniform(17), 32);
    }
}
