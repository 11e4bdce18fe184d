//! Framebuffer abstraction for offscreen rendering.

use crate::context::GraphicsContext;

/// An offscreen color render target.
#[derive(Debug)]
pub struct Framebuffer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

impl Framebuffer {
    /// Create a new framebuffer builder.
    pub fn builder(width: u32, height: u32) -> FramebufferBuilder {
        FramebufferBuilder::new(width, height)
    }

    /// Get the color texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Get the color texture view to render into.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Get the framebuffer width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the framebuffer height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the color format.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// Builder for [`Framebuffer`].
pub struct FramebufferBuilder {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    label: Option<&'static str>,
}

impl FramebufferBuilder {
    /// Start a builder for a target of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            label: None,
        }
    }

    /// Set the color format (default `Rgba8UnormSrgb`).
    pub fn format(mut self, format: wgpu::TextureFormat) -> Self {
        self.format = format;
        self
    }

    /// Set a debug label.
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Create the GPU texture and finish the framebuffer.
    ///
    /// # Panics
    ///
    /// Panics if width or height is zero.
    pub fn build(self, ctx: &GraphicsContext) -> Framebuffer {
        assert!(
            self.width > 0 && self.height > 0,
            "framebuffer dimensions must be non-zero ({}x{})",
            self.width,
            self.height
        );

        let texture = ctx.device().create_texture(&wgpu::TextureDescriptor {
            label: self.label.or(Some("Framebuffer Color Texture")),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Framebuffer {
            texture,
            view,
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }
}
