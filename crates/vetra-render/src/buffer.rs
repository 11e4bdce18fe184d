//! Growable GPU buffer used for streamed vertex data.

use crate::context::GraphicsContext;

/// A GPU buffer that reallocates to fit the data written into it.
///
/// On overflow the buffer is replaced with one sized to
/// `max(2 * old, needed.next_power_of_two())`; the old contents are NOT
/// copied, since the owner re-uploads the whole staging slice on every
/// write. Reallocation changes the underlying `wgpu::Buffer` identity, so
/// anything that cached a slice of it must re-bind after [`write`].
///
/// [`write`]: GrowableBuffer::write
#[derive(Debug)]
pub struct GrowableBuffer {
    buffer: wgpu::Buffer,
    len_bytes: u64,
    usage: wgpu::BufferUsages,
    label: &'static str,
}

impl GrowableBuffer {
    /// Minimum allocation, so an empty buffer is still bindable.
    const MIN_SIZE: u64 = 64;

    /// Create an empty buffer with the given usage (COPY_DST is added).
    pub fn new(ctx: &GraphicsContext, label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self::with_capacity(ctx, label, usage, 0)
    }

    /// Create an empty buffer that can hold at least `capacity` bytes
    /// before reallocating.
    pub fn with_capacity(
        ctx: &GraphicsContext,
        label: &'static str,
        usage: wgpu::BufferUsages,
        capacity: u64,
    ) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        let size = Self::MIN_SIZE.max(capacity.next_power_of_two());

        let buffer = ctx.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            len_bytes: 0,
            usage,
            label,
        }
    }

    /// Upload `data` starting at offset zero, replacing previous contents.
    ///
    /// Grows the underlying allocation first if `data` does not fit. An
    /// empty slice just resets the logical length.
    pub fn write(&mut self, ctx: &GraphicsContext, data: &[u8]) {
        let needed = data.len() as u64;
        if needed > self.buffer.size() {
            let new_size = (2 * self.buffer.size()).max(needed.next_power_of_two());
            tracing::trace!(
                "Growing buffer '{}' from {} to {} bytes",
                self.label,
                self.buffer.size(),
                new_size
            );
            self.buffer = ctx.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: new_size,
                usage: self.usage,
                mapped_at_creation: false,
            });
        }

        if !data.is_empty() {
            ctx.queue().write_buffer(&self.buffer, 0, data);
        }
        self.len_bytes = needed;
    }

    /// The underlying GPU buffer. Identity changes on reallocation.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Number of valid bytes written by the last [`write`].
    ///
    /// [`write`]: GrowableBuffer::write
    pub fn len_bytes(&self) -> u64 {
        self.len_bytes
    }

    /// Current allocation size in bytes.
    pub fn capacity_bytes(&self) -> u64 {
        self.buffer.size()
    }

    /// A slice covering the valid contents.
    pub fn valid_slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(0..self.len_bytes)
    }
}
