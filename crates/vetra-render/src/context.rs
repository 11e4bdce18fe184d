use std::sync::Arc;

/// Error raised while acquiring the graphics device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// No suitable GPU adapter was found for the requested backends.
    NoAdapter,
    /// The adapter refused the device request (limits or features).
    RequestDevice(String),
}

impl std::fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "no suitable GPU adapter found"),
            Self::RequestDevice(msg) => write!(f, "device request failed: {}", msg),
        }
    }
}

impl std::error::Error for GraphicsError {}

/// A globally shared graphics context.
///
/// Wraps the wgpu instance, adapter, device and queue behind an `Arc` so
/// meshes, materials and batches can share it cheaply:
///
/// ```rust,no_run
/// use vetra_render::GraphicsContext;
///
/// let ctx = GraphicsContext::new_sync().expect("no GPU");
/// let ctx2 = ctx.clone(); // cheap Arc clone
/// ```
pub struct GraphicsContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GraphicsContext {
    /// Creates a new graphics context with the default descriptor.
    pub async fn new() -> Result<Arc<Self>, GraphicsError> {
        Self::with_descriptor(GraphicsContextDescriptor::default()).await
    }

    /// Creates a new graphics context synchronously.
    ///
    /// Blocks the current thread until the device is ready. See
    /// [`GraphicsContext::new`] for the asynchronous version.
    pub fn new_sync() -> Result<Arc<Self>, GraphicsError> {
        pollster::block_on(Self::new())
    }

    /// Creates a new graphics context from a custom descriptor.
    pub async fn with_descriptor(
        descriptor: GraphicsContextDescriptor,
    ) -> Result<Arc<Self>, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: descriptor.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: descriptor.power_preference,
                compatible_surface: None,
                force_fallback_adapter: descriptor.force_fallback_adapter,
            })
            .await
            .map_err(|_| GraphicsError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: descriptor.limits.clone(),
                label: descriptor.label,
                ..Default::default()
            })
            .await
            .map_err(|e| GraphicsError::RequestDevice(e.to_string()))?;

        tracing::info!(
            "Created graphics context on {} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        Ok(Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
        }))
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Get adapter info for the selected GPU.
    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Get device limits.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }
}

/// Descriptor for configuring graphics context creation.
pub struct GraphicsContextDescriptor {
    /// GPU backends to consider.
    pub backends: wgpu::Backends,
    /// Power preference for adapter selection.
    pub power_preference: wgpu::PowerPreference,
    /// Whether to force the fallback (software) adapter.
    pub force_fallback_adapter: bool,
    /// Required device limits.
    pub limits: wgpu::Limits,
    /// Optional label for debugging.
    pub label: Option<&'static str>,
}

impl Default for GraphicsContextDescriptor {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            limits: wgpu::Limits::default(),
            label: None,
        }
    }
}

impl GraphicsContextDescriptor {
    /// Create a new descriptor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the power preference.
    pub fn power_preference(mut self, preference: wgpu::PowerPreference) -> Self {
        self.power_preference = preference;
        self
    }

    /// Set the backends to use.
    pub fn backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    /// Set the device limits.
    pub fn limits(mut self, limits: wgpu::Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the debug label.
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }
}
