/// Install the global tracing subscriber used by the engine.
///
/// The filter keeps engine output at `trace` while quieting the chatty
/// wgpu/naga internals. Call once, before any rendering work.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter("trace,wgpu_core=info,wgpu_hal=info,naga=info")
        .init();
}
