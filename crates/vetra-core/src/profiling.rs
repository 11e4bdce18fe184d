//! Profiling utilities based on the `puffin` crate.

pub use puffin::{GlobalProfiler, profile_function, profile_scope};

#[cfg(feature = "profiling")]
use std::sync::OnceLock;

/// Global profiling server instance.
#[cfg(feature = "profiling")]
static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Enable profiling scopes and start the puffin HTTP server so that
/// `puffin_viewer` can connect.
///
/// # Example
/// ```no_run
/// vetra_core::profiling::init_profiling();
/// ```
#[cfg(feature = "profiling")]
pub fn init_profiling() {
    puffin::set_scopes_on(true);

    match puffin_http::Server::new("0.0.0.0:8585") {
        Ok(server) => {
            tracing::info!("Puffin profiler server started on http://0.0.0.0:8585");

            // Keep the server alive for the lifetime of the process.
            let _ = PROFILING_SERVER.set(server);
        }
        Err(e) => {
            tracing::error!("Failed to start puffin server: {}", e);
        }
    }
}

/// Mark the start of a new frame for profiling.
///
/// Call this once per frame in your main loop to organize profiling data
/// by frame.
#[inline]
pub fn new_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}
