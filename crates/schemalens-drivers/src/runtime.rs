//! Shared Tokio runtime for synchronous callers
//!
//! Resolver operations are async. Callers without an executor of their own
//! drive them to completion on this runtime.

use std::sync::OnceLock;
use tokio::runtime::Runtime;

static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or create the shared Tokio runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be created.
pub fn get_tokio_runtime() -> &'static Runtime {
    TOKIO_RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("schemalens-runtime")
            .build()
            .expect("Failed to create Tokio runtime for schemalens")
    })
}

/// Run a future to completion on the shared runtime, blocking the current thread.
///
/// Must not be called from inside an async context.
///
/// # Example
///
/// ```ignore
/// let tables = block_on_tokio(resolver.tables())?;
/// ```
pub fn block_on_tokio<F, T>(future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    get_tokio_runtime().block_on(future)
}
