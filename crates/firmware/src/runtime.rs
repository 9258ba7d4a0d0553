//! Host runtime: one named OS thread per task.
//!
//! Each thread drives its task with a single-threaded tokio runtime; the
//! tasks' timers come from the embassy-time std driver. Priority and core
//! affinity are recorded for diagnostics only.

use core::future::Future;
use std::thread::Scope;

use crate::app::{SpawnError, TaskSpawner};
use crate::config::TaskSpec;
use crate::log;

/// Host threads need far more stack than the device tasks.
pub const HOST_STACK_FACTOR: usize = 16;

/// Spawns tasks as scoped threads, so they may borrow resources owned by
/// the caller of [`std::thread::scope`].
pub struct ThreadSpawner<'scope, 'env> {
    scope: &'scope Scope<'scope, 'env>,
}

impl<'scope, 'env> ThreadSpawner<'scope, 'env> {
    /// Spawner for threads in `scope`.
    pub fn new(scope: &'scope Scope<'scope, 'env>) -> Self {
        Self { scope }
    }
}

impl<'scope> TaskSpawner<'scope> for ThreadSpawner<'scope, '_> {
    fn spawn<F, Fut>(&mut self, spec: &TaskSpec, task: F) -> Result<(), SpawnError>
    where
        F: FnOnce() -> Fut + Send + 'scope,
        Fut: Future<Output = ()> + 'scope,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|_| SpawnError)?;

        log::debug!(
            "spawning {} (stack {}, priority {}, core {})",
            spec.name,
            spec.stack_size,
            spec.priority,
            spec.core
        );

        std::thread::Builder::new()
            .name(spec.name.into())
            .stack_size(spec.stack_size.saturating_mul(HOST_STACK_FACTOR))
            .spawn_scoped(self.scope, move || runtime.block_on(task()))
            .map(drop)
            .map_err(|_| SpawnError)
    }
}
