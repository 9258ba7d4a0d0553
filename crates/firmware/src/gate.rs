//! Shared display gate.
//!
//! The display surface is not thread-safe, so every mutation goes through
//! this lock. A task either holds the [`DisplayGuard`] for a short batch of
//! widget updates or uses [`DisplayGate::publish`] for a single closure.
//! There is no timeout: the surface is assumed to live as long as the
//! process.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

/// Exclusive access to the surface; dropping it releases the gate.
pub type DisplayGuard<'a, D> = MutexGuard<'a, CriticalSectionRawMutex, D>;

/// Mutual-exclusion wrapper around the one rendering surface.
pub struct DisplayGate<D> {
    surface: Mutex<CriticalSectionRawMutex, D>,
}

impl<D> DisplayGate<D> {
    /// Take ownership of the surface.
    pub const fn new(surface: D) -> Self {
        Self {
            surface: Mutex::new(surface),
        }
    }

    /// Wait until the gate is free and take it.
    pub async fn acquire(&self) -> DisplayGuard<'_, D> {
        self.surface.lock().await
    }

    /// Take the gate only if nobody holds it.
    pub fn try_acquire(&self) -> Option<DisplayGuard<'_, D>> {
        self.surface.try_lock().ok()
    }

    /// Return the gate early. Equivalent to dropping the guard.
    pub fn release(guard: DisplayGuard<'_, D>) {
        drop(guard);
    }

    /// Run `f` with the gate held.
    pub async fn publish<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        let mut surface = self.acquire().await;
        f(&mut surface)
    }

    /// Give the surface back (tests and shutdown of the simulator).
    pub fn into_inner(self) -> D {
        self.surface.into_inner()
    }
}
