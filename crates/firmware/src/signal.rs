//! Button → buzzer wake-up.
//!
//! A single-slot notification with overwrite semantics: at most one wake-up
//! is ever pending, and a wake-up that arrives while the sequence is playing
//! is discarded instead of queued.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Wake-up channel between the button task and the buzzer task.
pub struct ResumeSignal {
    signal: Signal<CriticalSectionRawMutex, ()>,
    playing: AtomicBool,
}

impl ResumeSignal {
    /// Idle channel with nothing pending.
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
            playing: AtomicBool::new(false),
        }
    }

    /// Wake the buzzer.
    ///
    /// Returns `false` when the buzzer is already playing; the request is
    /// dropped in that case.
    pub fn resume(&self) -> bool {
        if self.playing.load(Ordering::Acquire) {
            return false;
        }
        self.signal.signal(());
        true
    }

    /// Suspend until resumed. The returned [`Playback`] marks the buzzer as
    /// playing until it is dropped.
    pub async fn wait(&self) -> Playback<'_> {
        self.signal.wait().await;
        self.playing.store(true, Ordering::Release);
        Playback { owner: self }
    }

    /// Whether a playback is in progress.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Whether a wake-up is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.signal.signaled()
    }
}

impl Default for ResumeSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that the buzzer is playing; dropping it returns to suspended.
pub struct Playback<'a> {
    owner: &'a ResumeSignal,
}

impl Drop for Playback<'_> {
    fn drop(&mut self) {
        // A resume that raced the start of playback must not replay.
        self.owner.signal.reset();
        self.owner.playing.store(false, Ordering::Release);
    }
}
