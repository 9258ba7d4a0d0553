//! Network connectivity and network-time abstraction
//!
//! Wraps the Wi-Fi station and the SNTP client. The firmware polls these
//! flags; no callbacks cross the boundary.

/// Connectivity collaborator consumed by the time synchronization task.
pub trait Connectivity {
    /// Whether the station currently holds an IP lease.
    fn is_connected(&mut self) -> bool;

    /// Start a network-time request. Idempotent while one is pending.
    fn request_time_sync(&mut self);

    /// Whether the pending request has completed and the system clock is set.
    fn time_sync_complete(&mut self) -> bool;

    /// Stop the time client and clear the completion flag.
    fn stop_time_sync(&mut self);

    /// Current system wall-clock time as Unix seconds (UTC).
    fn unix_time(&mut self) -> i64;
}
