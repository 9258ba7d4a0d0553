//! Bus device drivers.
//!
//! Thin register-level drivers on top of [`crate::port::BusPort`]. Each
//! driver opens the bus for exactly one transaction sequence and closes it
//! again, so devices sharing a bus interleave at transaction granularity.

pub mod pcf8563;
pub mod sht3x;

pub use pcf8563::{Pcf8563, RtcReading};
pub use sht3x::{Measurement, Sht3x};
