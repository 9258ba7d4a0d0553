//! Hardware Abstraction Layer (HAL) for the handheld sensor stick
//!
//! This crate provides trait-based abstractions for every collaborator the
//! firmware drives, so the application logic can run against mocks on the
//! desktop and against real drivers on the device.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: tasks, port layer, display gate)
//!         ↓
//! Platform HAL (this crate - trait abstractions, board table)
//!         ↓
//! Hardware Layer (MCU HAL, sensor/display drivers)
//! ```
//!
//! # Abstraction Levels
//!
//! ## High-Level Peripherals
//! - [`DisplaySurface`] - Retained-mode widget display
//! - [`Buzzer`] - Passive piezo
//! - [`SegmentDisplay`] - External 4-digit display
//! - [`Accelerometer`] - IMU
//! - [`Connectivity`] - Wi-Fi link and network time
//! - [`RgbLed`] - Addressable RGB LED
//! - [`Backlight`] - Screen backlight power and brightness
//!
//! ## Mid-Level Peripherals
//! - [`gpio`] - Pin numbers, modes and the pad controller
//! - [`peripheral`] - Addressable bus abstraction
//! - [`config`] - Board pin/bus assignment table
//!
//! # Features
//!
//! - `std`: Enable standard library support and the [`mocks`] module
//! - `defmt`: Derive `defmt::Format` on public types

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors; callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod audio;
pub mod backlight;
pub mod config;
pub mod datetime;
pub mod display;
pub mod gpio;
pub mod imu;
pub mod input;
pub mod network;
pub mod peripheral;
pub mod rgb;
pub mod segment;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export main high-level traits
pub use audio::{Buzzer, Tone};
pub use backlight::{Backlight, BRIGHTNESS_MAX};
pub use datetime::{DateTime, DateTimeError};
pub use display::{Anchor, DisplayError, DisplaySurface, StyleClass, WidgetId};
pub use imu::{Acceleration, Accelerometer};
pub use input::{Button, ButtonEvent};
pub use network::Connectivity;
pub use rgb::{Rgb, RgbLed};
pub use segment::{SegmentDisplay, DIGIT_COUNT};

// Re-export GPIO types
pub use gpio::{GpioController, GpioNum, ModeSet, PinMode, PinState};

// Re-export peripheral types
pub use peripheral::{BusError, EhI2c, I2cConfig, I2cPeripheral};

// Re-export board table
pub use config::{BusAssignment, Connector, PortMap, PortPin};
pub use config::{
    BUTTON_A_PIN, BUTTON_B_PIN, BUZZER_PIN, EXT_BUTTON_PIN, EXT_BUTTON_SHARED_PIN, EXT_LED_PIN,
    PCF8563_ADDRESS, SHT3X_ADDRESS, STATUS_LED_PIN,
};
