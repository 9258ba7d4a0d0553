//! Stick Firmware
//!
//! Task orchestration for a small handheld with buttons, LEDs, a buzzer, an
//! environmental sensor, an RTC, a segment display and one shared screen.
//!
//! # Architecture
//!
//! ```text
//! app::start (composition root)
//!         ↓ spawns
//! tasks::* + time_sync      (one unit of execution each)
//!         ↓ share
//! gate (display) · signal (button → buzzer) · port (pins, buses)
//!         ↓
//! platform traits (GPIO, I2C, display, buzzer, ...)
//! ```
//!
//! # Features
//!
//! - one flag per peripheral task (`button`, `led`, `sensor`, ...), all on
//!   by default
//! - `defmt` - log through defmt (hardware builds)
//! - `tracing` - log through tracing
//! - `emulator` - desktop simulator: OS-thread runtime and the `simulator`
//!   binary
//!
//! # Simulator
//!
//! ```bash
//! RUST_LOG=debug FIRMWARE_TIME_SCALE=10 cargo run --bin simulator --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::unused_self)]
#![allow(clippy::unused_async)]

mod log;

pub mod app;
pub mod config;
pub mod drivers;
pub mod gate;
pub mod port;
pub mod signal;
pub mod tasks;
pub mod time_sync;
pub mod ui;

#[cfg(feature = "emulator")]
pub mod runtime;

// Re-export key types
pub use app::{start, Board, BootReport, InitError, Peripherals, Shared, SpawnError, TaskSpawner};
pub use config::{AppConfig, FeatureSet, TaskSpec, TimingConfig};
pub use gate::DisplayGate;
pub use port::{BusDevice, BusPort, ExpansionPort, PortError, PortLine};
pub use signal::ResumeSignal;
pub use time_sync::{SyncPhase, TimeSyncTask};
pub use ui::{Dashboard, Publisher};

#[cfg(feature = "emulator")]
pub use runtime::ThreadSpawner;
