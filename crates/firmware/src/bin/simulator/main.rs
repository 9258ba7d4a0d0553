//! Desktop simulator.
//!
//! Runs every enabled task against simulated peripherals, one OS thread per
//! task. Button A is long-pressed every 20 s, the network comes up after
//! 10 s and the sensor drifts with the host clock.
//!
//! ```bash
//! RUST_LOG=debug FIRMWARE_TIME_SCALE=10 cargo run --bin simulator --features emulator
//! ```
//!
//! `FIRMWARE_TIME_SCALE` divides every task period; the simulated RTC always
//! runs in real time.

#![allow(clippy::arithmetic_side_effects)] // host-only arithmetic on wall-clock values
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]

mod sim;

use std::time::Duration;

use firmware::{AppConfig, Board, Peripherals, Shared, ThreadSpawner, TimingConfig};
use platform::mocks::MockGpio;
use platform::{EhI2c, PinState, PortMap, EXT_BUTTON_PIN};
use tracing_subscriber::EnvFilter;

use sim::{
    LogBacklight, LogBuzzer, LogDisplay, LogRgbLed, LogSegments, SimButton, SimI2c, SimImu, SimLed,
    SimNet,
};

struct SimBoard;

impl Board for SimBoard {
    type Button = SimButton;
    type Led = SimLed;
    type Gpio = MockGpio;
    type PortBus = EhI2c<SimI2c>;
    type InternalBus = EhI2c<SimI2c>;
    type Display = LogDisplay;
    type Buzzer = LogBuzzer;
    type Segments = LogSegments;
    type Imu = SimImu;
    type Net = SimNet;
    type Rgb = LogRgbLed;
    type Backlight = LogBacklight;
}

fn time_scale() -> u32 {
    std::env::var("FIRMWARE_TIME_SCALE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .init();

    let scale = time_scale();
    let config = AppConfig {
        timing: TimingConfig::DEFAULT.scaled(scale),
        ..AppConfig::default()
    };
    tracing::info!(
        "{} v{} (time scale 1/{})",
        platform::config::dev_banner(),
        platform::config::APP_VERSION,
        scale.max(1)
    );

    // The hat button idles high (active-low).
    let mut gpio = MockGpio::new();
    gpio.set_input(EXT_BUTTON_PIN, PinState::High);

    let map = PortMap::STICK_C_PLUS;
    let shared: Shared<SimBoard> = Shared::new(
        map,
        LogDisplay::new(),
        gpio,
        Ok(EhI2c::new(SimI2c::port_a(), map.port_a_bus.standard_hz)),
        Ok(EhI2c::new(SimI2c::internal(), map.internal_bus.standard_hz)),
    );

    let peripherals = Peripherals::<SimBoard> {
        buttons: Ok((
            SimButton::scripted(Duration::from_secs(20), Duration::from_millis(1500)),
            SimButton::idle(),
        )),
        status_led: Ok(SimLed::new("status")),
        buzzer: Ok(LogBuzzer),
        segments: Ok(LogSegments),
        imu: Ok(SimImu),
        connectivity: Ok(SimNet::new(Duration::from_secs(10), Duration::from_secs(2))),
        rgb_led: Ok(LogRgbLed),
        backlight: Ok(LogBacklight),
    };

    std::thread::scope(|scope| {
        let mut spawner = ThreadSpawner::new(scope);
        let report = embassy_futures::block_on(firmware::start(
            &shared,
            peripherals,
            &config,
            &mut spawner,
        ));
        tracing::info!(
            started = report.started.len(),
            failed = report.failed.len(),
            "simulator running"
        );
    });
}
