//! Composition root.
//!
//! [`start`] takes the board's peripherals, builds one task per enabled
//! feature and hands each to a [`TaskSpawner`]. A peripheral that cannot be
//! brought up costs only its own task: one error record is logged, the task
//! is skipped and boot carries on.

use core::future::Future;

use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;
use platform::{
    Accelerometer, Backlight, Button, BusError, Buzzer, Connectivity, DisplaySurface,
    GpioController, I2cPeripheral, PinMode, PortMap, RgbLed, SegmentDisplay, BUTTON_A_PIN,
    EXT_BUTTON_PIN, EXT_BUTTON_SHARED_PIN, EXT_LED_PIN, PCF8563_ADDRESS, SHT3X_ADDRESS,
};

use crate::config::{AppConfig, TaskSpec};
use crate::drivers::{Pcf8563, Sht3x};
use crate::gate::DisplayGate;
use crate::log;
use crate::port::{BusPort, ExpansionPort, PortError};
use crate::signal::ResumeSignal;
use crate::tasks::{
    self, ButtonInput, ButtonTask, BuzzerSequence, BuzzerTask, ClockTask, DigitTask, ImuTask,
    LedTask, RgbBlinkTask, ScreenDemoTask, SensorTask,
};
use crate::time_sync::TimeSyncTask;
use crate::ui::{Dashboard, Publisher};

/// Most tasks one boot can start.
pub const MAX_TASKS: usize = 12;

/// A peripheral could not be brought up; its task is not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// The board did not provide the peripheral
    Unavailable,
    /// A connector pin could not be claimed
    Claim(PortError),
    /// The device did not answer at boot
    NoAnswer(BusError),
}

impl From<PortError> for InitError {
    fn from(e: PortError) -> Self {
        Self::Claim(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InitError {}

impl core::fmt::Display for InitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "peripheral unavailable"),
            Self::Claim(e) => write!(f, "pin claim failed: {e}"),
            Self::NoAnswer(e) => write!(f, "device did not answer: {e}"),
        }
    }
}

/// The runtime could not create a unit of execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpawnError;

#[cfg(feature = "std")]
impl std::error::Error for SpawnError {}

impl core::fmt::Display for SpawnError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "task could not be spawned")
    }
}

/// Concrete peripheral types of one board.
pub trait Board {
    /// On-board push button
    type Button: InputPin + Send + 'static;
    /// On-board status LED
    type Led: OutputPin + Send + 'static;
    /// Pad controller behind the expansion connectors
    type Gpio: GpioController + Send + 'static;
    /// Port A bus
    type PortBus: I2cPeripheral + Send + 'static;
    /// Internal bus (RTC)
    type InternalBus: I2cPeripheral + Send + 'static;
    /// Rendering surface
    type Display: DisplaySurface + Send + 'static;
    /// Piezo buzzer
    type Buzzer: Buzzer + Send + 'static;
    /// Four-digit segment display
    type Segments: SegmentDisplay + Send + 'static;
    /// Accelerometer
    type Imu: Accelerometer + Send + 'static;
    /// Network time source
    type Net: Connectivity + Send + 'static;
    /// RGB LED on the hat connector
    type Rgb: RgbLed + Send + 'static;
    /// Screen backlight
    type Backlight: Backlight + Send + 'static;
}

/// Peripherals moved into exactly one task each.
pub struct Peripherals<B: Board> {
    /// Buttons A and B
    pub buttons: Result<(B::Button, B::Button), InitError>,
    /// Status LED
    pub status_led: Result<B::Led, InitError>,
    /// Buzzer
    pub buzzer: Result<B::Buzzer, InitError>,
    /// Segment display
    pub segments: Result<B::Segments, InitError>,
    /// Accelerometer
    pub imu: Result<B::Imu, InitError>,
    /// Network time source
    pub connectivity: Result<B::Net, InitError>,
    /// Hat RGB LED
    pub rgb_led: Result<B::Rgb, InitError>,
    /// Screen backlight
    pub backlight: Result<B::Backlight, InitError>,
}

/// Resources tasks share by reference. Lives for the whole run.
pub struct Shared<B: Board> {
    /// Display gate
    pub gate: DisplayGate<B::Display>,
    /// Expansion-connector pins
    pub port: ExpansionPort<B::Gpio>,
    /// Port A bus
    pub port_a: Result<BusPort<B::PortBus>, InitError>,
    /// Internal bus
    pub internal: Result<BusPort<B::InternalBus>, InitError>,
    /// Button → buzzer wake-up
    pub resume: ResumeSignal,
}

impl<B: Board> Shared<B> {
    /// Wrap the shared peripherals wired as `map`.
    pub fn new(
        map: PortMap,
        display: B::Display,
        gpio: B::Gpio,
        port_a: Result<B::PortBus, InitError>,
        internal: Result<B::InternalBus, InitError>,
    ) -> Self {
        Self {
            gate: DisplayGate::new(display),
            port: ExpansionPort::new(gpio, map),
            port_a: port_a.map(|bus| BusPort::new(bus, map.port_a_bus)),
            internal: internal.map(|bus| BusPort::new(bus, map.internal_bus)),
            resume: ResumeSignal::new(),
        }
    }
}

/// Starts tasks on whatever execution units the platform offers.
pub trait TaskSpawner<'a> {
    /// Run `task()` on a new unit of execution described by `spec`.
    ///
    /// The closure is called once, on the new unit, and its future is
    /// polled there until it completes (which peripheral tasks never do).
    fn spawn<F, Fut>(&mut self, spec: &TaskSpec, task: F) -> Result<(), SpawnError>
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = ()> + 'a;
}

/// Which tasks came up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootReport {
    /// Names of started tasks, in start order
    pub started: Vec<&'static str, MAX_TASKS>,
    /// Names of enabled tasks that could not be started
    pub failed: Vec<&'static str, MAX_TASKS>,
}

impl BootReport {
    /// Whether `name` was started.
    pub fn is_started(&self, name: &str) -> bool {
        self.started.iter().any(|n| *n == name)
    }

    fn launch<'a, S, F, Fut>(&mut self, spawner: &mut S, spec: &TaskSpec, task: Result<F, InitError>)
    where
        S: TaskSpawner<'a>,
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = ()> + 'a,
    {
        let failed = match task {
            Ok(task) => match spawner.spawn(spec, task) {
                Ok(()) => {
                    log::debug!("{} spawned", spec.name);
                    let _ = self.started.push(spec.name);
                    return;
                }
                Err(e) => {
                    log::error!("{} not started: {}", spec.name, e);
                    spec.name
                }
            },
            Err(e) => {
                log::error!("{} not started: {}", spec.name, e);
                spec.name
            }
        };
        let _ = self.failed.push(failed);
    }
}

/// Build and spawn every enabled task.
pub async fn start<'a, B, S>(
    shared: &'a Shared<B>,
    peripherals: Peripherals<B>,
    config: &AppConfig,
    spawner: &mut S,
) -> BootReport
where
    B: Board,
    S: TaskSpawner<'a>,
{
    let features = config.features;
    let timing = config.timing;
    let mut report = BootReport::default();

    let publisher = if features.ui {
        match shared.gate.publish(|d| Dashboard::build(d, &features)).await {
            Ok(dashboard) => Some(Publisher::new(&shared.gate, dashboard)),
            Err(_) => {
                log::error!("display: dashboard could not be built");
                None
            }
        }
    } else {
        None
    };

    if features.button {
        let task = peripherals.buttons.map(|(a, b)| {
            let mut task = ButtonTask::new("button", timing.button_period, publisher)
                .with_input(ButtonInput::new(Button::A, a, true, timing.long_press))
                .with_input(ButtonInput::new(Button::B, b, true, timing.long_press));
            if features.button_triggers_buzzer() {
                log::debug!("button {} ({}) wakes the buzzer", Button::A.as_str(), BUTTON_A_PIN);
                task = task.with_trigger(Button::A, &shared.resume);
            }
            move || tasks::run(task)
        });
        report.launch(spawner, &TaskSpec::BUTTON, task);
    }

    if features.external_button {
        let task = external_button(&shared.port).map(|line| {
            let task = ButtonTask::new("external_button", timing.button_period, publisher)
                .with_input(ButtonInput::new(Button::External, line, true, timing.long_press));
            move || tasks::run(task)
        });
        report.launch(spawner, &TaskSpec::EXTERNAL_BUTTON, task);
    }

    if features.led {
        let task = peripherals.status_led.map(|pin| {
            let task = LedTask::new("led", pin, true, timing.led_period);
            move || tasks::run(task)
        });
        report.launch(spawner, &TaskSpec::LED, task);
    }

    if features.external_led {
        let task = shared
            .port
            .line(EXT_LED_PIN, PinMode::Output)
            .map_err(InitError::from)
            .map(|line| {
                let task = LedTask::new("external_led", line, false, timing.led_period);
                move || tasks::run(task)
            });
        report.launch(spawner, &TaskSpec::EXTERNAL_LED, task);
    }

    if features.rgb_led {
        let pad_free = features.rgb_led_enabled();
        let task = rgb_led::<B>(&shared.port, peripherals.rgb_led, pad_free).map(|led| {
            let task = RgbBlinkTask::new(led, timing.rgb_period);
            move || tasks::run(task)
        });
        report.launch(spawner, &TaskSpec::RGB_LED, task);
    }

    if features.screen_demo {
        let task = peripherals.backlight.map(|backlight| {
            let task = ScreenDemoTask::new(backlight, timing.screen_period);
            move || tasks::run(task)
        });
        report.launch(spawner, &TaskSpec::SCREEN, task);
    }

    if features.buzzer {
        let task = peripherals.buzzer.map(|buzzer| {
            let task = BuzzerTask::new(buzzer, BuzzerSequence::c_major(&timing), &shared.resume);
            move || tasks::run(task)
        });
        report.launch(spawner, &TaskSpec::BUZZER, task);
    }

    if features.sensor {
        let task = detect_sensor(shared).await.map(|sensor| {
            let task = SensorTask::new(sensor, publisher, timing);
            move || tasks::run(task)
        });
        report.launch(spawner, &TaskSpec::SENSOR, task);
    }

    let rtc = if features.clock || features.digit_display {
        detect_rtc(shared).await
    } else {
        Err(InitError::Unavailable)
    };

    if features.clock {
        let task = rtc.clone().map(|rtc| {
            let task = ClockTask::new(rtc, publisher, timing);
            move || tasks::run(task)
        });
        report.launch(spawner, &TaskSpec::CLOCK, task);
    }

    if features.time_sync_enabled() {
        let utc_offset = config.utc_offset_secs;
        let task = rtc.clone().and_then(|rtc| {
            peripherals.connectivity.map(|net| {
                let task = TimeSyncTask::new(net, rtc, publisher, timing, utc_offset);
                move || tasks::run(task)
            })
        });
        report.launch(spawner, &TaskSpec::TIME_SYNC, task);
    }

    if features.digit_display {
        let task = rtc.and_then(|rtc| {
            peripherals.segments.map(|segments| {
                let task = DigitTask::new(rtc, segments, timing);
                move || tasks::run(task)
            })
        });
        report.launch(spawner, &TaskSpec::DIGITS, task);
    }

    if features.imu {
        let task = peripherals.imu.map(|imu| {
            let task = ImuTask::new(imu, timing.imu_period, timing.bus_retry);
            move || tasks::run(task)
        });
        report.launch(spawner, &TaskSpec::IMU, task);
    }

    log::info!(
        "boot complete: {} tasks started, {} failed",
        report.started.len(),
        report.failed.len()
    );
    report
}

/// The hat button shares its pad with GPIO 25, which must be released to
/// input first.
fn external_button<G: GpioController>(
    port: &ExpansionPort<G>,
) -> Result<crate::port::PortLine<'_, G>, InitError> {
    port.configure(EXT_BUTTON_SHARED_PIN, PinMode::Input)?;
    Ok(port.line(EXT_BUTTON_PIN, PinMode::Input)?)
}

/// The RGB LED shares its data pad with the hat LED.
fn rgb_led<B: Board>(
    port: &ExpansionPort<B::Gpio>,
    led: Result<B::Rgb, InitError>,
    pad_free: bool,
) -> Result<B::Rgb, InitError> {
    if !pad_free {
        return Err(InitError::Claim(PortError::Conflict(EXT_LED_PIN, PinMode::Output)));
    }
    let led = led?;
    port.configure(EXT_LED_PIN, PinMode::Output)?;
    Ok(led)
}

async fn detect_sensor<B: Board>(shared: &Shared<B>) -> Result<Sht3x<'_, B::PortBus>, InitError> {
    let bus = shared.port_a.as_ref().map_err(|e| *e)?;
    shared.port.claim_bus(bus.assignment())?;
    let mut sensor = Sht3x::new(bus, SHT3X_ADDRESS);
    sensor.reset().await.map_err(InitError::NoAnswer)?;
    Ok(sensor)
}

async fn detect_rtc<B: Board>(shared: &Shared<B>) -> Result<Pcf8563<'_, B::InternalBus>, InitError> {
    let bus = shared.internal.as_ref().map_err(|e| *e)?;
    let mut rtc = Pcf8563::new(bus, PCF8563_ADDRESS);
    let reading = rtc.read_time().await.map_err(InitError::NoAnswer)?;
    log::info!("rtc: {}", reading.datetime);
    Ok(rtc)
}
