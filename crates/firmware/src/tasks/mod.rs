//! Peripheral tasks.
//!
//! Every task is one [`PeripheralTask`]: a single iteration that samples or
//! drives its peripheral, reports changes, and says how long to sleep.
//! [`run`] turns it into the never-ending loop the runtime schedules.
//! Failures stay inside the task: an iteration that fails logs, returns a
//! back-off delay, and the loop carries on.

use core::future::Future;

use embassy_time::{Duration, Timer};

use crate::log;

pub mod button;
pub mod buzzer;
pub mod clock;
pub mod digits;
pub mod imu;
pub mod led;
pub mod rgb;
pub mod screen;
pub mod sensor;

pub use button::{ButtonInput, ButtonTask, ButtonTracker};
pub use buzzer::{BuzzerSequence, BuzzerState, BuzzerTask};
pub use clock::ClockTask;
pub use digits::DigitTask;
pub use imu::ImuTask;
pub use led::LedTask;
pub use rgb::RgbBlinkTask;
pub use screen::ScreenDemoTask;
pub use sensor::SensorTask;

/// One periodic peripheral loop.
pub trait PeripheralTask {
    /// Name used in log records.
    fn name(&self) -> &'static str;

    /// Run one iteration and return the delay before the next one.
    fn step(&mut self) -> impl Future<Output = Duration>;
}

/// Drive `task` forever.
pub async fn run<T: PeripheralTask>(mut task: T) {
    log::info!("start {}", task.name());
    loop {
        let delay = task.step().await;
        if delay.as_ticks() > 0 {
            Timer::after(delay).await;
        }
    }
}
