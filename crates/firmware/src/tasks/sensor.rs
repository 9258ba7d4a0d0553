//! Temperature/humidity task.

use embassy_time::{Duration, Timer};
use platform::{DisplaySurface, I2cPeripheral};

use super::PeripheralTask;
use crate::config::TimingConfig;
use crate::drivers::Sht3x;
use crate::log;
use crate::ui::Publisher;

/// Polls the SHT3x and feeds both meters.
pub struct SensorTask<'a, I, D> {
    sensor: Sht3x<'a, I>,
    publisher: Option<Publisher<'a, D>>,
    last: Option<(i32, i32)>,
    timing: TimingConfig,
}

impl<'a, I: I2cPeripheral, D: DisplaySurface> SensorTask<'a, I, D> {
    /// Task reading `sensor` and publishing through `publisher`.
    pub fn new(sensor: Sht3x<'a, I>, publisher: Option<Publisher<'a, D>>, timing: TimingConfig) -> Self {
        Self {
            sensor,
            publisher,
            last: None,
            timing,
        }
    }

    /// Last published `(temperature, humidity)`, whole units.
    pub fn last(&self) -> Option<(i32, i32)> {
        self.last
    }
}

impl<I: I2cPeripheral, D: DisplaySurface> PeripheralTask for SensorTask<'_, I, D> {
    fn name(&self) -> &'static str {
        "sensor"
    }

    async fn step(&mut self) -> Duration {
        let measurement = match self.sensor.measure().await {
            Ok(m) => m,
            Err(e) => {
                log::warn!("sensor: read failed: {}", e);
                return self.timing.bus_retry;
            }
        };

        log::info!(
            "temperature: {} humidity: {}",
            measurement.temperature,
            measurement.humidity
        );

        let reading = (measurement.temperature_int(), measurement.humidity_int());
        if self.last != Some(reading) {
            if let Some(publisher) = &self.publisher {
                publisher.temperature(reading.0).await;
                publisher.humidity(reading.1).await;
            }
            self.last = Some(reading);
        }

        Timer::after(self.timing.sensor_settle).await;
        self.timing.sensor_period
    }
}
