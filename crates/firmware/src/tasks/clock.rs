//! RTC readout task.

use core::fmt::Write as _;

use embassy_time::Duration;
use heapless::String;
use platform::{DateTime, DisplaySurface, I2cPeripheral};

use super::PeripheralTask;
use crate::config::TimingConfig;
use crate::drivers::Pcf8563;
use crate::log;
use crate::ui::Publisher;

/// `YYYY/MM/DD HH:MM:SS` plus one spare byte.
pub type DateText = String<20>;

/// Render `datetime` for the readout label.
pub fn format_datetime(datetime: &DateTime) -> DateText {
    let mut text = DateText::new();
    // Years are capped at four digits, so the text always fits.
    let _ = write!(text, "{datetime}");
    text
}

/// Reads the PCF8563 and refreshes the datetime label when it changes.
pub struct ClockTask<'a, I, D> {
    rtc: Pcf8563<'a, I>,
    publisher: Option<Publisher<'a, D>>,
    last: Option<DateTime>,
    voltage_warned: bool,
    timing: TimingConfig,
}

impl<'a, I: I2cPeripheral, D: DisplaySurface> ClockTask<'a, I, D> {
    /// Task reading `rtc` every clock period.
    pub fn new(rtc: Pcf8563<'a, I>, publisher: Option<Publisher<'a, D>>, timing: TimingConfig) -> Self {
        Self {
            rtc,
            publisher,
            last: None,
            voltage_warned: false,
            timing,
        }
    }

    /// Last time shown on the label.
    pub fn last(&self) -> Option<DateTime> {
        self.last
    }
}

impl<I: I2cPeripheral, D: DisplaySurface> PeripheralTask for ClockTask<'_, I, D> {
    fn name(&self) -> &'static str {
        "clock"
    }

    async fn step(&mut self) -> Duration {
        let reading = match self.rtc.read_time().await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("clock: rtc read failed: {}", e);
                return self.timing.bus_retry;
            }
        };

        if reading.voltage_low && !self.voltage_warned {
            log::warn!("clock: rtc lost power, time may be invalid");
        }
        self.voltage_warned = reading.voltage_low;

        if self.last != Some(reading.datetime) {
            let text = format_datetime(&reading.datetime);
            log::debug!("clock: {}", text.as_str());
            if let Some(publisher) = &self.publisher {
                publisher.datetime(&text).await;
            }
            self.last = Some(reading.datetime);
        }

        self.timing.clock_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureSet;
    use crate::drivers::pcf8563::{encode, REG_SECONDS};
    use crate::gate::DisplayGate;
    use crate::port::BusPort;
    use crate::ui::Dashboard;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
    use platform::mocks::MockDisplay;
    use platform::{EhI2c, PortMap, PCF8563_ADDRESS};

    fn read(dt: &DateTime) -> Transaction {
        Transaction::write_read(PCF8563_ADDRESS, vec![REG_SECONDS], encode(dt).to_vec())
    }

    #[test]
    fn formats_zero_padded() {
        let dt = DateTime::new(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(format_datetime(&dt).as_str(), "2024/03/05 07:08:09");
    }

    #[tokio::test]
    async fn label_updates_only_when_time_changes() {
        let t0 = DateTime::new(2024, 2, 29, 12, 34, 56).unwrap();
        let t1 = DateTime::new(2024, 2, 29, 12, 34, 57).unwrap();
        let expectations = [read(&t0), read(&t0), read(&t1)];
        let bus = BusPort::new(
            EhI2c::new(I2cMock::new(&expectations), 100_000),
            PortMap::STICK_C_PLUS.internal_bus,
        );
        let mut display = MockDisplay::new();
        let dash = Dashboard::build(&mut display, &FeatureSet::ALL).unwrap();
        display.clear_ops();
        let gate = DisplayGate::new(display);
        let timing = TimingConfig::DEFAULT;

        {
            let mut task = ClockTask::new(
                Pcf8563::new(&bus, PCF8563_ADDRESS),
                Some(Publisher::new(&gate, dash)),
                timing,
            );
            assert_eq!(task.step().await, timing.clock_period);
            task.step().await;
            assert_eq!(gate.acquire().await.ops().len(), 1);
            task.step().await;
            assert_eq!(task.last(), Some(t1));
        }

        let display = gate.into_inner();
        assert_eq!(display.ops().len(), 2);
        assert_eq!(display.text(dash.datetime.unwrap()), "2024/02/29 12:34:57");
        bus.into_inner().release().done();
    }
}
