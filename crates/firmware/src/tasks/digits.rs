//! Four-digit `HH:MM` clock on the segment display.

use embassy_time::Duration;
use platform::{DateTime, I2cPeripheral, SegmentDisplay, DIGIT_COUNT};

use super::PeripheralTask;
use crate::config::TimingConfig;
use crate::drivers::Pcf8563;
use crate::log;

/// Brightness set once before the first frame.
pub const DIGIT_BRIGHTNESS: u8 = 7;

/// Digits for `HHMM`.
pub fn hhmm(datetime: &DateTime) -> [u8; DIGIT_COUNT] {
    let (h, m) = (datetime.hour(), datetime.minute());
    [h / 10, h % 10, m / 10, m % 10]
}

/// Mirrors the RTC onto a segment display, blinking the colon.
pub struct DigitTask<'a, I, S> {
    rtc: Pcf8563<'a, I>,
    display: S,
    colon: bool,
    brightness_set: bool,
    shown: Option<([u8; DIGIT_COUNT], bool)>,
    timing: TimingConfig,
}

impl<'a, I: I2cPeripheral, S: SegmentDisplay> DigitTask<'a, I, S> {
    /// Task reading `rtc` and driving `display`.
    pub fn new(rtc: Pcf8563<'a, I>, display: S, timing: TimingConfig) -> Self {
        Self {
            rtc,
            display,
            colon: false,
            brightness_set: false,
            shown: None,
            timing,
        }
    }

    /// Last frame written to the display.
    pub fn shown(&self) -> Option<([u8; DIGIT_COUNT], bool)> {
        self.shown
    }
}

impl<I: I2cPeripheral, S: SegmentDisplay> PeripheralTask for DigitTask<'_, I, S> {
    fn name(&self) -> &'static str {
        "digits"
    }

    async fn step(&mut self) -> Duration {
        if !self.brightness_set {
            match self.display.set_brightness(DIGIT_BRIGHTNESS) {
                Ok(()) => self.brightness_set = true,
                Err(_) => log::warn!("digits: brightness write failed"),
            }
        }

        let reading = match self.rtc.read_time().await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("digits: rtc read failed: {}", e);
                return self.timing.bus_retry;
            }
        };

        self.colon = !self.colon;
        let frame = (hhmm(&reading.datetime), self.colon);
        if self.shown != Some(frame) {
            match self.display.show(&frame.0, frame.1) {
                Ok(()) => self.shown = Some(frame),
                Err(_) => log::warn!("digits: display write failed"),
            }
        }

        self.timing.digit_period
    }
}
