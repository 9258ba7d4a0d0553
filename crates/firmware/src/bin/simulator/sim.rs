//! Simulated peripherals for the desktop build.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use embedded_hal::digital::{ErrorType as DigitalErrorType, InputPin, OutputPin};
use embedded_hal::i2c::{ErrorKind, ErrorType as I2cErrorType, I2c, NoAcknowledgeSource, Operation};
use firmware::drivers::pcf8563::{self, REG_SECONDS};
use firmware::drivers::sht3x::{crc8, CMD_MEASURE_HIGH, CMD_SOFT_RESET};
use platform::mocks::MockDisplay;
use platform::{
    Acceleration, Accelerometer, Anchor, Backlight, Buzzer, Connectivity, DateTime,
    DisplaySurface, Rgb, RgbLed, SegmentDisplay, StyleClass, Tone, WidgetId, DIGIT_COUNT,
    PCF8563_ADDRESS, SHT3X_ADDRESS,
};

// ── Buttons and LEDs ─────────────────────────────────────────────────────────

/// Active-low button pressed for `hold` at the start of every `every`.
pub struct SimButton {
    started: Instant,
    every: std::time::Duration,
    hold: std::time::Duration,
}

impl SimButton {
    /// Button with a scripted press pattern.
    pub fn scripted(every: std::time::Duration, hold: std::time::Duration) -> Self {
        Self {
            started: Instant::now(),
            every,
            hold,
        }
    }

    /// Button nobody touches.
    pub fn idle() -> Self {
        Self::scripted(std::time::Duration::MAX, std::time::Duration::ZERO)
    }

    fn pressed(&self) -> bool {
        let every = self.every.as_millis().max(1);
        let phase = self.started.elapsed().as_millis() % every;
        phase < self.hold.as_millis()
    }
}

impl DigitalErrorType for SimButton {
    type Error = core::convert::Infallible;
}

impl InputPin for SimButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.pressed())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pressed())
    }
}

/// LED that logs its level.
pub struct SimLed {
    name: &'static str,
}

impl SimLed {
    /// LED labelled `name` in the log.
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl DigitalErrorType for SimLed {
    type Error = core::convert::Infallible;
}

impl OutputPin for SimLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        tracing::trace!(led = self.name, level = "low");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        tracing::trace!(led = self.name, level = "high");
        Ok(())
    }
}

// ── I2C devices ──────────────────────────────────────────────────────────────

/// SHT3x model producing a slow temperature/humidity drift.
#[derive(Default)]
struct Sht3xModel {
    frame: Option<[u8; 6]>,
}

impl Sht3xModel {
    fn write(&mut self, data: &[u8]) -> Result<(), ErrorKind> {
        if data == CMD_SOFT_RESET {
            self.frame = None;
            Ok(())
        } else if data == CMD_MEASURE_HIGH {
            self.frame = Some(Self::measure());
            Ok(())
        } else {
            Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data))
        }
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), ErrorKind> {
        let frame = self
            .frame
            .take()
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;
        for (dst, src) in buffer.iter_mut().zip(frame) {
            *dst = src;
        }
        Ok(())
    }

    fn measure() -> [u8; 6] {
        let minute = (unix_now() / 60) % 60;
        let celsius = 20.0 + (minute as f32 / 6.0);
        let humidity = 45.0 + (minute as f32 / 2.0);
        let t = (((celsius + 45.0) / 175.0) * 65535.0) as u16;
        let h = ((humidity / 100.0) * 65535.0) as u16;
        let [t0, t1] = t.to_be_bytes();
        let [h0, h1] = h.to_be_bytes();
        [t0, t1, crc8(&[t0, t1]), h0, h1, crc8(&[h0, h1])]
    }
}

/// 2022/01/01 12:00:00, the factory time of the simulated RTC.
const RTC_FACTORY_TIME: i64 = 1_641_038_400;

/// PCF8563 model that advances with the host clock.
struct RtcModel {
    set_at: Instant,
    base: i64,
    pointer: u8,
}

impl RtcModel {
    fn new() -> Self {
        Self {
            set_at: Instant::now(),
            base: RTC_FACTORY_TIME,
            pointer: REG_SECONDS,
        }
    }

    fn now(&self) -> Option<DateTime> {
        let elapsed = self.set_at.elapsed().as_secs() as i64;
        DateTime::from_unix(self.base + elapsed)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ErrorKind> {
        let Some((&register, payload)) = data.split_first() else {
            return Err(ErrorKind::Other);
        };
        self.pointer = register;
        if payload.is_empty() {
            return Ok(());
        }
        let regs: [u8; 7] = payload
            .try_into()
            .map_err(|_| ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data))?;
        if register != REG_SECONDS {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }
        let reading = pcf8563::decode(&regs).map_err(|_| ErrorKind::Other)?;
        tracing::info!(time = %reading.datetime, "sim rtc set");
        self.base = reading.datetime.to_unix();
        self.set_at = Instant::now();
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), ErrorKind> {
        if self.pointer != REG_SECONDS {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }
        let now = self.now().ok_or(ErrorKind::Other)?;
        let regs = pcf8563::encode(&now);
        for (dst, src) in buffer.iter_mut().zip(regs) {
            *dst = src;
        }
        Ok(())
    }
}

/// Register-level bus with at most one SHT3x and one PCF8563 on it.
pub struct SimI2c {
    sht3x: Option<Sht3xModel>,
    rtc: Option<RtcModel>,
}

impl SimI2c {
    /// Port A with the sensor plugged in.
    pub fn port_a() -> Self {
        Self {
            sht3x: Some(Sht3xModel::default()),
            rtc: None,
        }
    }

    /// Internal bus with the RTC.
    pub fn internal() -> Self {
        Self {
            sht3x: None,
            rtc: Some(RtcModel::new()),
        }
    }
}

impl I2cErrorType for SimI2c {
    type Error = ErrorKind;
}

impl I2c for SimI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        for op in operations {
            match (address, op) {
                (SHT3X_ADDRESS, Operation::Write(data)) => {
                    self.sht3x.as_mut().ok_or(nack)?.write(data)?;
                }
                (SHT3X_ADDRESS, Operation::Read(buffer)) => {
                    self.sht3x.as_mut().ok_or(nack)?.read(buffer)?;
                }
                (PCF8563_ADDRESS, Operation::Write(data)) => {
                    self.rtc.as_mut().ok_or(nack)?.write(data)?;
                }
                (PCF8563_ADDRESS, Operation::Read(buffer)) => {
                    self.rtc.as_mut().ok_or(nack)?.read(buffer)?;
                }
                _ => return Err(nack),
            }
        }
        Ok(())
    }
}

// ── Display, buzzer, digits, LEDs, IMU ───────────────────────────────────────

/// In-memory surface that logs every mutation.
#[derive(Default)]
pub struct LogDisplay {
    inner: MockDisplay,
}

impl LogDisplay {
    /// Empty surface.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySurface for LogDisplay {
    type Error = platform::DisplayError;

    fn create_label(
        &mut self,
        parent: Option<WidgetId>,
        anchor: Anchor,
        text: &str,
    ) -> Result<WidgetId, Self::Error> {
        self.inner.create_label(parent, anchor, text)
    }

    fn create_meter(&mut self, anchor: Anchor, min: i32, max: i32) -> Result<WidgetId, Self::Error> {
        self.inner.create_meter(anchor, min, max)
    }

    fn set_text(&mut self, widget: WidgetId, text: &str) -> Result<(), Self::Error> {
        self.inner.set_text(widget, text)?;
        self.inner.clear_ops();
        tracing::info!(widget = ?widget, text, "display");
        Ok(())
    }

    fn set_value(&mut self, widget: WidgetId, value: i32) -> Result<(), Self::Error> {
        self.inner.set_value(widget, value)?;
        self.inner.clear_ops();
        tracing::debug!(widget = ?widget, value, "display");
        Ok(())
    }

    fn set_style(&mut self, widget: WidgetId, style: StyleClass) -> Result<(), Self::Error> {
        self.inner.set_style(widget, style)?;
        self.inner.clear_ops();
        tracing::debug!(widget = ?widget, style = ?style, "display");
        Ok(())
    }
}

/// Buzzer that logs notes.
pub struct LogBuzzer;

impl Buzzer for LogBuzzer {
    type Error = core::convert::Infallible;

    fn play(&mut self, tone: Tone) -> Result<(), Self::Error> {
        tracing::info!(hz = tone.frequency_hz, duty = tone.duty, "buzzer");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        tracing::info!("buzzer off");
        Ok(())
    }
}

/// Segment display that logs frames.
pub struct LogSegments;

impl SegmentDisplay for LogSegments {
    type Error = core::convert::Infallible;

    fn show(&mut self, digits: &[u8; DIGIT_COUNT], colon: bool) -> Result<(), Self::Error> {
        let [a, b, c, d] = *digits;
        let sep = if colon { ':' } else { ' ' };
        tracing::debug!("digits {a}{b}{sep}{c}{d}");
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), Self::Error> {
        tracing::debug!(level, "digits brightness");
        Ok(())
    }
}

/// RGB LED that logs colours.
pub struct LogRgbLed;

impl RgbLed for LogRgbLed {
    type Error = core::convert::Infallible;

    fn set_color(&mut self, color: Rgb) -> Result<(), Self::Error> {
        tracing::trace!(color = %color, "rgb led");
        Ok(())
    }
}

/// Backlight that logs every change.
pub struct LogBacklight;

impl Backlight for LogBacklight {
    type Error = core::convert::Infallible;

    fn set_brightness(&mut self, level: u8) -> Result<(), Self::Error> {
        tracing::debug!(level, "backlight");
        Ok(())
    }

    fn set_power(&mut self, on: bool) -> Result<(), Self::Error> {
        tracing::debug!(on, "backlight power");
        Ok(())
    }
}

/// Accelerometer lying flat.
pub struct SimImu;

impl Accelerometer for SimImu {
    type Error = core::convert::Infallible;

    fn acceleration(&mut self) -> Result<Acceleration, Self::Error> {
        Ok(Acceleration {
            x: 0.0,
            y: 0.0,
            z: 1.0,
        })
    }
}

// ── Connectivity ─────────────────────────────────────────────────────────────

/// Link that comes up after a delay and answers time requests from the
/// host clock.
pub struct SimNet {
    started: Instant,
    up_after: std::time::Duration,
    answer_after: std::time::Duration,
    requested: Option<Instant>,
}

impl SimNet {
    /// Link up after `up_after`; each time request answers after
    /// `answer_after`.
    pub fn new(up_after: std::time::Duration, answer_after: std::time::Duration) -> Self {
        Self {
            started: Instant::now(),
            up_after,
            answer_after,
            requested: None,
        }
    }
}

impl Connectivity for SimNet {
    fn is_connected(&mut self) -> bool {
        self.started.elapsed() >= self.up_after
    }

    fn request_time_sync(&mut self) {
        self.requested.get_or_insert_with(Instant::now);
    }

    fn time_sync_complete(&mut self) -> bool {
        self.requested
            .is_some_and(|at| at.elapsed() >= self.answer_after)
    }

    fn stop_time_sync(&mut self) {
        self.requested = None;
    }

    fn unix_time(&mut self) -> i64 {
        unix_now() as i64
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
