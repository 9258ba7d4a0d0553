//! Mock implementations for testing
//!
//! This module provides mock implementations of the platform traits
//! for use in unit and integration tests and in the desktop simulator.

#![cfg(any(test, feature = "std"))]
#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
#![allow(clippy::unwrap_used)] // poisoned test mutex is a test failure anyway

use std::collections::HashMap;
use std::string::{String, ToString};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use crate::audio::{Buzzer, Tone};
use crate::backlight::Backlight;
use crate::display::{Anchor, DisplayError, DisplaySurface, StyleClass, WidgetId};
use crate::gpio::{GpioController, GpioNum, PinMode, PinState};
use crate::imu::{Acceleration, Accelerometer};
use crate::network::Connectivity;
use crate::rgb::{Rgb, RgbLed};
use crate::segment::{SegmentDisplay, DIGIT_COUNT};

// ── Display ──────────────────────────────────────────────────────────────────

/// Kind of a mock widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    /// Text label
    Label,
    /// Line meter
    Meter,
}

/// State of one mock widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWidget {
    /// Label or meter
    pub kind: WidgetKind,
    /// Parent widget, if nested
    pub parent: Option<WidgetId>,
    /// Anchor given at creation
    pub anchor: Anchor,
    /// Current label text
    pub text: String,
    /// Current meter value
    pub value: i32,
    /// Meter range
    pub range: (i32, i32),
    /// Last style class applied
    pub style: Option<StyleClass>,
}

/// One recorded mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOp {
    /// `set_text`
    Text(WidgetId, String),
    /// `set_value`
    Value(WidgetId, i32),
    /// `set_style`
    Style(WidgetId, StyleClass),
}

/// Mock display: keeps the widget tree in memory and logs every mutation.
#[derive(Debug, Default)]
pub struct MockDisplay {
    widgets: Vec<MockWidget>,
    ops: Vec<DisplayOp>,
}

impl MockDisplay {
    /// Create an empty surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a widget
    pub fn widget(&self, id: WidgetId) -> Option<&MockWidget> {
        self.widgets.get(usize::from(id.get()))
    }

    /// Current text of a label (empty for unknown widgets)
    pub fn text(&self, id: WidgetId) -> &str {
        self.widget(id).map_or("", |w| w.text.as_str())
    }

    /// Current value of a meter
    pub fn value(&self, id: WidgetId) -> Option<i32> {
        self.widget(id).map(|w| w.value)
    }

    /// Current style of a meter
    pub fn style(&self, id: WidgetId) -> Option<StyleClass> {
        self.widget(id).and_then(|w| w.style)
    }

    /// Number of widgets created
    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    /// Every mutation since creation (or the last [`Self::clear_ops`])
    pub fn ops(&self) -> &[DisplayOp] {
        &self.ops
    }

    /// Forget recorded mutations
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    fn create(&mut self, widget: MockWidget) -> Result<WidgetId, DisplayError> {
        let id = u16::try_from(self.widgets.len()).map_err(|_| DisplayError::OutOfWidgets)?;
        self.widgets.push(widget);
        Ok(WidgetId::new(id))
    }

    fn get_mut(&mut self, id: WidgetId, kind: WidgetKind) -> Result<&mut MockWidget, DisplayError> {
        let widget = self
            .widgets
            .get_mut(usize::from(id.get()))
            .ok_or(DisplayError::UnknownWidget)?;
        if widget.kind == kind {
            Ok(widget)
        } else {
            Err(DisplayError::WrongKind)
        }
    }
}

impl DisplaySurface for MockDisplay {
    type Error = DisplayError;

    fn create_label(
        &mut self,
        parent: Option<WidgetId>,
        anchor: Anchor,
        text: &str,
    ) -> Result<WidgetId, Self::Error> {
        self.create(MockWidget {
            kind: WidgetKind::Label,
            parent,
            anchor,
            text: text.to_string(),
            value: 0,
            range: (0, 0),
            style: None,
        })
    }

    fn create_meter(&mut self, anchor: Anchor, min: i32, max: i32) -> Result<WidgetId, Self::Error> {
        self.create(MockWidget {
            kind: WidgetKind::Meter,
            parent: None,
            anchor,
            text: String::new(),
            value: min,
            range: (min, max),
            style: None,
        })
    }

    fn set_text(&mut self, widget: WidgetId, text: &str) -> Result<(), Self::Error> {
        self.get_mut(widget, WidgetKind::Label)?.text = text.to_string();
        self.ops.push(DisplayOp::Text(widget, text.to_string()));
        Ok(())
    }

    fn set_value(&mut self, widget: WidgetId, value: i32) -> Result<(), Self::Error> {
        self.get_mut(widget, WidgetKind::Meter)?.value = value;
        self.ops.push(DisplayOp::Value(widget, value));
        Ok(())
    }

    fn set_style(&mut self, widget: WidgetId, style: StyleClass) -> Result<(), Self::Error> {
        self.get_mut(widget, WidgetKind::Meter)?.style = Some(style);
        self.ops.push(DisplayOp::Style(widget, style));
        Ok(())
    }
}

// ── Buzzer ───────────────────────────────────────────────────────────────────

/// One buzzer call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerOp {
    /// `play`
    Play(Tone),
    /// `stop`
    Stop,
}

/// Mock buzzer. Clones share the same call log so a test can keep a handle
/// while the task owns the driver.
#[derive(Debug, Clone, Default)]
pub struct MockBuzzer {
    log: Arc<Mutex<Vec<BuzzerOp>>>,
}

impl MockBuzzer {
    /// Create a buzzer with an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every call so far
    pub fn ops(&self) -> Vec<BuzzerOp> {
        self.log.lock().unwrap().clone()
    }

    /// Number of `play` calls so far
    pub fn play_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, BuzzerOp::Play(_)))
            .count()
    }
}

impl Buzzer for MockBuzzer {
    type Error = core::convert::Infallible;

    fn play(&mut self, tone: Tone) -> Result<(), Self::Error> {
        self.log.lock().unwrap().push(BuzzerOp::Play(tone));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.log.lock().unwrap().push(BuzzerOp::Stop);
        Ok(())
    }
}

// ── GPIO ─────────────────────────────────────────────────────────────────────

/// Error returned by [`MockGpio`] for pins marked faulty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockGpioFault(pub GpioNum);

/// Mock pad controller
#[derive(Debug, Default)]
pub struct MockGpio {
    modes: HashMap<GpioNum, PinMode>,
    levels: HashMap<GpioNum, PinState>,
    applies: usize,
    faulty: Option<GpioNum>,
}

impl MockGpio {
    /// Create a controller with every pad in reset state
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call touching `pin` fail
    pub fn fail_on(&mut self, pin: GpioNum) {
        self.faulty = Some(pin);
    }

    /// Preset the level an input will read
    pub fn set_input(&mut self, pin: GpioNum, state: PinState) {
        self.levels.insert(pin, state);
    }

    /// Mode last applied to `pin`
    pub fn mode(&self, pin: GpioNum) -> Option<PinMode> {
        self.modes.get(&pin).copied()
    }

    /// Level last driven on / preset for `pin`
    pub fn output(&self, pin: GpioNum) -> Option<PinState> {
        self.levels.get(&pin).copied()
    }

    /// Number of `apply` calls that reached the hardware
    pub fn apply_count(&self) -> usize {
        self.applies
    }

    fn check(&self, pin: GpioNum) -> Result<(), MockGpioFault> {
        if self.faulty == Some(pin) {
            Err(MockGpioFault(pin))
        } else {
            Ok(())
        }
    }
}

impl GpioController for MockGpio {
    type Error = MockGpioFault;

    fn apply(&mut self, pin: GpioNum, mode: PinMode) -> Result<(), Self::Error> {
        self.check(pin)?;
        self.applies += 1;
        self.modes.insert(pin, mode);
        Ok(())
    }

    fn level(&mut self, pin: GpioNum) -> Result<PinState, Self::Error> {
        self.check(pin)?;
        Ok(self.levels.get(&pin).copied().unwrap_or(PinState::Low))
    }

    fn set_level(&mut self, pin: GpioNum, state: PinState) -> Result<(), Self::Error> {
        self.check(pin)?;
        self.levels.insert(pin, state);
        Ok(())
    }
}

// ── Segment display ──────────────────────────────────────────────────────────

/// Mock seven-segment display
#[derive(Debug, Clone, Default)]
pub struct MockSegments {
    shown: Arc<Mutex<Vec<([u8; DIGIT_COUNT], bool)>>>,
    brightness: Arc<Mutex<Option<u8>>>,
}

impl MockSegments {
    /// Create a blank display
    pub fn new() -> Self {
        Self::default()
    }

    /// Every frame shown so far
    pub fn frames(&self) -> Vec<([u8; DIGIT_COUNT], bool)> {
        self.shown.lock().unwrap().clone()
    }

    /// Brightness last set, if any
    pub fn brightness(&self) -> Option<u8> {
        *self.brightness.lock().unwrap()
    }
}

impl SegmentDisplay for MockSegments {
    type Error = core::convert::Infallible;

    fn show(&mut self, digits: &[u8; DIGIT_COUNT], colon: bool) -> Result<(), Self::Error> {
        self.shown.lock().unwrap().push((*digits, colon));
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), Self::Error> {
        *self.brightness.lock().unwrap() = Some(level);
        Ok(())
    }
}

// ── IMU ──────────────────────────────────────────────────────────────────────

/// Mock accelerometer returning a fixed sample
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAccelerometer {
    /// Value returned by every read
    pub sample: Acceleration,
}

impl Accelerometer for MockAccelerometer {
    type Error = core::convert::Infallible;

    fn acceleration(&mut self) -> Result<Acceleration, Self::Error> {
        Ok(self.sample)
    }
}

// ── RGB LED ──────────────────────────────────────────────────────────────────

/// Mock RGB LED recording every colour latched
#[derive(Debug, Clone, Default)]
pub struct MockRgbLed {
    colors: Arc<Mutex<Vec<Rgb>>>,
}

impl MockRgbLed {
    /// Create a dark LED
    pub fn new() -> Self {
        Self::default()
    }

    /// Every colour set so far
    pub fn colors(&self) -> Vec<Rgb> {
        self.colors.lock().unwrap().clone()
    }
}

impl RgbLed for MockRgbLed {
    type Error = core::convert::Infallible;

    fn set_color(&mut self, color: Rgb) -> Result<(), Self::Error> {
        self.colors.lock().unwrap().push(color);
        Ok(())
    }
}

// ── Backlight ────────────────────────────────────────────────────────────────

/// One backlight call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklightOp {
    /// `set_brightness`
    Brightness(u8),
    /// `set_power`
    Power(bool),
}

/// Mock backlight. Clones share the call log.
#[derive(Debug, Clone, Default)]
pub struct MockBacklight {
    log: Arc<Mutex<Vec<BacklightOp>>>,
}

impl MockBacklight {
    /// Create a backlight with an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far
    pub fn ops(&self) -> Vec<BacklightOp> {
        self.log.lock().unwrap().clone()
    }
}

impl Backlight for MockBacklight {
    type Error = core::convert::Infallible;

    fn set_brightness(&mut self, level: u8) -> Result<(), Self::Error> {
        self.log.lock().unwrap().push(BacklightOp::Brightness(level));
        Ok(())
    }

    fn set_power(&mut self, on: bool) -> Result<(), Self::Error> {
        self.log.lock().unwrap().push(BacklightOp::Power(on));
        Ok(())
    }
}

// ── Connectivity ─────────────────────────────────────────────────────────────

/// Scripted connectivity collaborator.
#[derive(Debug, Clone, Default)]
pub struct MockConnectivity {
    /// Reported link state
    pub connected: bool,
    /// Completion polls needed after a request; `None` never completes
    pub completes_after: Option<u32>,
    /// Value returned by [`Connectivity::unix_time`]
    pub unix_time: i64,
    /// Number of `request_time_sync` calls
    pub requests: u32,
    /// Number of `stop_time_sync` calls
    pub stops: u32,
    /// Completion polls since the last request
    pub polls: u32,
    pending: bool,
}

impl MockConnectivity {
    /// Disconnected link whose time requests complete on the first poll
    pub fn new(unix_time: i64) -> Self {
        Self {
            completes_after: Some(1),
            unix_time,
            ..Self::default()
        }
    }
}

impl Connectivity for MockConnectivity {
    fn is_connected(&mut self) -> bool {
        self.connected
    }

    fn request_time_sync(&mut self) {
        self.requests += 1;
        if !self.pending {
            self.pending = true;
            self.polls = 0;
        }
    }

    fn time_sync_complete(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.polls += 1;
        self.completes_after.is_some_and(|n| self.polls >= n)
    }

    fn stop_time_sync(&mut self) {
        self.stops += 1;
        self.pending = false;
        self.polls = 0;
    }

    fn unix_time(&mut self) -> i64 {
        self.unix_time
    }
}
