//! Button sampling task.
//!
//! Buttons are polled at a fixed cadence; the cadence itself filters
//! contact bounce. [`ButtonTracker`] turns the level sequence into edge
//! events.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;
use heapless::Vec;
use platform::{Button, ButtonEvent, DisplaySurface};

use super::PeripheralTask;
use crate::log;
use crate::signal::ResumeSignal;
use crate::ui::Publisher;

/// Most buttons one task samples.
pub const MAX_BUTTONS: usize = 3;

/// Edge detector for one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonTracker {
    threshold: Duration,
    pressed_at: Option<Instant>,
    long_fired: bool,
}

impl ButtonTracker {
    /// Tracker reporting a long-press after `threshold` of continuous hold.
    pub const fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            pressed_at: None,
            long_fired: false,
        }
    }

    /// Whether the button is currently held.
    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    /// Feed one sample taken at `now`; returns the edge it produced.
    pub fn update(&mut self, pressed: bool, now: Instant) -> Option<ButtonEvent> {
        match (self.pressed_at, pressed) {
            (None, true) => {
                self.pressed_at = Some(now);
                self.long_fired = false;
                Some(ButtonEvent::Pressed)
            }
            (Some(_), false) => {
                self.pressed_at = None;
                Some(ButtonEvent::Released)
            }
            (Some(since), true) if !self.long_fired => {
                if now.saturating_duration_since(since) >= self.threshold {
                    self.long_fired = true;
                    Some(ButtonEvent::LongPress)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// One sampled button.
pub struct ButtonInput<P> {
    button: Button,
    pin: P,
    active_low: bool,
    tracker: ButtonTracker,
}

impl<P: InputPin> ButtonInput<P> {
    /// Button `button` wired to `pin`.
    pub fn new(button: Button, pin: P, active_low: bool, long_press: Duration) -> Self {
        Self {
            button,
            pin,
            active_low,
            tracker: ButtonTracker::new(long_press),
        }
    }

    fn sample(&mut self) -> Option<bool> {
        let result = if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        };
        match result {
            Ok(pressed) => Some(pressed),
            Err(_) => {
                log::warn!("button {}: read failed", self.button.as_str());
                None
            }
        }
    }
}

/// Samples a group of buttons and reports their edges.
pub struct ButtonTask<'a, P, D> {
    name: &'static str,
    period: Duration,
    inputs: Vec<ButtonInput<P>, MAX_BUTTONS>,
    trigger: Option<(Button, &'a ResumeSignal)>,
    publisher: Option<Publisher<'a, D>>,
}

impl<'a, P: InputPin, D: DisplaySurface> ButtonTask<'a, P, D> {
    /// Empty task; add buttons with [`Self::with_input`].
    pub fn new(name: &'static str, period: Duration, publisher: Option<Publisher<'a, D>>) -> Self {
        Self {
            name,
            period,
            inputs: Vec::new(),
            trigger: None,
            publisher,
        }
    }

    /// Add a button. Inputs beyond [`MAX_BUTTONS`] are ignored.
    pub fn with_input(mut self, input: ButtonInput<P>) -> Self {
        if self.inputs.push(input).is_err() {
            log::warn!("{}: button table full", self.name);
        }
        self
    }

    /// Wake `signal` whenever `button` is long-pressed.
    pub fn with_trigger(mut self, button: Button, signal: &'a ResumeSignal) -> Self {
        self.trigger = Some((button, signal));
        self
    }

    /// Sample every button once as of `now`.
    pub async fn poll(&mut self, now: Instant) {
        for index in 0..self.inputs.len() {
            let Some(input) = self.inputs.get_mut(index) else {
                continue;
            };
            let Some(pressed) = input.sample() else {
                continue;
            };
            let button = input.button;
            let event = input.tracker.update(pressed, now);
            if let Some(event) = event {
                self.report(button, event).await;
            }
        }
    }

    async fn report(&self, button: Button, event: ButtonEvent) {
        match event {
            ButtonEvent::Pressed => log::info!("button {} pressed", button.as_str()),
            ButtonEvent::Released => log::info!("button {} released", button.as_str()),
            ButtonEvent::LongPress => log::info!("button {} long-press", button.as_str()),
        }

        if let Some(publisher) = &self.publisher {
            publisher.button(event == ButtonEvent::Pressed).await;
        }

        if event == ButtonEvent::LongPress {
            if let Some((trigger, signal)) = self.trigger {
                if trigger == button && !signal.resume() {
                    log::debug!("buzzer busy, resume dropped");
                }
            }
        }
    }
}

impl<P: InputPin, D: DisplaySurface> PeripheralTask for ButtonTask<'_, P, D> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn step(&mut self) -> Duration {
        self.poll(Instant::now()).await;
        self.period
    }
}
