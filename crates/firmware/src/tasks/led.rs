//! LED blink task.

use embassy_time::Duration;
use embedded_hal::digital::OutputPin;

use super::PeripheralTask;
use crate::log;

/// Toggles one LED every period.
pub struct LedTask<P> {
    name: &'static str,
    pin: P,
    active_low: bool,
    lit: bool,
    period: Duration,
}

impl<P: OutputPin> LedTask<P> {
    /// Blink `pin` with `period` on and `period` off.
    pub fn new(name: &'static str, pin: P, active_low: bool, period: Duration) -> Self {
        Self {
            name,
            pin,
            active_low,
            lit: false,
            period,
        }
    }

    /// Whether the LED was last driven on.
    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl<P: OutputPin> PeripheralTask for LedTask<P> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn step(&mut self) -> Duration {
        let lit = !self.lit;
        let high = lit != self.active_low;
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.lit = lit,
            Err(_) => log::warn!("{}: pin write failed", self.name),
        }
        self.period
    }
}
