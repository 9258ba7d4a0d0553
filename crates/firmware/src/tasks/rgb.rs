//! Colour cycle on the hat RGB LED.

use embassy_time::Duration;
use platform::{Rgb, RgbLed};

use super::PeripheralTask;
use crate::log;

/// Colours shown in order, then from the start again.
pub const PALETTE: [Rgb; 7] = [
    Rgb::BLUE,
    Rgb::LIME,
    Rgb::AQUA,
    Rgb::RED,
    Rgb::MAGENTA,
    Rgb::YELLOW,
    Rgb::WHITE,
];

/// On/off blinks per colour before moving on.
pub const BLINKS_PER_COLOR: u8 = 5;

/// Blinks each [`PALETTE`] colour [`BLINKS_PER_COLOR`] times.
pub struct RgbBlinkTask<L> {
    led: L,
    period: Duration,
    color: usize,
    blink: u8,
    lit: bool,
}

impl<L: RgbLed> RgbBlinkTask<L> {
    /// Cycle `led`, holding each on and off phase for `period`.
    pub fn new(led: L, period: Duration) -> Self {
        Self {
            led,
            period,
            color: 0,
            blink: 0,
            lit: false,
        }
    }

    /// Colour of the current blink.
    pub fn current(&self) -> Rgb {
        PALETTE.get(self.color).copied().unwrap_or(Rgb::OFF)
    }

    fn advance(&mut self) {
        self.blink = self.blink.saturating_add(1);
        if self.blink < BLINKS_PER_COLOR {
            return;
        }
        self.blink = 0;
        let next = self.color.saturating_add(1);
        self.color = if next < PALETTE.len() { next } else { 0 };
    }
}

impl<L: RgbLed> PeripheralTask for RgbBlinkTask<L> {
    fn name(&self) -> &'static str {
        "rgb_led"
    }

    async fn step(&mut self) -> Duration {
        let color = if self.lit { Rgb::OFF } else { self.current() };
        match self.led.set_color(color) {
            Ok(()) => {
                if self.lit {
                    self.advance();
                } else if self.blink == 0 {
                    log::debug!("rgb_led: {}", color);
                }
                self.lit = !self.lit;
            }
            Err(_) => log::warn!("rgb_led: write failed"),
        }
        self.period
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use platform::mocks::MockRgbLed;

    #[tokio::test]
    async fn each_colour_blinks_five_times_then_advances() {
        let led = MockRgbLed::new();
        let mut task = RgbBlinkTask::new(led.clone(), Duration::from_millis(1000));

        for _ in 0..(2 * BLINKS_PER_COLOR + 1) {
            assert_eq!(task.step().await, Duration::from_millis(1000));
        }

        let colors = led.colors();
        let blue_then_off = [Rgb::BLUE, Rgb::OFF].repeat(usize::from(BLINKS_PER_COLOR));
        assert_eq!(colors[..blue_then_off.len()], blue_then_off[..]);
        assert_eq!(colors.last(), Some(&Rgb::LIME));
    }

    #[tokio::test]
    async fn palette_wraps_after_white() {
        let led = MockRgbLed::new();
        let mut task = RgbBlinkTask::new(led.clone(), Duration::from_millis(1));
        let full_cycle = PALETTE.len() * usize::from(BLINKS_PER_COLOR) * 2;

        for _ in 0..=full_cycle {
            task.step().await;
        }

        let colors = led.colors();
        assert_eq!(colors[full_cycle - 2], Rgb::WHITE);
        assert_eq!(colors[full_cycle], Rgb::BLUE);
        assert_eq!(colors.iter().filter(|c| c.is_lit()).count(), PALETTE.len() * 5 + 1);
    }
}
