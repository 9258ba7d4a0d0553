//! Backlight demo: steps through three brightness levels, then power-cycles
//! the panel.

use embassy_time::Duration;
use platform::Backlight;

use super::PeripheralTask;
use crate::log;

/// One backlight action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenStep {
    /// Set brightness (percent)
    Brightness(u8),
    /// Switch the panel supply
    Power(bool),
}

/// Actions applied in order, one per period, forever.
pub const SCREEN_STEPS: [ScreenStep; 5] = [
    ScreenStep::Brightness(0),
    ScreenStep::Brightness(70),
    ScreenStep::Brightness(100),
    ScreenStep::Power(false),
    ScreenStep::Power(true),
];

/// Runs [`SCREEN_STEPS`] on the backlight.
pub struct ScreenDemoTask<B> {
    backlight: B,
    period: Duration,
    next: usize,
}

impl<B: Backlight> ScreenDemoTask<B> {
    /// Demo on `backlight`, holding each step for `period`.
    pub fn new(backlight: B, period: Duration) -> Self {
        Self {
            backlight,
            period,
            next: 0,
        }
    }
}

impl<B: Backlight> PeripheralTask for ScreenDemoTask<B> {
    fn name(&self) -> &'static str {
        "screen"
    }

    async fn step(&mut self) -> Duration {
        let step = SCREEN_STEPS.get(self.next).copied().unwrap_or(ScreenStep::Power(true));
        let result = match step {
            ScreenStep::Brightness(level) => {
                log::info!("screen: brightness {}", level);
                self.backlight.set_brightness(level)
            }
            ScreenStep::Power(on) => {
                log::info!("screen: {}", if on { "on" } else { "off" });
                self.backlight.set_power(on)
            }
        };
        if result.is_err() {
            log::warn!("screen: backlight write failed");
        }

        let next = self.next.saturating_add(1);
        self.next = if next < SCREEN_STEPS.len() { next } else { 0 };
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::mocks::{BacklightOp, MockBacklight};

    #[tokio::test]
    async fn cycles_brightness_then_power() {
        let backlight = MockBacklight::new();
        let mut task = ScreenDemoTask::new(backlight.clone(), Duration::from_millis(2000));

        for _ in 0..6 {
            assert_eq!(task.step().await, Duration::from_millis(2000));
        }

        assert_eq!(
            backlight.ops(),
            [
                BacklightOp::Brightness(0),
                BacklightOp::Brightness(70),
                BacklightOp::Brightness(100),
                BacklightOp::Power(false),
                BacklightOp::Power(true),
                BacklightOp::Brightness(0),
            ]
        );
    }
}
