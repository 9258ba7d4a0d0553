//! Buzzer abstraction
//!
//! The buzzer is a passive piezo driven by a PWM channel. Duty/frequency
//! register programming belongs to the driver; the firmware only asks for
//! tones.

/// PWM duty resolution of the buzzer channel (13 bit).
pub const DUTY_MAX: u32 = (1 << 13) - 1;

/// A tone: PWM frequency plus duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tone {
    /// Frequency in Hz
    pub frequency_hz: u32,
    /// Duty in `0..=DUTY_MAX`
    pub duty: u32,
}

impl Tone {
    /// Tone with an explicit duty, clamped to [`DUTY_MAX`].
    pub const fn new(frequency_hz: u32, duty: u32) -> Self {
        Self {
            frequency_hz,
            duty: if duty > DUTY_MAX { DUTY_MAX } else { duty },
        }
    }
}

/// Passive buzzer driver
pub trait Buzzer {
    /// Error type
    type Error: core::fmt::Debug;

    /// Start (or retune) a tone.
    fn play(&mut self, tone: Tone) -> Result<(), Self::Error>;

    /// Silence the output.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_is_clamped_to_resolution() {
        assert_eq!(Tone::new(440, 100_000).duty, DUTY_MAX);
        assert_eq!(Tone::new(440, 4094).duty, 4094);
    }
}
