//! GPIO and pin abstraction layer
//!
//! Pin numbers and modes used by the expansion connectors, plus the
//! low-level [`GpioController`] collaborator that actually reprograms a pad.
//! Validation of pin/mode pairs is *not* done here; see
//! [`crate::config::PortMap`] and the firmware's port layer.

/// A physical GPIO number on the MCU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioNum(u8);

impl GpioNum {
    /// Wrap a raw GPIO number.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw GPIO number.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for GpioNum {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Function a connector pin can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Released back to its reset state.
    None,
    /// Push-pull digital output.
    Output,
    /// Digital input with pull-down.
    Input,
    /// I2C SDA/SCL line.
    I2c,
    /// Analog input.
    Adc,
    /// Analog output.
    Dac,
    /// UART RX/TX line.
    Uart,
}

impl PinMode {
    /// Bit used for this mode in a [`ModeSet`].
    const fn bit(self) -> u8 {
        match self {
            Self::None => 1 << 0,
            Self::Output => 1 << 1,
            Self::Input => 1 << 2,
            Self::I2c => 1 << 3,
            Self::Adc => 1 << 4,
            Self::Dac => 1 << 5,
            Self::Uart => 1 << 6,
        }
    }

    /// Short lowercase name for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Output => "output",
            Self::Input => "input",
            Self::I2c => "i2c",
            Self::Adc => "adc",
            Self::Dac => "dac",
            Self::Uart => "uart",
        }
    }
}

/// Compact set of [`PinMode`]s a pin is physically able to take.
///
/// `PinMode::None` is always a member: any pin can be released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeSet(u8);

impl ModeSet {
    /// Set containing only [`PinMode::None`].
    pub const EMPTY: Self = Self(PinMode::None.bit());

    /// Build a set from a list of modes.
    pub const fn of(modes: &[PinMode]) -> Self {
        let mut bits = PinMode::None.bit();
        let mut rest = modes;
        while let [first, tail @ ..] = rest {
            bits |= first.bit();
            rest = tail;
        }
        Self(bits)
    }

    /// Whether `mode` is in the set.
    pub const fn contains(self, mode: PinMode) -> bool {
        self.0 & mode.bit() != 0
    }
}

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// High (logic 1)
    High,
    /// Low (logic 0)
    Low,
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<PinState> for bool {
    fn from(value: PinState) -> Self {
        matches!(value, PinState::High)
    }
}

/// Low-level pad controller.
///
/// Applies a mode without any policy: the caller is responsible for
/// checking that the pin supports it and is not already bound elsewhere.
pub trait GpioController {
    /// Error type
    type Error: core::fmt::Debug;

    /// Reprogram `pin` into `mode`.
    fn apply(&mut self, pin: GpioNum, mode: PinMode) -> Result<(), Self::Error>;

    /// Read the current level of an input pin.
    fn level(&mut self, pin: GpioNum) -> Result<PinState, Self::Error>;

    /// Drive an output pin.
    fn set_level(&mut self, pin: GpioNum, state: PinState) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_set_always_allows_release() {
        assert!(ModeSet::EMPTY.contains(PinMode::None));
        assert!(!ModeSet::EMPTY.contains(PinMode::Output));
    }

    #[test]
    fn mode_set_of_lists_members() {
        let set = ModeSet::of(&[PinMode::Input, PinMode::Adc]);
        assert!(set.contains(PinMode::Input));
        assert!(set.contains(PinMode::Adc));
        assert!(!set.contains(PinMode::Output));
        assert!(!set.contains(PinMode::Uart));
    }

    #[test]
    fn pin_state_round_trips_through_bool() {
        assert_eq!(PinState::from(true), PinState::High);
        assert!(!bool::from(PinState::Low));
    }
}
