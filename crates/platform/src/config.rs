//! Application configuration and board assignment table
//!
//! Central naming constants plus the physical pin/bus assignment of the
//! handheld. Every pin number in the firmware should come from here rather
//! than being hardcoded at the call site.

use crate::gpio::{GpioNum, ModeSet, PinMode};

/// The application name
pub const APP_NAME: &str = "Stick Firmware";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Development mode banner
pub const fn dev_banner() -> &'static str {
    "Stick Firmware - Simulator"
}

// ── Fixed on-board peripherals ───────────────────────────────────────────────

/// Front button A (active-low). Long-press triggers the buzzer.
pub const BUTTON_A_PIN: GpioNum = GpioNum::new(37);
/// Side button B (active-low).
pub const BUTTON_B_PIN: GpioNum = GpioNum::new(39);
/// Red status LED (active-low).
pub const STATUS_LED_PIN: GpioNum = GpioNum::new(10);
/// Passive buzzer, driven by PWM.
pub const BUZZER_PIN: GpioNum = GpioNum::new(2);

/// External button on the hat connector.
pub const EXT_BUTTON_PIN: GpioNum = GpioNum::new(36);
/// Hat pin shorted to [`EXT_BUTTON_PIN`] on the Plus board; must be an input too.
pub const EXT_BUTTON_SHARED_PIN: GpioNum = GpioNum::new(25);
/// External LED on the hat connector.
pub const EXT_LED_PIN: GpioNum = GpioNum::new(26);

/// 7-bit address of the SHT3x temperature/humidity sensor on Port A.
pub const SHT3X_ADDRESS: u8 = 0x44;
/// 7-bit address of the PCF8563 real-time clock on the internal bus.
pub const PCF8563_ADDRESS: u8 = 0x51;

// ── Connector table ──────────────────────────────────────────────────────────

/// Physical connector a pin belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Connector {
    /// Grove Port A (I2C capable).
    PortA,
    /// 8-pin hat header on top of the device.
    Hat,
}

/// One pin exposed on an expansion connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortPin {
    /// MCU GPIO number.
    pub gpio: GpioNum,
    /// Connector the pin is routed to.
    pub connector: Connector,
    /// Modes the pad can physically take.
    pub modes: ModeSet,
}

/// Bus wiring and clock limits for one connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusAssignment {
    /// Data line.
    pub sda: GpioNum,
    /// Clock line.
    pub scl: GpioNum,
    /// Clock used when the caller does not ask for anything specific.
    pub standard_hz: u32,
    /// Highest clock any caller may select.
    pub ceiling_hz: u32,
}

impl BusAssignment {
    /// Clamp a requested bus clock to this bus's ceiling.
    ///
    /// A request of `0` selects [`Self::standard_hz`].
    pub const fn clamp(&self, requested_hz: u32) -> u32 {
        if requested_hz == 0 {
            self.standard_hz
        } else if requested_hz > self.ceiling_hz {
            self.ceiling_hz
        } else {
            requested_hz
        }
    }
}

/// Pin/bus assignment table for the whole board.
#[derive(Debug, Clone, Copy)]
pub struct PortMap {
    /// Every connector pin that may be reconfigured at runtime.
    pub pins: &'static [PortPin],
    /// Port A I2C bus.
    pub port_a_bus: BusAssignment,
    /// Internal I2C bus (RTC, IMU, PMU).
    pub internal_bus: BusAssignment,
}

const STICK_PINS: &[PortPin] = &[
    PortPin {
        gpio: GpioNum::new(32),
        connector: Connector::PortA,
        modes: ModeSet::of(&[PinMode::I2c, PinMode::Input, PinMode::Output, PinMode::Adc]),
    },
    PortPin {
        gpio: GpioNum::new(33),
        connector: Connector::PortA,
        modes: ModeSet::of(&[PinMode::I2c, PinMode::Input, PinMode::Output, PinMode::Adc]),
    },
    PortPin {
        gpio: GpioNum::new(0),
        connector: Connector::Hat,
        modes: ModeSet::of(&[PinMode::Input, PinMode::Output]),
    },
    PortPin {
        gpio: GpioNum::new(25),
        connector: Connector::Hat,
        modes: ModeSet::of(&[PinMode::Input, PinMode::Output, PinMode::Dac, PinMode::Adc]),
    },
    PortPin {
        gpio: GpioNum::new(26),
        connector: Connector::Hat,
        modes: ModeSet::of(&[PinMode::Input, PinMode::Output, PinMode::Dac, PinMode::Uart]),
    },
    // Input-only pad.
    PortPin {
        gpio: GpioNum::new(36),
        connector: Connector::Hat,
        modes: ModeSet::of(&[PinMode::Input, PinMode::Adc, PinMode::Uart]),
    },
];

impl PortMap {
    /// M5StickC Plus assignment.
    pub const STICK_C_PLUS: Self = Self {
        pins: STICK_PINS,
        port_a_bus: BusAssignment {
            sda: GpioNum::new(32),
            scl: GpioNum::new(33),
            standard_hz: 100_000,
            ceiling_hz: 400_000,
        },
        internal_bus: BusAssignment {
            sda: GpioNum::new(21),
            scl: GpioNum::new(22),
            standard_hz: 100_000,
            ceiling_hz: 400_000,
        },
    };

    /// Look up a connector pin.
    pub fn find(&self, gpio: GpioNum) -> Option<&PortPin> {
        self.pins.iter().find(|p| p.gpio == gpio)
    }
}

impl Default for PortMap {
    fn default() -> Self {
        Self::STICK_C_PLUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_caps_at_ceiling() {
        let bus = PortMap::STICK_C_PLUS.port_a_bus;
        assert_eq!(bus.clamp(1_000_000), 400_000);
        assert_eq!(bus.clamp(400_000), 400_000);
        assert_eq!(bus.clamp(50_000), 50_000);
    }

    #[test]
    fn clamp_zero_selects_standard_rate() {
        let bus = PortMap::STICK_C_PLUS.internal_bus;
        assert_eq!(bus.clamp(0), 100_000);
    }

    #[test]
    fn gpio36_is_input_only() {
        let pin = PortMap::STICK_C_PLUS.find(GpioNum::new(36)).copied();
        let pin = pin.unwrap();
        assert!(pin.modes.contains(PinMode::Input));
        assert!(!pin.modes.contains(PinMode::Output));
    }

    #[test]
    fn builtin_pins_are_not_connector_pins() {
        assert!(PortMap::STICK_C_PLUS.find(BUTTON_A_PIN).is_none());
        assert!(PortMap::STICK_C_PLUS.find(STATUS_LED_PIN).is_none());
    }
}
