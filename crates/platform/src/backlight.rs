//! Screen backlight, powered by the PMU (AXP192 on the handheld)

/// Highest brightness the PMU accepts.
pub const BRIGHTNESS_MAX: u8 = 100;

/// Backlight power and brightness control.
pub trait Backlight {
    /// Error type
    type Error: core::fmt::Debug;

    /// Set brightness in `0..=BRIGHTNESS_MAX`; larger values are clamped
    /// by the driver.
    fn set_brightness(&mut self, level: u8) -> Result<(), Self::Error>;

    /// Switch the panel supply on or off.
    fn set_power(&mut self, on: bool) -> Result<(), Self::Error>;
}
