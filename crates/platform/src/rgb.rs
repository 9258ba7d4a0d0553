//! Addressable RGB LED (SK6812 on the hat connector)

/// 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb {
    /// Colour from its three channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// All channels off
    pub const OFF: Self = Self::new(0, 0, 0);
    /// Pure blue
    pub const BLUE: Self = Self::new(0, 0, 0xFF);
    /// Pure green
    pub const LIME: Self = Self::new(0, 0xFF, 0);
    /// Green + blue
    pub const AQUA: Self = Self::new(0, 0xFF, 0xFF);
    /// Pure red
    pub const RED: Self = Self::new(0xFF, 0, 0);
    /// Red + blue
    pub const MAGENTA: Self = Self::new(0xFF, 0, 0xFF);
    /// Red + green
    pub const YELLOW: Self = Self::new(0xFF, 0xFF, 0);
    /// Every channel full
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);

    /// Whether any channel is lit.
    pub const fn is_lit(&self) -> bool {
        self.r != 0 || self.g != 0 || self.b != 0
    }
}

impl core::fmt::Display for Rgb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A strip of addressable LEDs driven as one colour.
pub trait RgbLed {
    /// Error type
    type Error: core::fmt::Debug;

    /// Set every pixel to `color` and latch it.
    fn set_color(&mut self, color: Rgb) -> Result<(), Self::Error>;
}
