//! Multi-digit seven-segment display (TM1637 style)

/// Number of digits on the attached module.
pub const DIGIT_COUNT: usize = 4;

/// Seven-segment display driver.
///
/// Digits are decimal values `0..=9`; glyph encoding is the driver's job.
pub trait SegmentDisplay {
    /// Error type
    type Error: core::fmt::Debug;

    /// Show `digits` left to right, with the centre colon on or off.
    fn show(&mut self, digits: &[u8; DIGIT_COUNT], colon: bool) -> Result<(), Self::Error>;

    /// Set brightness, `0..=7`.
    fn set_brightness(&mut self, level: u8) -> Result<(), Self::Error>;
}
