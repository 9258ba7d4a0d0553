//! Button identities and edge events

/// Physical buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Front button (M5 logo)
    A,
    /// Side button
    B,
    /// Button wired to the hat connector
    External,
}

impl Button {
    /// Name used in log records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::External => "EXT1",
        }
    }
}

/// Edge-triggered button events.
///
/// Each fires once per transition; holding a button produces one
/// `Pressed`, at most one `LongPress` and one `Released`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Button went down
    Pressed,
    /// Button went up
    Released,
    /// Button has been held continuously for the long-press threshold
    LongPress,
}
