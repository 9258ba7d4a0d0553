//! Display abstraction layer
//!
//! The rendering collaborator is a retained-mode widget tree: widgets are
//! created once at boot and afterwards only their text, value or style class
//! change. None of these calls are thread-safe; the firmware serialises them
//! through its display gate.

/// Handle to a widget created on a [`DisplaySurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WidgetId(u16);

impl WidgetId {
    /// Wrap a raw handle. Only display implementations should call this.
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Raw handle.
    pub const fn get(self) -> u16 {
        self.0
    }
}

/// Where a widget is anchored on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Anchor {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner, shifted left by the given pixels.
    TopRight(i16),
    /// Screen centre, shifted horizontally by the given pixels.
    Center(i16),
    /// Centre of the parent widget, shifted down by the given pixels.
    InParent(i16),
}

/// Visual class applied to a meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StyleClass {
    /// Value below the comfortable band (drawn cyan).
    Low,
    /// Value inside the comfortable band (drawn green).
    Normal,
    /// Value above the comfortable band (drawn red).
    High,
}

/// Retained-mode rendering surface.
pub trait DisplaySurface {
    /// Error type for display operations
    type Error: core::fmt::Debug;

    /// Create a text label, optionally nested in `parent`.
    fn create_label(
        &mut self,
        parent: Option<WidgetId>,
        anchor: Anchor,
        text: &str,
    ) -> Result<WidgetId, Self::Error>;

    /// Create a line meter showing values in `min..=max`.
    fn create_meter(&mut self, anchor: Anchor, min: i32, max: i32)
        -> Result<WidgetId, Self::Error>;

    /// Replace a label's text.
    fn set_text(&mut self, widget: WidgetId, text: &str) -> Result<(), Self::Error>;

    /// Move a meter's needle.
    fn set_value(&mut self, widget: WidgetId, value: i32) -> Result<(), Self::Error>;

    /// Apply a style class to a meter.
    fn set_style(&mut self, widget: WidgetId, style: StyleClass) -> Result<(), Self::Error>;
}

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// No widget with that handle
    UnknownWidget,
    /// Widget exists but does not support the operation
    WrongKind,
    /// Widget pool exhausted
    OutOfWidgets,
    /// Text longer than the label buffer
    TextTooLong,
}

#[cfg(feature = "std")]
impl std::error::Error for DisplayError {}

impl core::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownWidget => write!(f, "Unknown widget handle"),
            Self::WrongKind => write!(f, "Operation not supported by widget"),
            Self::OutOfWidgets => write!(f, "Widget pool exhausted"),
            Self::TextTooLong => write!(f, "Label text too long"),
        }
    }
}
