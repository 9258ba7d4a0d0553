//! Dashboard layout and gated publishing.
//!
//! The widgets are created once at boot; afterwards tasks only push new
//! values through a [`Publisher`], which brackets every update with the
//! display gate.

use core::fmt::Write as _;

use heapless::String;
use platform::{Anchor, DisplaySurface, StyleClass, WidgetId};

use crate::config::FeatureSet;
use crate::gate::DisplayGate;
use crate::log;

/// Glyph shown while the station has a link.
pub const WIFI_GLYPH: &str = "\u{f1eb}";
/// Glyph shown while a button is held.
pub const PRESSED_GLYPH: &str = "\u{f00c}";
/// Datetime shown until the first RTC read.
pub const INITIAL_DATETIME: &str = "2022/01/01 12:00:00";

/// Range and comfort band of one meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterRange {
    /// Lowest displayable value
    pub min: i32,
    /// Highest displayable value
    pub max: i32,
    /// Values below this are [`StyleClass::Low`]
    pub low: i32,
    /// Values above this are [`StyleClass::High`]
    pub high: i32,
}

impl MeterRange {
    /// Temperature meter, °C.
    pub const TEMPERATURE: Self = Self {
        min: -5,
        max: 45,
        low: 12,
        high: 30,
    };

    /// Relative humidity meter, %.
    pub const HUMIDITY: Self = Self {
        min: 20,
        max: 100,
        low: 40,
        high: 70,
    };

    /// Pin `value` to the displayable range.
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    /// Style for an already clamped value.
    pub fn classify(&self, value: i32) -> StyleClass {
        if value < self.low {
            StyleClass::Low
        } else if value > self.high {
            StyleClass::High
        } else {
            StyleClass::Normal
        }
    }
}

/// A meter plus the label printing its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meter {
    /// Needle widget
    pub meter: WidgetId,
    /// Numeric label inside the meter
    pub value: WidgetId,
    /// Range and thresholds
    pub range: MeterRange,
}

/// Widget handles of the dashboard. Widgets for disabled tasks are absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dashboard {
    /// Connectivity indicator (top right)
    pub wifi: Option<WidgetId>,
    /// Button indicator (left of the connectivity indicator)
    pub button: Option<WidgetId>,
    /// Temperature meter (left of centre)
    pub temperature: Option<Meter>,
    /// Humidity meter (right of centre)
    pub humidity: Option<Meter>,
    /// RTC readout (top left)
    pub datetime: Option<WidgetId>,
}

impl Dashboard {
    /// Create every widget the enabled tasks need.
    pub fn build<D: DisplaySurface>(surface: &mut D, features: &FeatureSet) -> Result<Self, D::Error> {
        let mut dashboard = Self::default();

        if features.time_sync_enabled() {
            dashboard.wifi = Some(surface.create_label(None, Anchor::TopRight(0), "")?);
        }
        if features.any_button() {
            dashboard.button = Some(surface.create_label(None, Anchor::TopRight(-16), "")?);
        }
        if features.sensor {
            dashboard.humidity = Some(build_meter(surface, MeterRange::HUMIDITY, 60, "%")?);
            dashboard.temperature =
                Some(build_meter(surface, MeterRange::TEMPERATURE, -60, "\u{b0}C")?);
        }
        if features.clock {
            dashboard.datetime = Some(surface.create_label(None, Anchor::TopLeft, INITIAL_DATETIME)?);
        }

        Ok(dashboard)
    }
}

fn build_meter<D: DisplaySurface>(
    surface: &mut D,
    range: MeterRange,
    x_offset: i16,
    unit: &str,
) -> Result<Meter, D::Error> {
    let meter = surface.create_meter(Anchor::Center(x_offset), range.min, range.max)?;
    surface.set_value(meter, range.min)?;
    let value = surface.create_label(Some(meter), Anchor::InParent(0), &format_int(range.min))?;
    surface.create_label(Some(meter), Anchor::InParent(32), unit)?;
    Ok(Meter {
        meter,
        value,
        range,
    })
}

fn format_int(value: i32) -> String<12> {
    let mut text = String::new();
    // 12 bytes always fit an i32.
    let _ = write!(text, "{value}");
    text
}

/// Handle a task uses to push values onto the dashboard.
pub struct Publisher<'a, D> {
    gate: &'a DisplayGate<D>,
    dashboard: Dashboard,
}

impl<D> Clone for Publisher<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Publisher<'_, D> {}

impl<'a, D: DisplaySurface> Publisher<'a, D> {
    /// Publisher for `dashboard` on the surface behind `gate`.
    pub fn new(gate: &'a DisplayGate<D>, dashboard: Dashboard) -> Self {
        Self { gate, dashboard }
    }

    /// Widget handles this publisher writes to.
    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Show or clear the connectivity glyph.
    pub async fn connectivity(&self, connected: bool) {
        let Some(label) = self.dashboard.wifi else {
            return;
        };
        let text = if connected { WIFI_GLYPH } else { "" };
        if self.gate.publish(|d| d.set_text(label, text)).await.is_err() {
            log::warn!("display: connectivity label update failed");
        }
    }

    /// Show or clear the button glyph.
    pub async fn button(&self, pressed: bool) {
        let Some(label) = self.dashboard.button else {
            return;
        };
        let text = if pressed { PRESSED_GLYPH } else { "" };
        if self.gate.publish(|d| d.set_text(label, text)).await.is_err() {
            log::warn!("display: button label update failed");
        }
    }

    /// Update the temperature meter, °C.
    pub async fn temperature(&self, celsius: i32) {
        if let Some(meter) = self.dashboard.temperature {
            self.meter(meter, celsius, "temperature").await;
        }
    }

    /// Update the humidity meter, %RH.
    pub async fn humidity(&self, percent: i32) {
        if let Some(meter) = self.dashboard.humidity {
            self.meter(meter, percent, "humidity").await;
        }
    }

    /// Replace the datetime readout.
    pub async fn datetime(&self, text: &str) {
        let Some(label) = self.dashboard.datetime else {
            return;
        };
        if self.gate.publish(|d| d.set_text(label, text)).await.is_err() {
            log::warn!("display: datetime label update failed");
        }
    }

    async fn meter(&self, meter: Meter, value: i32, what: &str) {
        let value = meter.range.clamp(value);
        let style = meter.range.classify(value);
        let text = format_int(value);

        let result = self
            .gate
            .publish(|d| {
                d.set_style(meter.meter, style)?;
                d.set_text(meter.value, &text)?;
                d.set_value(meter.meter, value)
            })
            .await;
        if result.is_err() {
            log::warn!("display: {} meter update failed", what);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::mocks::{DisplayOp, MockDisplay};

    fn dashboard(features: &FeatureSet) -> (DisplayGate<MockDisplay>, Dashboard) {
        let mut display = MockDisplay::new();
        let dashboard = Dashboard::build(&mut display, features).unwrap();
        (DisplayGate::new(display), dashboard)
    }

    #[test]
    fn thresholds_pick_style() {
        let t = MeterRange::TEMPERATURE;
        assert_eq!(t.classify(11), StyleClass::Low);
        assert_eq!(t.classify(12), StyleClass::Normal);
        assert_eq!(t.classify(30), StyleClass::Normal);
        assert_eq!(t.classify(31), StyleClass::High);
        assert_eq!(MeterRange::HUMIDITY.clamp(5), 20);
        assert_eq!(MeterRange::HUMIDITY.clamp(120), 100);
    }

    #[tokio::test]
    async fn build_creates_initial_widgets() {
        let (gate, dash) = dashboard(&FeatureSet::ALL);
        let display = gate.acquire().await;

        assert_eq!(display.text(dash.datetime.unwrap()), INITIAL_DATETIME);
        assert_eq!(display.text(dash.temperature.unwrap().value), "-5");
        assert_eq!(display.value(dash.humidity.unwrap().meter), Some(20));
        assert_eq!(display.text(dash.wifi.unwrap()), "");
    }

    #[test]
    fn disabled_tasks_get_no_widgets() {
        let mut features = FeatureSet::NONE;
        features.clock = true;
        let mut display = MockDisplay::new();
        let dash = Dashboard::build(&mut display, &features).unwrap();

        assert!(dash.datetime.is_some());
        assert!(dash.temperature.is_none() && dash.button.is_none() && dash.wifi.is_none());
        assert_eq!(display.widget_count(), 1);
    }

    #[tokio::test]
    async fn meter_update_clamps_and_styles() {
        let (gate, dash) = dashboard(&FeatureSet::ALL);
        gate.acquire().await.clear_ops();
        let publisher = Publisher::new(&gate, dash);

        publisher.temperature(60).await;

        let meter = dash.temperature.unwrap();
        let display = gate.acquire().await;
        assert_eq!(
            display.ops(),
            &[
                DisplayOp::Style(meter.meter, StyleClass::High),
                DisplayOp::Text(meter.value, "45".into()),
                DisplayOp::Value(meter.meter, 45),
            ]
        );
    }

    #[tokio::test]
    async fn button_indicator_toggles() {
        let (gate, dash) = dashboard(&FeatureSet::ALL);
        let publisher = Publisher::new(&gate, dash);

        publisher.button(true).await;
        assert_eq!(gate.acquire().await.text(dash.button.unwrap()), PRESSED_GLYPH);
        publisher.button(false).await;
        assert_eq!(gate.acquire().await.text(dash.button.unwrap()), "");
    }

    #[tokio::test]
    async fn absent_widgets_are_skipped() {
        let (gate, _) = dashboard(&FeatureSet::ALL);
        gate.acquire().await.clear_ops();
        let publisher = Publisher::new(&gate, Dashboard::default());

        publisher.datetime("x").await;
        publisher.humidity(50).await;

        assert!(gate.acquire().await.ops().is_empty());
    }
}
