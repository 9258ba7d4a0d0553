//! Property tests for button edge detection
//!
//! Run with: cargo test -p firmware --test long_press_proptest

#![allow(clippy::arithmetic_side_effects)]

use embassy_time::{Duration, Instant};
use firmware::tasks::ButtonTracker;
use platform::ButtonEvent;
use proptest::prelude::*;

const TICK_MS: u64 = 80;
const THRESHOLD_MS: u64 = 1000;

/// Events for `held` consecutive pressed samples followed by one release,
/// starting at `offset_ms`.
fn hold(held: u64, offset_ms: u64) -> Vec<(u64, ButtonEvent)> {
    let mut tracker = ButtonTracker::new(Duration::from_millis(THRESHOLD_MS));
    (0..=held)
        .filter_map(|tick| {
            let now = Instant::from_millis(offset_ms + tick * TICK_MS);
            tracker.update(tick < held, now).map(|e| (tick, e))
        })
        .collect()
}

proptest! {
    /// Exactly one Pressed and one Released per hold; LongPress fires once
    /// if and only if the last pressed sample is at least the threshold
    /// after the first.
    #[test]
    fn long_press_fires_once_iff_hold_reaches_threshold(held in 1u64..200, offset in 0u64..1_000_000) {
        let events = hold(held, offset);
        let count = |kind| events.iter().filter(|(_, e)| *e == kind).count();

        prop_assert_eq!(count(ButtonEvent::Pressed), 1);
        prop_assert_eq!(count(ButtonEvent::Released), 1);

        let reached = (held - 1) * TICK_MS >= THRESHOLD_MS;
        prop_assert_eq!(count(ButtonEvent::LongPress), usize::from(reached));
    }

    /// LongPress lands on the first tick whose hold reaches the threshold.
    #[test]
    fn long_press_tick_is_first_at_threshold(held in 14u64..200) {
        let events = hold(held, 0);
        let tick = events
            .iter()
            .find(|(_, e)| *e == ButtonEvent::LongPress)
            .map(|(t, _)| *t);
        prop_assert_eq!(tick, Some(THRESHOLD_MS.div_ceil(TICK_MS)));
    }
}

/// The two device scenarios, spelled out.
#[test]
fn test_reference_scenarios() {
    assert_eq!(
        hold(3, 0),
        [(0, ButtonEvent::Pressed), (3, ButtonEvent::Released)]
    );
    assert_eq!(
        hold(14, 0),
        [
            (0, ButtonEvent::Pressed),
            (13, ButtonEvent::LongPress),
            (14, ButtonEvent::Released),
        ]
    );
}
