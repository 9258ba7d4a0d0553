//! Display gate integration tests
//!
//! Several OS threads publish multi-step widget updates through one
//! [`DisplayGate`]; the surface must only ever see whole batches.
//!
//! Run with: cargo test -p firmware --test integration_display

#![allow(clippy::arithmetic_side_effects)]

use firmware::DisplayGate;
use platform::mocks::{DisplayOp, MockDisplay};
use platform::{Anchor, DisplaySurface, WidgetId};

const THREADS: usize = 4;
const UPDATES: i32 = 50;

// ─── Mutual exclusion ────────────────────────────────────────────────────────

/// Each thread owns a label/meter pair and always writes both in one gate
/// hold. The resulting op log must consist of adjacent (Text, Value) pairs
/// on the same thread's widgets.
#[test]
fn test_concurrent_publishers_never_interleave() {
    let mut display = MockDisplay::new();
    let widgets: Vec<(WidgetId, WidgetId)> = (0..THREADS)
        .map(|_| {
            let label = display.create_label(None, Anchor::TopLeft, "").unwrap();
            let meter = display.create_meter(Anchor::Center(0), 0, 1000).unwrap();
            (label, meter)
        })
        .collect();
    let gate = DisplayGate::new(display);

    std::thread::scope(|scope| {
        for &(label, meter) in &widgets {
            let gate = &gate;
            scope.spawn(move || {
                embassy_futures::block_on(async {
                    for i in 0..UPDATES {
                        gate.publish(|d| {
                            d.set_text(label, &i.to_string()).unwrap();
                            std::thread::yield_now();
                            d.set_value(meter, i).unwrap();
                        })
                        .await;
                    }
                });
            });
        }
    });

    let display = gate.into_inner();
    let ops = display.ops();
    assert_eq!(ops.len(), THREADS * UPDATES as usize * 2);

    for pair in ops.chunks(2) {
        let (DisplayOp::Text(label, text), DisplayOp::Value(meter, value)) = (&pair[0], &pair[1])
        else {
            panic!("batch split: {pair:?}");
        };
        assert!(
            widgets.contains(&(*label, *meter)),
            "text and value from different publishers: {pair:?}"
        );
        assert_eq!(text, &value.to_string());
    }

    for &(label, meter) in &widgets {
        assert_eq!(display.text(label), (UPDATES - 1).to_string());
        assert_eq!(display.value(meter), Some(UPDATES - 1));
    }
}

/// A held gate blocks `try_acquire` until the guard is released.
#[test]
fn test_gate_has_single_holder() {
    let gate = DisplayGate::new(MockDisplay::new());
    embassy_futures::block_on(async {
        let guard = gate.acquire().await;
        assert!(gate.try_acquire().is_none());
        DisplayGate::release(guard);
        assert!(gate.try_acquire().is_some());
    });
}
