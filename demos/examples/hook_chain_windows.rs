// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlapping windows and a slider driven by one hook chain.
//!
//! This example shows how to combine:
//! - `understory_hooks` for ordered, consumable event handling,
//! - `understory_geometry` for the math inside hook actions.
//!
//! Each window registers a consuming hook for pointer presses inside its
//! bounds. The chain head plays the role of the topmost window: a pressed
//! window prepends itself, so the next press in an overlapping area goes to
//! it. A slider projects pointer drags onto its track, a keyboard hook takes
//! key events, and a catch-all at the tail reports presses nobody claimed.
//!
//! The chain does not own any of these hooks. Closing a window is just
//! dropping its handle.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p understory_demos --example hook_chain_windows`

use std::cell::Cell;
use std::rc::{Rc, Weak};

use kurbo::{Point, Rect, Vec2};
use tracing_subscriber::EnvFilter;
use understory_geometry::{PointExt, Vector2Ext};
use understory_hooks::{FnHook, Hook, HookChain, HookError, HookRef};

/// Input events understood by the demo.
#[derive(Clone, Copy, Debug)]
enum Event {
    PointerDown(Point),
    PointerMove(Point),
    Key(char),
}

/// A window that raises itself to the head of the chain when pressed.
struct Window {
    name: &'static str,
    bounds: Rect,
    me: Weak<Window>,
    chain: Weak<HookChain<Event, HookError>>,
}

impl Hook<Event, HookError> for Window {
    fn matches(&self, event: &Event) -> bool {
        matches!(event, Event::PointerDown(pt) if self.bounds.contains(*pt))
    }

    fn perform(&self, event: &Event) -> Result<(), HookError> {
        println!("  {} pressed at {:?}", self.name, event);
        if let Some(chain) = self.chain.upgrade() {
            chain.prepend_weak(&self.me)?;
        }
        Ok(())
    }

    fn consumes(&self) -> bool {
        true
    }
}

/// Horizontal-ish slider track from `origin` along `track`.
struct Slider {
    origin: Point,
    track: Vec2,
    value: Cell<f64>,
}

impl Slider {
    fn drag_to(&self, pt: Point) {
        let rel = (pt - self.origin).to_point();
        let Some(foot) = rel.projected_onto(self.track) else {
            return;
        };
        let along = foot.to_vec2().modulus() / self.track.modulus();
        let forward = foot.to_vec2().dot(self.track) >= 0.0;
        let value = if forward { along.min(1.0) } else { 0.0 };
        self.value.set(value);
        println!(
            "  slider -> {:.2} (track heading {:.1} deg)",
            value,
            self.track.angle_deg()
        );
    }
}

fn window(
    chain: &Rc<HookChain<Event, HookError>>,
    name: &'static str,
    bounds: Rect,
) -> HookRef<Event, HookError> {
    let w = Rc::new_cyclic(|me| Window {
        name,
        bounds,
        me: me.clone(),
        chain: Rc::downgrade(chain),
    });
    chain.append(w)
}

fn main() -> Result<(), HookError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let chain: Rc<HookChain<Event, HookError>> = Rc::new(HookChain::new());

    // Back-to-front creation order; append keeps the first window on top.
    let editor = window(&chain, "editor", Rect::new(0.0, 0.0, 120.0, 80.0));
    let palette = window(&chain, "palette", Rect::new(60.0, 40.0, 180.0, 140.0));

    let slider = Rc::new(Slider {
        origin: Point::new(20.0, 200.0),
        track: Vec2::new(160.0, 0.0),
        value: Cell::new(0.0),
    });
    let _drag = {
        let slider = slider.clone();
        chain.append(Rc::new(FnHook::new(
            |ev: &Event| matches!(ev, Event::PointerMove(_)),
            move |ev: &Event| {
                if let Event::PointerMove(pt) = ev {
                    slider.drag_to(*pt);
                }
                Ok::<(), HookError>(())
            },
            false,
        )))
    };

    let _keys = chain.append(Rc::new(FnHook::new(
        |ev: &Event| matches!(ev, Event::Key(_)),
        |ev: &Event| {
            if let Event::Key(c) = ev {
                println!("  key {c:?}");
            }
            Ok::<(), HookError>(())
        },
        true,
    )));

    // Catch-all at the tail: only sees what nobody consumed.
    let _unhandled = chain.append(Rc::new(FnHook::new(
        |_: &Event| true,
        |ev: &Event| {
            println!("  unhandled {ev:?}");
            Ok::<(), HookError>(())
        },
        false,
    )));

    let overlap = Point::new(90.0, 60.0);
    let script = [
        ("press overlap", Event::PointerDown(overlap)),
        ("press palette only", Event::PointerDown(Point::new(150.0, 120.0))),
        ("press overlap again", Event::PointerDown(overlap)),
        ("drag slider", Event::PointerMove(Point::new(100.0, 230.0))),
        ("drag past end", Event::PointerMove(Point::new(400.0, 190.0))),
        ("type", Event::Key('q')),
        ("press desktop", Event::PointerDown(Point::new(300.0, 300.0))),
    ];

    for (label, event) in script {
        println!("\n== {label} ==");
        chain.handle(&event)?;
    }

    println!("\n== close palette, press overlap ==");
    drop(palette);
    chain.handle(&Event::PointerDown(overlap))?;

    println!(
        "\nfinal slider value {:.2}; {} hooks registered, editor at {:?}",
        slider.value.get(),
        chain.len(),
        chain.position(&editor)
    );
    Ok(())
}
