// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The hook contract and a closure-backed implementation.
//!
//! A hook is three things: a predicate that decides whether an event is
//! interesting, an action that runs when it is, and a flag that says whether
//! the event stops there. [`HookChain`](crate::HookChain) only ever talks to
//! hooks through the [`Hook`] trait, so any type can be a hook.
//!
//! For the common case, [`FnHook`] wraps a pair of closures:
//!
//! ```
//! use core::cell::Cell;
//! use std::rc::Rc;
//! use understory_hooks::{HookChain, hook};
//!
//! let clicks = Rc::new(Cell::new(0));
//! let chain: HookChain<u32> = HookChain::new();
//!
//! let counter = clicks.clone();
//! let _counter = chain.append(Rc::new(hook(
//!     |button: &u32| *button == 1,
//!     move |_: &u32| counter.set(counter.get() + 1),
//!     false,
//! )));
//!
//! chain.handle(&1).unwrap();
//! chain.handle(&2).unwrap();
//! assert_eq!(clicks.get(), 1);
//! ```

use core::convert::Infallible;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

/// A match predicate, an action, and a consumption flag.
///
/// `E` is the event type and is opaque to the chain. `X` is the error an
/// action may return; it defaults to [`Infallible`] for hooks that cannot
/// fail.
///
/// ## Contract
///
/// - [`matches`](Hook::matches) is a pure predicate. It must not mutate the
///   chain and must answer the same way for the same event within one pass.
/// - [`perform`](Hook::perform) is the side effect. It may add or remove hooks
///   on any chain, including the one currently dispatching; those changes only
///   show up in later passes. An `Err` aborts the pass and is returned to the
///   caller of [`handle`](crate::HookChain::handle) unchanged.
/// - [`consumes`](Hook::consumes) is read right after `perform` returns. When
///   it is `true`, no later hook in the same pass sees the event.
pub trait Hook<E: ?Sized, X = Infallible> {
    /// Whether this hook wants `event`.
    fn matches(&self, event: &E) -> bool;

    /// React to `event`.
    fn perform(&self, event: &E) -> Result<(), X>;

    /// Whether the event stops propagating after this hook has performed.
    fn consumes(&self) -> bool;
}

/// A [`Hook`] built from a matcher closure and an action closure.
///
/// The consumption flag lives in an atomic cell so the owner (or the action
/// itself) can change it after the hook has been registered; the chain reads
/// it after every `perform`.
pub struct FnHook<M, A> {
    matcher: M,
    action: A,
    consumes: AtomicBool,
}

impl<M, A> FnHook<M, A> {
    /// Create a hook from a predicate, a fallible action, and a consumption flag.
    ///
    /// ```
    /// use understory_hooks::{FnHook, Hook};
    ///
    /// let h = FnHook::new(
    ///     |n: &i32| *n < 0,
    ///     |_: &i32| Err("negative input"),
    ///     true,
    /// );
    /// let h: &dyn Hook<i32, &str> = &h;
    /// assert!(h.matches(&-3));
    /// assert_eq!(h.perform(&-3), Err("negative input"));
    /// ```
    pub fn new<E: ?Sized, X>(matcher: M, action: A, consumes: bool) -> Self
    where
        M: Fn(&E) -> bool,
        A: Fn(&E) -> Result<(), X>,
    {
        Self {
            matcher,
            action,
            consumes: AtomicBool::new(consumes),
        }
    }

    /// Change the consumption flag. Takes effect from the next time a chain
    /// reads it, which may be later in the current pass.
    pub fn set_consumes(&self, consumes: bool) {
        self.consumes.store(consumes, Ordering::Release);
    }
}

impl<E: ?Sized, X, M, A> Hook<E, X> for FnHook<M, A>
where
    M: Fn(&E) -> bool,
    A: Fn(&E) -> Result<(), X>,
{
    fn matches(&self, event: &E) -> bool {
        (self.matcher)(event)
    }

    fn perform(&self, event: &E) -> Result<(), X> {
        (self.action)(event)
    }

    fn consumes(&self) -> bool {
        self.consumes.load(Ordering::Acquire)
    }
}

impl<M, A> fmt::Debug for FnHook<M, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHook")
            .field("consumes", &self.consumes.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

/// Build an infallible [`FnHook`] from a predicate and an action returning `()`.
pub fn hook<E: ?Sized, M>(
    matcher: M,
    action: impl Fn(&E),
    consumes: bool,
) -> FnHook<M, impl Fn(&E) -> Result<(), Infallible>>
where
    M: Fn(&E) -> bool,
{
    FnHook::new(
        matcher,
        move |event: &E| {
            action(event);
            Ok::<(), Infallible>(())
        },
        consumes,
    )
}
