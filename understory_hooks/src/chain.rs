// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-threaded hook chain.
//!
//! ## Overview
//!
//! A [`HookChain`] is an ordered list of hooks. Position is the only notion of
//! precedence: the head sees an event first, the tail last. There is no
//! priority field.
//!
//! ## Placement
//!
//! - [`HookChain::append`] puts a hook at the tail, [`HookChain::prepend`] at
//!   the head.
//! - A hook is identified by its allocation, not its contents. Adding a hook
//!   that is already present moves it to the requested end, so every hook
//!   appears at most once.
//!
//! ## Ownership
//!
//! The chain only keeps weak references. Whoever creates a hook owns it; once
//! the last [`HookRef`] is dropped the hook leaves every chain it was in.
//! Removing a hook or dropping the chain never drops a hook.
//!
//! ## Dispatch
//!
//! [`HookChain::handle`] runs one pass:
//!
//! 1. Snapshot the live hooks and keep the ones whose `matches` accepts the
//!    event. Every predicate runs before any action.
//! 2. Walk the matches head to tail and call `perform`.
//! 3. After each `perform`, stop if that hook `consumes`.
//!
//! Hooks may change the chain from inside `perform`. The pass keeps walking its
//! snapshot, so additions and removals only affect later passes.
//!
//! ```
//! use core::cell::RefCell;
//! use std::rc::Rc;
//! use understory_hooks::{HookChain, hook};
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let (l1, l2) = (log.clone(), log.clone());
//!
//! let chain: HookChain<str> = HookChain::new();
//! let top = chain.append(Rc::new(hook(|_: &str| true, move |_: &str| l1.borrow_mut().push("top"), true)));
//! let _below = chain.append(Rc::new(hook(|_: &str| true, move |_: &str| l2.borrow_mut().push("below"), false)));
//!
//! chain.handle("click").unwrap();
//! // The top hook consumed the click.
//! assert_eq!(*log.borrow(), vec!["top"]);
//!
//! // Dropping the only handle takes the hook out of the chain.
//! drop(top);
//! chain.handle("click").unwrap();
//! assert_eq!(*log.borrow(), vec!["top", "below"]);
//! ```

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::convert::Infallible;
use core::fmt;

use crate::error::HookError;
use crate::hook::Hook;
use crate::order::{self, End};

/// Owning handle to a hook that can be registered with a [`HookChain`].
pub type HookRef<E, X = Infallible> = Rc<dyn Hook<E, X>>;

type Entry<E, X> = Weak<dyn Hook<E, X>>;

fn same<E: ?Sized, X>(a: &Entry<E, X>, b: &Entry<E, X>) -> bool {
    Weak::ptr_eq(a, b)
}

fn alive<E: ?Sized, X>(entry: &Entry<E, X>) -> bool {
    entry.strong_count() > 0
}

/// Ordered chain of hooks for a single thread.
///
/// ## Usage
///
/// - Construct with [`HookChain::new`], or [`HookChain::with_init`] to seed it.
/// - Register hooks with [`HookChain::append`] / [`HookChain::prepend`] and
///   keep the returned handles for as long as the hooks should run. Both take
///   `&self`, so hooks holding a handle to the chain can reorder it while a
///   pass is running.
/// - Call [`HookChain::handle`] for every event.
pub struct HookChain<E: ?Sized, X = Infallible> {
    hooks: RefCell<Vec<Entry<E, X>>>,
}

impl<E: ?Sized, X> Default for HookChain<E, X> {
    fn default() -> Self {
        Self {
            hooks: RefCell::new(Vec::new()),
        }
    }
}

impl<E: ?Sized, X> fmt::Debug for HookChain<E, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<E: ?Sized, X> HookChain<E, X> {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain and let `init` seed it before it is handed out.
    pub fn with_init(init: impl FnOnce(&Self)) -> Self {
        let chain = Self::new();
        init(&chain);
        chain
    }

    /// Put `hook` at the tail, moving it there if it is already present.
    ///
    /// Returns the handle. The chain does not keep the hook alive, so dropping
    /// the last handle takes the hook back out.
    #[must_use = "the chain does not keep hooks alive"]
    pub fn append(&self, hook: HookRef<E, X>) -> HookRef<E, X> {
        self.place(Rc::downgrade(&hook), End::Back);
        hook
    }

    /// Put `hook` at the head, moving it there if it is already present.
    #[must_use = "the chain does not keep hooks alive"]
    pub fn prepend(&self, hook: HookRef<E, X>) -> HookRef<E, X> {
        self.place(Rc::downgrade(&hook), End::Front);
        hook
    }

    /// [`append`](Self::append) through a non-owning handle.
    ///
    /// Fails with [`HookError::InvalidArgument`] if the hook has been dropped.
    pub fn append_weak<H>(&self, hook: &Weak<H>) -> Result<Rc<H>, HookError>
    where
        H: Hook<E, X> + 'static,
    {
        self.place_weak(hook, End::Back)
    }

    /// [`prepend`](Self::prepend) through a non-owning handle.
    ///
    /// This is how a hook moves itself to the front from inside its own
    /// `perform`:
    ///
    /// ```
    /// use std::rc::{Rc, Weak};
    /// use understory_hooks::{Hook, HookChain, HookRef};
    ///
    /// struct Raise {
    ///     me: Weak<Raise>,
    ///     chain: Weak<HookChain<u32>>,
    /// }
    ///
    /// impl Hook<u32> for Raise {
    ///     fn matches(&self, ev: &u32) -> bool { *ev == 7 }
    ///     fn perform(&self, _: &u32) -> Result<(), core::convert::Infallible> {
    ///         if let Some(chain) = self.chain.upgrade() {
    ///             chain.prepend_weak(&self.me).expect("hook is alive while performing");
    ///         }
    ///         Ok(())
    ///     }
    ///     fn consumes(&self) -> bool { false }
    /// }
    ///
    /// let chain = Rc::new(HookChain::<u32>::new());
    /// let other = chain.append(Rc::new(understory_hooks::hook(|_: &u32| false, |_: &u32| {}, false)));
    /// let raise = Rc::new_cyclic(|me| Raise { me: me.clone(), chain: Rc::downgrade(&chain) });
    /// let raise: HookRef<u32> = chain.append(raise);
    ///
    /// chain.handle(&7).unwrap();
    /// assert_eq!(chain.position(&raise), Some(0));
    /// assert_eq!(chain.position(&other), Some(1));
    /// ```
    pub fn prepend_weak<H>(&self, hook: &Weak<H>) -> Result<Rc<H>, HookError>
    where
        H: Hook<E, X> + 'static,
    {
        self.place_weak(hook, End::Front)
    }

    /// Remove `hook` from this chain. Returns whether it was present.
    ///
    /// A pass that is already running still visits the hook if it was in that
    /// pass's snapshot.
    pub fn remove(&self, hook: &HookRef<E, X>) -> bool {
        let (removed, len) = {
            let mut hooks = self.hooks.borrow_mut();
            hooks.retain(alive);
            let removed = order::remove(&mut hooks, &Rc::downgrade(hook), same);
            (removed, hooks.len())
        };
        tracing::trace!(removed, len, "hook chain remove");
        removed
    }

    /// Remove every hook.
    pub fn clear(&self) {
        let cleared = core::mem::take(&mut *self.hooks.borrow_mut()).len();
        tracing::trace!(cleared, "hook chain clear");
    }

    /// Strong handles to the live hooks, in evaluation order.
    pub fn hooks(&self) -> Vec<HookRef<E, X>> {
        let mut hooks = self.hooks.borrow_mut();
        hooks.retain(alive);
        hooks.iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of live hooks.
    pub fn len(&self) -> usize {
        self.hooks.borrow().iter().filter(|h| alive(h)).count()
    }

    /// Whether the chain has no live hooks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `hook` is in this chain.
    pub fn contains(&self, hook: &HookRef<E, X>) -> bool {
        self.position(hook).is_some()
    }

    /// Index of `hook` among the live hooks, counted from the head.
    pub fn position(&self, hook: &HookRef<E, X>) -> Option<usize> {
        let target = Rc::downgrade(hook);
        self.hooks
            .borrow()
            .iter()
            .filter(|h| alive(h))
            .position(|h| same(h, &target))
    }

    /// Dispatch `event` through the chain.
    ///
    /// The snapshot holds strong handles, so a hook whose owner drops it
    /// mid-pass still finishes that pass. Returns the first error produced by
    /// a hook action; later hooks are not visited. A panic in a predicate or
    /// an action unwinds through this call.
    pub fn handle(&self, event: &E) -> Result<(), X> {
        // Release the borrow before any hook code runs so actions can mutate the chain.
        let snapshot = self.hooks();
        order::dispatch(snapshot, event)
    }

    fn place(&self, hook: Entry<E, X>, end: End) {
        let len = {
            let mut hooks = self.hooks.borrow_mut();
            hooks.retain(alive);
            order::place(&mut hooks, hook, end, same);
            hooks.len()
        };
        tracing::trace!(?end, len, "hook chain place");
    }

    fn place_weak<H>(&self, hook: &Weak<H>, end: End) -> Result<Rc<H>, HookError>
    where
        H: Hook<E, X> + 'static,
    {
        let Some(strong) = hook.upgrade() else {
            tracing::debug!(?end, "refusing to place a dropped hook");
            return Err(HookError::InvalidArgument);
        };
        let entry: Entry<E, X> = hook.clone();
        self.place(entry, end);
        Ok(strong)
    }
}
