// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_hooks --heading-base-level=0

//! Understory Hooks: an ordered, `no_std` hook chain for events.
//!
//! ## Overview
//!
//! A [`HookChain`] holds an ordered list of [`Hook`]s. Each hook has a match
//! predicate, an action, and a consumption flag. [`HookChain::handle`] hands an
//! event to every matching hook from head to tail and stops after the first
//! matching hook that consumes it. The chain never looks inside events; it only
//! asks hooks whether they match.
//!
//! ## Ordering
//!
//! Position is the only precedence. [`HookChain::append`] places a hook at the
//! tail (handled last) and [`HookChain::prepend`] at the head (handled first).
//! Hooks are compared by identity, so placing a hook that is already present
//! moves it instead of adding a second copy.
//!
//! ```
//! use std::rc::Rc;
//! use understory_hooks::{HookChain, HookRef, hook};
//!
//! let chain: HookChain<()> = HookChain::new();
//! let a: HookRef<()> = Rc::new(hook(|_: &()| true, |_: &()| {}, false));
//! let b: HookRef<()> = Rc::new(hook(|_: &()| true, |_: &()| {}, false));
//!
//! let a = chain.append(a);
//! let b = chain.append(b);
//! let a = chain.append(a);
//! assert_eq!(chain.position(&b), Some(0));
//! assert_eq!(chain.position(&a), Some(1));
//! ```
//!
//! ## Ownership
//!
//! Chains hold weak references only. The code that creates a hook owns it
//! through the [`HookRef`] returned by `append`/`prepend`; dropping the last
//! handle takes the hook out of every chain. Removing a hook or dropping a
//! chain never drops a hook.
//!
//! ## Dispatch
//!
//! A pass works on a snapshot taken when [`HookChain::handle`] is called. All
//! predicates run first, then actions run in order. Hooks that add, move, or
//! remove hooks from inside their action only change what later passes see.
//! An action error ends the pass and is returned to the caller; panics unwind
//! through `handle` untouched.
//!
//! ## Threads
//!
//! [`HookChain`] is for a single thread. With the `std` feature (on by
//! default), [`SharedHookChain`] offers the same rules behind a mutex for
//! chains shared across threads.
//!
//! ## Features
//!
//! - `std` (default): enables [`SharedHookChain`] and `std` support in
//!   `tracing` and `thiserror`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod chain;
mod error;
mod hook;
mod order;
#[cfg(feature = "std")]
mod shared;

pub use chain::{HookChain, HookRef};
pub use error::HookError;
pub use hook::{FnHook, Hook, hook};
#[cfg(feature = "std")]
pub use shared::{SharedHookChain, SharedHookRef};
