// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hook chain that can be shared between threads.
//!
//! [`SharedHookChain`] has the same placement, ownership, and dispatch rules as
//! [`HookChain`](crate::HookChain). Every mutation and the snapshot read at the
//! start of [`handle`](SharedHookChain::handle) go through one mutex. The lock
//! is not held while predicates or actions run, so a hook may reorder the
//! chain that is dispatching it.
//!
//! There is no timeout: an action that never returns blocks its caller, and
//! only its caller.

use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::convert::Infallible;
use core::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::HookError;
use crate::hook::Hook;
use crate::order::{self, End};

/// Thread-safe owning handle to a hook that can be registered with a
/// [`SharedHookChain`].
pub type SharedHookRef<E, X = Infallible> = Arc<dyn Hook<E, X> + Send + Sync>;

type Entry<E, X> = Weak<dyn Hook<E, X> + Send + Sync>;

fn same<E: ?Sized, X>(a: &Entry<E, X>, b: &Entry<E, X>) -> bool {
    Weak::ptr_eq(a, b)
}

fn alive<E: ?Sized, X>(entry: &Entry<E, X>) -> bool {
    entry.strong_count() > 0
}

/// Ordered chain of hooks behind a mutex.
///
/// Like [`HookChain`](crate::HookChain), it only keeps weak references: hold
/// the handles returned by [`append`](Self::append) and
/// [`prepend`](Self::prepend) for as long as the hooks should run.
pub struct SharedHookChain<E: ?Sized, X = Infallible> {
    hooks: Mutex<Vec<Entry<E, X>>>,
}

impl<E: ?Sized, X> Default for SharedHookChain<E, X> {
    fn default() -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
        }
    }
}

impl<E: ?Sized, X> fmt::Debug for SharedHookChain<E, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHookChain")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<E: ?Sized, X> SharedHookChain<E, X> {
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
    #[must_use = "the chain does not keep hooks alive"]
    pub fn append(&self, hook: SharedHookRef<E, X>) -> SharedHookRef<E, X> {
        self.place(Arc::downgrade(&hook), End::Back);
        hook
    }

    /// Put `hook` at the head, moving it there if it is already present.
    #[must_use = "the chain does not keep hooks alive"]
    pub fn prepend(&self, hook: SharedHookRef<E, X>) -> SharedHookRef<E, X> {
        self.place(Arc::downgrade(&hook), End::Front);
        hook
    }

    /// [`append`](Self::append) through a non-owning handle.
    ///
    /// Fails with [`HookError::InvalidArgument`] if the hook has been dropped.
    pub fn append_weak<H>(&self, hook: &Weak<H>) -> Result<Arc<H>, HookError>
    where
        H: Hook<E, X> + Send + Sync + 'static,
    {
        self.place_weak(hook, End::Back)
    }

    /// [`prepend`](Self::prepend) through a non-owning handle.
    ///
    /// Fails with [`HookError::InvalidArgument`] if the hook has been dropped.
    pub fn prepend_weak<H>(&self, hook: &Weak<H>) -> Result<Arc<H>, HookError>
    where
        H: Hook<E, X> + Send + Sync + 'static,
    {
        self.place_weak(hook, End::Front)
    }

    /// Remove `hook`. Returns whether it was present.
    pub fn remove(&self, hook: &SharedHookRef<E, X>) -> bool {
        let (removed, len) = {
            let mut hooks = self.lock();
            hooks.retain(alive);
            let removed = order::remove(&mut hooks, &Arc::downgrade(hook), same);
            (removed, hooks.len())
        };
        tracing::trace!(removed, len, "shared hook chain remove");
        removed
    }

    /// Remove every hook.
    pub fn clear(&self) {
        let cleared = core::mem::take(&mut *self.lock()).len();
        tracing::trace!(cleared, "shared hook chain clear");
    }

    /// Strong handles to the live hooks, in evaluation order.
    pub fn hooks(&self) -> Vec<SharedHookRef<E, X>> {
        let mut hooks = self.lock();
        hooks.retain(alive);
        hooks.iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of live hooks.
    pub fn len(&self) -> usize {
        self.lock().iter().filter(|h| alive(h)).count()
    }

    /// Whether the chain has no live hooks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `hook` is in this chain.
    pub fn contains(&self, hook: &SharedHookRef<E, X>) -> bool {
        self.position(hook).is_some()
    }

    /// Index of `hook` among the live hooks, counted from the head.
    pub fn position(&self, hook: &SharedHookRef<E, X>) -> Option<usize> {
        let target = Arc::downgrade(hook);
        self.lock()
            .iter()
            .filter(|h| alive(h))
            .position(|h| same(h, &target))
    }

    /// Dispatch `event` through the chain.
    ///
    /// Same pass semantics as [`HookChain::handle`](crate::HookChain::handle):
    /// the snapshot is taken under the lock, then predicates and actions run
    /// with the lock released.
    pub fn handle(&self, event: &E) -> Result<(), X> {
        let snapshot = self.hooks();
        order::dispatch(snapshot, event)
    }

    // Every critical section is a single `Vec` operation, so a poisoned lock
    // still guards a well-formed sequence.
    fn lock(&self) -> MutexGuard<'_, Vec<Entry<E, X>>> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn place(&self, hook: Entry<E, X>, end: End) {
        let len = {
            let mut hooks = self.lock();
            hooks.retain(alive);
            order::place(&mut hooks, hook, end, same);
            hooks.len()
        };
        tracing::trace!(?end, len, "shared hook chain place");
    }

    fn place_weak<H>(&self, hook: &Weak<H>, end: End) -> Result<Arc<H>, HookError>
    where
        H: Hook<E, X> + Send + Sync + 'static,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{FnHook, hook};
    use alloc::vec;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::thread;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, name: &'static str, consumes: bool) -> SharedHookRef<u32> {
        let log = log.clone();
        Arc::new(hook(
            |_: &u32| true,
            move |_: &u32| log.lock().unwrap().push(name),
            consumes,
        ))
    }

    fn odd_only(log: &Log, name: &'static str, consumes: bool) -> SharedHookRef<u32> {
        let log = log.clone();
        Arc::new(hook(
            |n: &u32| n % 2 == 1,
            move |_: &u32| log.lock().unwrap().push(name),
            consumes,
        ))
    }

    #[test]
    fn ordering_and_consumption_match_the_local_chain() {
        let log = Log::default();
        let chain = SharedHookChain::new();
        let a = chain.append(recorder(&log, "a", false));
        let _b = chain.append(recorder(&log, "b", true));
        let _c = chain.append(recorder(&log, "c", false));
        chain.handle(&1).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);

        let a = chain.append(a);
        assert_eq!(chain.position(&a), Some(2));
        let a = chain.prepend(a);
        assert_eq!(chain.position(&a), Some(0));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn non_matching_hooks_are_skipped() {
        let log = Log::default();
        let chain = SharedHookChain::new();
        let _odd = chain.append(odd_only(&log, "odd", true));
        let _any = chain.append(recorder(&log, "any", false));
        chain.handle(&2).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["any"]);
        chain.handle(&3).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["any", "odd"]);

        let empty: SharedHookChain<u32> = SharedHookChain::new();
        empty.handle(&0).unwrap();
    }

    #[test]
    fn snapshot_isolates_hooks_added_during_the_pass() {
        let log = Log::default();
        let chain = Arc::new(SharedHookChain::<u32>::new());
        let late = recorder(&log, "late", false);
        let _installer = {
            let (log, weak_chain, late) = (log.clone(), Arc::downgrade(&chain), late.clone());
            chain.append(Arc::new(hook(
                |_: &u32| true,
                move |_: &u32| {
                    log.lock().unwrap().push("installer");
                    if let Some(chain) = weak_chain.upgrade() {
                        let _ = chain.append(late.clone());
                    }
                },
                false,
            )))
        };
        chain.handle(&0).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["installer"]);
        chain.handle(&0).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["installer", "installer", "late"]);
    }

    #[test]
    fn hook_removed_during_pass_is_still_visited_in_that_pass() {
        let log = Log::default();
        let chain = Arc::new(SharedHookChain::<u32>::new());
        let victim = recorder(&log, "victim", false);
        let _remover = {
            let (log, weak_chain, victim) = (log.clone(), Arc::downgrade(&chain), victim.clone());
            chain.append(Arc::new(hook(
                |_: &u32| true,
                move |_: &u32| {
                    log.lock().unwrap().push("remover");
                    if let Some(chain) = weak_chain.upgrade() {
                        chain.remove(&victim);
                    }
                },
                false,
            )))
        };
        let victim = chain.append(victim);
        chain.handle(&1).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["remover", "victim"]);
        assert!(!chain.contains(&victim));
        chain.handle(&2).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["remover", "victim", "remover"]);
    }

    #[test]
    fn panicking_action_ends_the_pass_and_leaves_the_chain_usable() {
        let log = Log::default();
        let chain: SharedHookChain<u32> = SharedHookChain::new();
        let _first = chain.append(recorder(&log, "first", false));
        let _boom = chain.append(Arc::new(hook(
            |_: &u32| true,
            |_: &u32| panic!("action failed"),
            false,
        )));
        let _last = chain.append(recorder(&log, "last", false));

        let outcome = catch_unwind(AssertUnwindSafe(|| chain.handle(&0)));
        assert!(outcome.is_err());
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn dropped_hooks_leave_the_chain() {
        let log = Log::default();
        let chain = SharedHookChain::new();
        let keep = chain.append(recorder(&log, "keep", false));
        let gone = chain.append(recorder(&log, "gone", false));
        drop(gone);
        chain.handle(&0).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["keep"]);
        assert_eq!(chain.len(), 1);
        drop(chain);
        assert_eq!(Arc::strong_count(&keep), 1);
    }

    #[test]
    fn concurrent_dispatch_and_mutation() {
        let hits = Arc::new(AtomicUsize::new(0));
        let chain = Arc::new(SharedHookChain::<u32>::new());
        let counter = {
            let hits = hits.clone();
            Arc::new(hook(
                |n: &u32| n % 2 == 0,
                move |_: &u32| {
                    hits.fetch_add(1, Ordering::Relaxed);
                },
                false,
            ))
        };
        let weak = Arc::downgrade(&counter);
        chain.append_weak(&weak).unwrap();

        let workers: Vec<_> = (0..4)
            .map(|w| {
                let chain = chain.clone();
                let weak = weak.clone();
                thread::spawn(move || {
                    for i in 0..100_u32 {
                        chain.handle(&(i * 2)).unwrap();
                        if w % 2 == 0 {
                            chain.prepend_weak(&weak).unwrap();
                        } else {
                            chain.append_weak(&weak).unwrap();
                        }
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        assert_eq!(hits.load(Ordering::Relaxed), 400);
        assert_eq!(chain.len(), 1);
        drop(counter);
        assert!(chain.is_empty());
    }

    #[test]
    fn errors_propagate_and_dropped_hooks_are_rejected() {
        #[derive(Debug, PartialEq)]
        struct Denied;

        let chain: SharedHookChain<u32, Denied> = SharedHookChain::new();
        let strict = Arc::new(FnHook::new(
            |n: &u32| *n > 3,
            |_: &u32| Err(Denied),
            false,
        ));
        let placed = chain.append(strict.clone());
        assert_eq!(chain.handle(&1), Ok(()));
        assert_eq!(chain.handle(&4), Err(Denied));

        let weak = Arc::downgrade(&strict);
        assert!(chain.prepend_weak(&weak).is_ok());
        assert!(chain.remove(&placed));
        drop((strict, placed));
        assert_eq!(chain.append_weak(&weak).err(), Some(HookError::InvalidArgument));
        assert!(chain.is_empty());
    }

    #[test]
    fn with_init_and_clear() {
        let log = Log::default();
        let (x, y) = (recorder(&log, "x", false), recorder(&log, "y", false));
        let chain = SharedHookChain::with_init(|c| {
            let _ = c.append(x.clone());
            let _ = c.append(y.clone());
        });
        assert_eq!(chain.hooks().len(), 2);
        chain.clear();
        assert!(chain.is_empty());
        assert_eq!(Arc::strong_count(&x), 1);
        assert_eq!(alloc::format!("{chain:?}"), "SharedHookChain { len: 0, .. }");
    }
}
