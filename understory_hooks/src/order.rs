// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement and dispatch shared by both chain flavors.

use alloc::vec::Vec;
use core::ops::Deref;

use crate::hook::Hook;

/// Which end of the sequence a hook is placed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum End {
    /// Head: evaluated first.
    Front,
    /// Tail: evaluated last.
    Back,
}

/// Place `item` at `end`, removing any earlier occurrence with the same identity.
///
/// This is a two-step operation: drop the existing entry (if any), then insert.
/// At most one entry can match because every insertion goes through here.
pub(crate) fn place<T>(seq: &mut Vec<T>, item: T, end: End, same: impl Fn(&T, &T) -> bool) {
    if let Some(i) = seq.iter().position(|h| same(h, &item)) {
        seq.remove(i);
    }
    match end {
        End::Front => seq.insert(0, item),
        End::Back => seq.push(item),
    }
}

/// Remove the entry with the same identity as `item`. Returns whether one was found.
pub(crate) fn remove<T>(seq: &mut Vec<T>, item: &T, same: impl Fn(&T, &T) -> bool) -> bool {
    match seq.iter().position(|h| same(h, item)) {
        Some(i) => {
            seq.remove(i);
            true
        }
        None => false,
    }
}

/// Run one pass over `snapshot`.
///
/// Every predicate runs before the first action. Actions then run head to tail
/// and the pass ends after the first hook that consumes, or at the first error.
pub(crate) fn dispatch<E, X, H>(snapshot: Vec<H>, event: &E) -> Result<(), X>
where
    E: ?Sized,
    H: Deref,
    H::Target: Hook<E, X>,
{
    let matching: Vec<H> = snapshot.into_iter().filter(|h| h.matches(event)).collect();
    tracing::trace!(matched = matching.len(), "hook chain dispatch");
    for (visited, hook) in matching.iter().enumerate() {
        hook.perform(event)?;
        if hook.consumes() {
            tracing::trace!(visited = visited + 1, "event consumed");
            return Ok(());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::vec;
    use core::cell::RefCell;
    use core::convert::Infallible;

    // Tag identity by the first field; the second tells entries apart.
    fn same(a: &(u8, u8), b: &(u8, u8)) -> bool {
        a.0 == b.0
    }

    #[test]
    fn back_moves_existing_to_tail() {
        let mut seq = vec![(1, 0), (2, 0), (3, 0)];
        place(&mut seq, (1, 1), End::Back, same);
        assert_eq!(seq, vec![(2, 0), (3, 0), (1, 1)]);
    }

    #[test]
    fn front_moves_existing_to_head() {
        let mut seq = vec![(1, 0), (2, 0), (3, 0)];
        place(&mut seq, (3, 1), End::Front, same);
        assert_eq!(seq, vec![(3, 1), (1, 0), (2, 0)]);
    }

    #[test]
    fn placing_at_current_end_is_idempotent() {
        let mut seq = vec![(1, 0), (2, 0)];
        place(&mut seq, (2, 0), End::Back, same);
        place(&mut seq, (2, 0), End::Back, same);
        assert_eq!(seq, vec![(1, 0), (2, 0)]);
        place(&mut seq, (1, 0), End::Front, same);
        assert_eq!(seq, vec![(1, 0), (2, 0)]);
    }

    #[test]
    fn remove_reports_presence() {
        let mut seq = vec![(1, 0), (2, 0)];
        assert!(remove(&mut seq, &(1, 9), same));
        assert!(!remove(&mut seq, &(1, 9), same));
        assert_eq!(seq, vec![(2, 0)]);
    }

    struct Step<'a> {
        name: &'static str,
        wants: bool,
        consumes: bool,
        log: &'a RefCell<Vec<&'static str>>,
    }

    impl Hook<u8> for Step<'_> {
        fn matches(&self, _: &u8) -> bool {
            self.wants
        }

        fn perform(&self, _: &u8) -> Result<(), Infallible> {
            self.log.borrow_mut().push(self.name);
            Ok(())
        }

        fn consumes(&self) -> bool {
            self.consumes
        }
    }

    #[test]
    fn dispatch_skips_non_matching_and_stops_after_consumer() {
        let log = RefCell::new(Vec::new());
        let step = |name, wants, consumes| {
            Box::new(Step {
                name,
                wants,
                consumes,
                log: &log,
            })
        };
        let snapshot = vec![
            step("skipped", false, true),
            step("first", true, false),
            step("consumer", true, true),
            step("unreached", true, false),
        ];
        dispatch::<u8, Infallible, _>(snapshot, &0).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "consumer"]);
    }
}
