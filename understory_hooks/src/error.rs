// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Errors raised by chain mutation.
///
/// Errors produced by hook actions are not wrapped here; they are the chain's
/// own `X` parameter and come back from `handle` untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    /// The hook to add no longer exists (its last strong handle was dropped).
    ///
    /// The chain is left unchanged.
    #[error("invalid argument: the hook has already been dropped")]
    InvalidArgument,
}
