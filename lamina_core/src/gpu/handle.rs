// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GPU object name types.
//!
//! GL object names are non-zero `u32`s; zero means "no object". Wrapping them
//! in `NonZeroU32` newtypes lets `Option<TextureId>` stand for "maybe
//! allocated" at no size cost and keeps the different object kinds from
//! being mixed up.

use core::fmt;
use core::num::NonZeroU32;

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Wraps a raw object name, returning `None` for zero.
            #[inline]
            #[must_use]
            pub const fn from_raw(raw: u32) -> Option<Self> {
                match NonZeroU32::new(raw) {
                    Some(n) => Some(Self(n)),
                    None => None,
                }
            }

            /// Returns the raw object name.
            #[inline]
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

gpu_handle!(
    /// A 2-D texture object.
    TextureId,
    "TextureId"
);
gpu_handle!(
    /// A renderbuffer object (used for layer depth buffers).
    RenderbufferId,
    "RenderbufferId"
);
gpu_handle!(
    /// A framebuffer object.
    FramebufferId,
    "FramebufferId"
);
gpu_handle!(
    /// A vertex buffer object.
    BufferId,
    "BufferId"
);
gpu_handle!(
    /// A compiled shader stage.
    ShaderId,
    "ShaderId"
);
gpu_handle!(
    /// A linked shader program.
    ProgramId,
    "ProgramId"
);

/// A vertex attribute slot in a linked program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttribLocation(pub u32);

/// A uniform slot in a linked program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Logs a set of handles the way the lifecycle log lines print them: `0`
/// for an absent handle.
pub(crate) fn raw_or_zero<T, F: Fn(T) -> u32>(handle: Option<T>, get: F) -> u32 {
    handle.map_or(0, get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_name() {
        assert!(TextureId::from_raw(0).is_none());
        assert_eq!(TextureId::from_raw(7).map(TextureId::get), Some(7));
    }

    #[test]
    fn debug_shows_kind_and_name() {
        let fb = FramebufferId::from_raw(3);
        assert_eq!(format!("{fb:?}"), "Some(FramebufferId(3))");
    }

    #[test]
    fn absent_handles_print_as_zero() {
        assert_eq!(raw_or_zero(BufferId::from_raw(0), BufferId::get), 0);
        assert_eq!(raw_or_zero(BufferId::from_raw(9), BufferId::get), 9);
    }
}
