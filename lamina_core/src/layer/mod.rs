// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Off-screen layers and their paint order.
//!
//! A *layer* is a rectangle of window pixels backed by its own framebuffer
//! object. Each layer has:
//!
//! - A placement: an origin on the window grid and a size. The size may be
//!   left open in configuration, meaning "the window size at the moment the
//!   layer is first created".
//! - GPU objects ([`Layer`]): color texture, depth renderbuffer, FBO and a
//!   pair of quad vertex buffers, created and destroyed as a set.
//! - Content ([`LayerContent`](crate::content::LayerContent)): whatever is
//!   rendered into the FBO each frame.
//!
//! [`LayerStack`] keeps layers in insertion order, which is also paint
//! order: index 0 is composited first and ends up at the bottom. Hit-testing
//! scans in the opposite direction so the topmost layer wins.

mod offscreen;
mod stack;
mod touch;

pub use offscreen::{DrawScope, Layer};
pub(crate) use offscreen::{QUAD_UV, quad_coords};
pub use stack::{LayerPlacement, LayerStack, LayerStatus, MAX_LAYERS};
pub use touch::{TouchEvent, TouchKind};
pub(crate) use touch::TouchRouter;
