// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Android backend for lamina.
//!
//! [`EglContext`] implements [`GraphicsContext`] over EGL 1.4 for OpenGL ES
//! 2.0: the default display, a config matching the [`SurfaceRequest`], one
//! ES context for the manager's lifetime, and a window surface per
//! `ANativeWindow` the host supplies. `libEGL` is loaded at runtime, so the
//! crate also works against Mesa's EGL on desktop Linux.
//!
//! [`GraphicsContext`]: lamina_core::context::GraphicsContext
//! [`SurfaceRequest`]: lamina_core::context::SurfaceRequest

#![expect(unsafe_code, reason = "EGL surfaces wrap raw native window pointers")]

mod egl;

pub use egl::EglContext;
