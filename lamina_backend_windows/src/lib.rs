// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Windows backend for lamina.
//!
//! [`WglContext`] implements [`GraphicsContext`] with classic WGL: a device
//! context from `GetDC`, a pixel format from `ChoosePixelFormat`, and a
//! rendering context from `wglCreateContext`. GL entry points are resolved
//! through `wglGetProcAddress`, falling back to `opengl32.dll` exports for
//! the OpenGL 1.1 core, and wrapped in a [`GlowGpu`].
//!
//! The context must be constructed on the thread that will render; hand
//! [`LayerManager::launch`] a factory closure:
//!
//! ```no_run
//! # use lamina_core::config::LayerManagerConfig;
//! # use lamina_core::context::{BackendKind, NativeWindow};
//! # use lamina_core::manager::LayerManager;
//! # use lamina_backend_windows::WglContext;
//! # fn run(hwnd: NativeWindow) -> lamina_core::Result<()> {
//! let config = LayerManagerConfig::for_backend(BackendKind::Desktop);
//! let request = config.surface;
//! let mut manager = LayerManager::new(config)?;
//! manager.launch(move || WglContext::new(hwnd, request))?;
//! manager.start(hwnd, 800, 600);
//! # Ok(())
//! # }
//! ```
//!
//! [`GraphicsContext`]: lamina_core::context::GraphicsContext
//! [`GlowGpu`]: lamina_render::GlowGpu
//! [`LayerManager::launch`]: lamina_core::manager::LayerManager::launch

#![cfg(windows)]
#![expect(unsafe_code, reason = "WGL and GDI calls go through the raw Win32 API")]

mod wgl;

pub use wgl::WglContext;
