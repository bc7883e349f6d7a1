// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for platform rendering contexts.
//!
//! Lamina splits platform-specific work into *backend* crates. Each backend
//! provides a [`GraphicsContext`]:
//!
//! - **Context**: created once per [`LayerManager`] lifetime, after a pixel
//!   or surface configuration has been negotiated against a
//!   [`SurfaceRequest`]. GPU objects (layer framebuffers, the compositing
//!   program) belong to it.
//!
//! - **Window surface**: created and destroyed repeatedly as the host's
//!   native window appears and disappears. The context, and every GPU object
//!   it owns, outlives any single surface.
//!
//! - **Gpu**: the [`Gpu`] capability for the context, available once it has
//!   been made current.
//!
//! # Backend variants
//!
//! | Variant | Crate | Context | Surface |
//! |---|---|---|---|
//! | [`BackendKind::Desktop`] | `lamina_backend_windows` | `wglCreateContext` on the window DC | the window DC |
//! | [`BackendKind::Embedded`] | `lamina_backend_android` | `eglCreateContext` on the default display | `eglCreateWindowSurface` |
//!
//! # Threading
//!
//! Contexts are created *on* the render thread by a factory closure (see
//! [`LayerManager::launch`]), so implementations need not be `Send`. All
//! methods are called from that thread only, which upholds the invariant
//! that the rendering context is never current on more than one thread.
//!
//! [`LayerManager`]: crate::manager::LayerManager
//! [`LayerManager::launch`]: crate::manager::LayerManager::launch

use core::fmt;
use core::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gpu::Gpu;

/// Which family of rendering API a backend drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Desktop OpenGL through WGL.
    Desktop,
    /// OpenGL ES through EGL.
    #[default]
    Embedded,
}

/// An opaque platform window handle (`HWND`, `ANativeWindow*`, …).
///
/// The handle is carried as an integer so that it can cross from the host
/// thread to the render thread; only backends turn it back into a pointer.
/// It is borrowed: the host keeps the window alive until it has called
/// [`LayerManager::stop`](crate::manager::LayerManager::stop).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeWindow(NonZeroUsize);

impl NativeWindow {
    /// Wraps a raw handle, returning `None` for a null handle.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Wraps a raw pointer handle, returning `None` for null.
    #[inline]
    #[must_use]
    pub fn from_ptr<T>(ptr: *mut T) -> Option<Self> {
        Self::from_raw(ptr as usize)
    }

    /// Returns the raw handle value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> usize {
        self.0.get()
    }

    /// Returns the handle as an untyped pointer for FFI calls.
    #[inline]
    #[must_use]
    pub fn as_ptr(self) -> *mut core::ffi::c_void {
        self.0.get() as *mut core::ffi::c_void
    }
}

impl fmt::Debug for NativeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeWindow({:#x})", self.0)
    }
}

/// The pixel / surface configuration a backend negotiates for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceRequest {
    /// Total color bits (RGBA8 = 32).
    pub color_bits: u8,
    /// Minimum depth-buffer bits.
    pub depth_bits: u8,
    /// Minimum stencil-buffer bits.
    pub stencil_bits: u8,
    /// Request a double-buffered surface.
    pub double_buffer: bool,
}

impl SurfaceRequest {
    /// Request used by the embedded (EGL) reference configuration.
    pub const EMBEDDED: Self = Self {
        color_bits: 32,
        depth_bits: 8,
        stencil_bits: 0,
        double_buffer: true,
    };

    /// Request used by the desktop (WGL) reference configuration.
    pub const DESKTOP: Self = Self {
        color_bits: 32,
        depth_bits: 24,
        stencil_bits: 8,
        double_buffer: true,
    };

    /// Bits per color channel, assuming four equal channels.
    #[inline]
    #[must_use]
    pub const fn channel_bits(&self) -> u8 {
        self.color_bits / 4
    }

    /// The reference request for a backend kind.
    #[must_use]
    pub const fn for_backend(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Desktop => Self::DESKTOP,
            BackendKind::Embedded => Self::EMBEDDED,
        }
    }
}

impl Default for SurfaceRequest {
    fn default() -> Self {
        Self::EMBEDDED
    }
}

/// A platform rendering context bound to a window surface.
///
/// The render loop drives implementations in this order:
///
/// ```text
/// create_context()                                 once
/// ┌─► create_window_surface(native)                window appeared
/// │     gpu() … swap_buffers()                     every frame
/// └── destroy_window_surface()                     window disappeared
/// teardown_context()                               once, on exit
/// ```
pub trait GraphicsContext {
    /// Which API family this context drives.
    fn kind(&self) -> BackendKind;

    /// Negotiates a pixel/surface configuration and creates the rendering
    /// context.
    ///
    /// # Errors
    ///
    /// [`Error::PixelFormat`](crate::Error::PixelFormat) when no
    /// configuration satisfies the request, or a platform error when
    /// context creation fails. Both are fatal for the owning manager.
    fn create_context(&mut self) -> Result<()>;

    /// Creates a surface for `window` and makes the context current on it.
    ///
    /// # Errors
    ///
    /// A platform error if the surface cannot be created or made current.
    fn create_window_surface(&mut self, window: NativeWindow) -> Result<()>;

    /// Releases currency and destroys the current window surface, if any.
    fn destroy_window_surface(&mut self);

    /// Binds (`true`) or unbinds (`false`) the context on the calling thread.
    ///
    /// The render loop unbinds once before
    /// [`teardown_context`](Self::teardown_context).
    ///
    /// # Errors
    ///
    /// A platform error if the call fails, or
    /// [`Error::NotCurrent`](crate::Error::NotCurrent) when binding without
    /// a surface.
    fn make_current(&mut self, current: bool) -> Result<()>;

    /// Presents the back buffer.
    ///
    /// # Errors
    ///
    /// A platform error if presentation fails.
    fn swap_buffers(&mut self) -> Result<()>;

    /// Releases the rendering context and then the device/display. Safe to
    /// call more than once.
    fn teardown_context(&mut self);

    /// The GPU capability for this context; `None` until the context has
    /// been made current for the first time.
    fn gpu(&mut self) -> Option<&mut dyn Gpu>;
}
