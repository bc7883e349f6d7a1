// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! WGL rendering context bound to Win32 windows.

use core::ffi::c_void;
use core::fmt;
use std::ffi::CString;

use lamina_core::context::{BackendKind, GraphicsContext, NativeWindow, SurfaceRequest};
use lamina_core::gpu::Gpu;
use lamina_core::{Error, Result};
use lamina_render::GlowGpu;
use windows::Win32::Foundation::{GetLastError, HWND};
use windows::Win32::Graphics::Gdi::{GetDC, HDC, ReleaseDC};
use windows::Win32::Graphics::OpenGL::{
    ChoosePixelFormat, GetPixelFormat, HGLRC, PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW, PFD_FLAGS,
    PFD_SUPPORT_OPENGL, PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR, SetPixelFormat, SwapBuffers,
    wglCreateContext, wglDeleteContext, wglGetProcAddress, wglMakeCurrent,
};
use windows::Win32::System::LibraryLoader::{GetModuleHandleA, GetProcAddress};
use windows::core::{PCSTR, s};

fn platform(call: &'static str) -> impl FnOnce(windows::core::Error) -> Error {
    move |e| Error::Platform {
        call,
        code: i64::from(e.code().0),
    }
}

fn last_error(call: &'static str) -> Error {
    // SAFETY: reads the calling thread's last-error value.
    let code = unsafe { GetLastError() };
    Error::Platform {
        call,
        code: i64::from(code.0),
    }
}

/// Builds the descriptor handed to `ChoosePixelFormat`.
fn pixel_format_descriptor(request: &SurfaceRequest) -> PIXELFORMATDESCRIPTOR {
    let buffering = if request.double_buffer {
        PFD_DOUBLEBUFFER
    } else {
        PFD_FLAGS(0)
    };
    #[expect(
        clippy::cast_possible_truncation,
        reason = "PIXELFORMATDESCRIPTOR is 40 bytes"
    )]
    let size = size_of::<PIXELFORMATDESCRIPTOR>() as u16;
    PIXELFORMATDESCRIPTOR {
        nSize: size,
        nVersion: 1,
        dwFlags: PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | buffering,
        iPixelType: PFD_TYPE_RGBA,
        cColorBits: request.color_bits,
        cAlphaBits: request.channel_bits(),
        cDepthBits: request.depth_bits,
        cStencilBits: request.stencil_bits,
        ..PIXELFORMATDESCRIPTOR::default()
    }
}

/// Resolves a GL entry point: extensions and GL > 1.1 through
/// `wglGetProcAddress`, the 1.1 core through `opengl32.dll` exports.
fn load_gl_proc(name: &str) -> *const c_void {
    let Ok(name) = CString::new(name) else {
        return core::ptr::null();
    };
    let name = PCSTR::from_raw(name.as_ptr().cast());

    // SAFETY: `name` is NUL-terminated and outlives the call; a context is
    // current on this thread while GlowGpu loads its entry points.
    let proc = unsafe { wglGetProcAddress(name) };
    // wglGetProcAddress reports failure as 0, 1, 2, 3 or -1.
    if let Some(f) = proc {
        let ptr = f as *const c_void;
        if !matches!(ptr as usize, 1..=3 | usize::MAX) {
            return ptr;
        }
    }

    // SAFETY: opengl32.dll is loaded for as long as WGL is in use.
    let Ok(module) = (unsafe { GetModuleHandleA(s!("opengl32.dll")) }) else {
        return core::ptr::null();
    };
    // SAFETY: `module` is a live module handle and `name` is NUL-terminated.
    unsafe { GetProcAddress(module, name) }.map_or(core::ptr::null(), |f| f as *const c_void)
}

/// A window handle paired with a device context obtained from `GetDC`.
#[derive(Clone, Copy)]
struct DeviceContext {
    hwnd: HWND,
    hdc: HDC,
}

impl DeviceContext {
    fn acquire(window: NativeWindow) -> Result<Self> {
        let hwnd = HWND(window.as_ptr());
        // SAFETY: the host guarantees `window` is a live HWND until `stop`
        // returns.
        let hdc = unsafe { GetDC(Some(hwnd)) };
        if hdc.is_invalid() {
            return Err(last_error("GetDC"));
        }
        Ok(Self { hwnd, hdc })
    }

    fn release(self) {
        // SAFETY: `hdc` was obtained from `GetDC(hwnd)` and is released once.
        let released = unsafe { ReleaseDC(Some(self.hwnd), self.hdc) };
        if released == 0 {
            log::warn!("ReleaseDC({:?}) failed", self.hwnd.0);
        }
    }
}

/// [`GraphicsContext`] over WGL for a Win32 window.
///
/// The pixel format is negotiated on the window passed to [`new`], which
/// must therefore be the window the host will [`start`] with first. Later
/// windows are given the same pixel format when they are bound.
///
/// A `WglContext` is not `Send`; build it on the render thread through the
/// factory given to [`LayerManager::launch`].
///
/// [`new`]: Self::new
/// [`start`]: lamina_core::manager::LayerManager::start
/// [`LayerManager::launch`]: lamina_core::manager::LayerManager::launch
pub struct WglContext {
    window: NativeWindow,
    request: SurfaceRequest,
    pixel_format: Option<(i32, PIXELFORMATDESCRIPTOR)>,
    device: Option<DeviceContext>,
    glrc: Option<HGLRC>,
    surface: Option<DeviceContext>,
    gpu: Option<GlowGpu>,
}

impl fmt::Debug for WglContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WglContext")
            .field("window", &self.window)
            .field("request", &self.request)
            .field("pixel_format", &self.pixel_format.map(|(index, _)| index))
            .field("created", &self.glrc.is_some())
            .field("bound", &self.surface.map(|dc| dc.hwnd.0))
            .field("gpu", &self.gpu)
            .finish_non_exhaustive()
    }
}

impl WglContext {
    /// Creates an unbound context description for `window`.
    ///
    /// Nothing is allocated until [`GraphicsContext::create_context`].
    #[must_use]
    pub fn new(window: NativeWindow, request: SurfaceRequest) -> Self {
        Self {
            window,
            request,
            pixel_format: None,
            device: None,
            glrc: None,
            surface: None,
            gpu: None,
        }
    }

    /// Gives `dc` the negotiated pixel format unless its window already has
    /// one.
    fn adopt_pixel_format(&self, dc: DeviceContext) -> Result<()> {
        let (index, pfd) = self.pixel_format.ok_or(Error::NotCurrent)?;
        // SAFETY: `dc.hdc` is a live device context.
        if unsafe { GetPixelFormat(dc.hdc) } != 0 {
            return Ok(());
        }
        // SAFETY: `pfd` is a fully initialised descriptor.
        unsafe { SetPixelFormat(dc.hdc, index, &pfd) }.map_err(platform("SetPixelFormat"))
    }

    fn negotiate(&mut self, dc: DeviceContext) -> Result<HGLRC> {
        let pfd = pixel_format_descriptor(&self.request);
        // SAFETY: `dc.hdc` is live and `pfd` is fully initialised.
        let index = unsafe { ChoosePixelFormat(dc.hdc, &pfd) };
        if index == 0 {
            return Err(Error::PixelFormat(format!(
                "ChoosePixelFormat found nothing for {:?} (error {:#x})",
                self.request,
                // SAFETY: reads the calling thread's last-error value.
                unsafe { GetLastError() }.0,
            )));
        }
        self.pixel_format = Some((index, pfd));
        self.adopt_pixel_format(dc)?;
        // SAFETY: the device context now carries an OpenGL pixel format.
        unsafe { wglCreateContext(dc.hdc) }.map_err(platform("wglCreateContext"))
    }
}

impl GraphicsContext for WglContext {
    fn kind(&self) -> BackendKind {
        BackendKind::Desktop
    }

    fn create_context(&mut self) -> Result<()> {
        if self.glrc.is_some() {
            return Ok(());
        }
        let dc = DeviceContext::acquire(self.window)?;
        match self.negotiate(dc) {
            Ok(glrc) => {
                log::info!(
                    "WGL context {:?} created on {:?} (pixel format {:?})",
                    glrc.0,
                    self.window,
                    self.pixel_format.map(|(index, _)| index)
                );
                self.device = Some(dc);
                self.glrc = Some(glrc);
                Ok(())
            }
            Err(e) => {
                dc.release();
                Err(e)
            }
        }
    }

    fn create_window_surface(&mut self, window: NativeWindow) -> Result<()> {
        let glrc = self.glrc.ok_or(Error::NotCurrent)?;
        self.destroy_window_surface();

        let dc = DeviceContext::acquire(window)?;
        let bound = self.adopt_pixel_format(dc).and_then(|()| {
            // SAFETY: `dc.hdc` carries the context's pixel format and `glrc`
            // is not current on any other thread.
            unsafe { wglMakeCurrent(dc.hdc, glrc) }.map_err(platform("wglMakeCurrent"))
        });
        if let Err(e) = bound {
            dc.release();
            return Err(e);
        }
        self.surface = Some(dc);

        if self.gpu.is_none() {
            // SAFETY: the context was made current on this thread above.
            self.gpu = Some(unsafe { GlowGpu::from_loader(load_gl_proc) });
        }
        Ok(())
    }

    fn destroy_window_surface(&mut self) {
        let Some(dc) = self.surface.take() else {
            return;
        };
        // SAFETY: releasing currency on the calling thread.
        if let Err(e) = unsafe { wglMakeCurrent(HDC::default(), HGLRC::default()) } {
            log::warn!("wglMakeCurrent(null) failed: {e}");
        }
        dc.release();
    }

    fn make_current(&mut self, current: bool) -> Result<()> {
        let result = if current {
            let glrc = self.glrc.ok_or(Error::NotCurrent)?;
            let dc = self.surface.ok_or(Error::NotCurrent)?;
            // SAFETY: both handles are live and owned by this context.
            unsafe { wglMakeCurrent(dc.hdc, glrc) }
        } else {
            // SAFETY: releasing currency on the calling thread.
            unsafe { wglMakeCurrent(HDC::default(), HGLRC::default()) }
        };
        result.map_err(platform("wglMakeCurrent"))
    }

    fn swap_buffers(&mut self) -> Result<()> {
        let dc = self.surface.ok_or(Error::NotCurrent)?;
        // SAFETY: `dc.hdc` is the live, current window DC.
        unsafe { SwapBuffers(dc.hdc) }.map_err(platform("SwapBuffers"))
    }

    fn teardown_context(&mut self) {
        self.gpu = None;
        self.destroy_window_surface();
        if let Some(glrc) = self.glrc.take() {
            // SAFETY: `glrc` is no longer current and is deleted once.
            match unsafe { wglDeleteContext(glrc) } {
                Ok(()) => log::info!("WGL context {:?} deleted", glrc.0),
                Err(e) => log::warn!("wglDeleteContext failed: {e}"),
            }
        }
        if let Some(dc) = self.device.take() {
            dc.release();
        }
        self.pixel_format = None;
    }

    fn gpu(&mut self) -> Option<&mut dyn Gpu> {
        self.gpu.as_mut().map(|gpu| gpu as &mut dyn Gpu)
    }
}

impl Drop for WglContext {
    fn drop(&mut self) {
        self.teardown_context();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_request_fills_descriptor() {
        let pfd = pixel_format_descriptor(&SurfaceRequest::DESKTOP);
        assert_eq!(usize::from(pfd.nSize), size_of::<PIXELFORMATDESCRIPTOR>());
        assert_eq!(pfd.cColorBits, 32);
        assert_eq!(pfd.cAlphaBits, 8);
        assert_eq!(pfd.cDepthBits, 24);
        assert_eq!(pfd.cStencilBits, 8);
        assert_eq!(pfd.iPixelType, PFD_TYPE_RGBA);
        assert_ne!(pfd.dwFlags.0 & PFD_DOUBLEBUFFER.0, 0, "double buffer requested");
        assert_ne!(pfd.dwFlags.0 & PFD_SUPPORT_OPENGL.0, 0, "OpenGL support requested");
    }

    #[test]
    fn single_buffered_request_omits_flag() {
        let request = SurfaceRequest {
            double_buffer: false,
            ..SurfaceRequest::DESKTOP
        };
        let pfd = pixel_format_descriptor(&request);
        assert_eq!(pfd.dwFlags.0 & PFD_DOUBLEBUFFER.0, 0, "no double buffer");
    }

    #[test]
    fn unknown_entry_point_resolves_to_null() {
        assert!(load_gl_proc("glLaminaDoesNotExist").is_null());
        assert!(load_gl_proc("bad\0name").is_null());
    }

    #[test]
    fn unbound_context_reports_not_current() {
        let window = NativeWindow::from_raw(0x10).unwrap();
        let mut ctx = WglContext::new(window, SurfaceRequest::DESKTOP);
        assert!(matches!(ctx.swap_buffers(), Err(Error::NotCurrent)));
        assert!(matches!(ctx.make_current(true), Err(Error::NotCurrent)));
        assert!(ctx.gpu().is_none());
        ctx.teardown_context();
    }
}
