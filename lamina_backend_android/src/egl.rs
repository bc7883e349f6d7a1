// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! EGL display, context and window surface.

use core::ffi::c_void;
use core::fmt;

use khronos_egl as khr;
use lamina_core::context::{BackendKind, GraphicsContext, NativeWindow, SurfaceRequest};
use lamina_core::gpu::Gpu;
use lamina_core::{Error, Result};
use lamina_render::GlowGpu;

type Egl = khr::DynamicInstance<khr::EGL1_4>;

fn platform(call: &'static str) -> impl FnOnce(khr::Error) -> Error {
    move |e| {
        let code: khr::Int = e.into();
        Error::Platform {
            call,
            code: i64::from(code),
        }
    }
}

/// `eglChooseConfig` attributes for `request`: an ES2-renderable window
/// config with RGBA channels and at least the requested depth and stencil.
fn config_attributes(request: &SurfaceRequest) -> Vec<khr::Int> {
    let channel = khr::Int::from(request.channel_bits());
    let mut attributes = vec![
        khr::RENDERABLE_TYPE,
        khr::OPENGL_ES2_BIT,
        khr::SURFACE_TYPE,
        khr::WINDOW_BIT,
        khr::RED_SIZE,
        channel,
        khr::GREEN_SIZE,
        channel,
        khr::BLUE_SIZE,
        channel,
        khr::ALPHA_SIZE,
        channel,
        khr::DEPTH_SIZE,
        khr::Int::from(request.depth_bits),
    ];
    if request.stencil_bits > 0 {
        attributes.extend([khr::STENCIL_SIZE, khr::Int::from(request.stencil_bits)]);
    }
    attributes.push(khr::NONE);
    attributes
}

const CONTEXT_ATTRIBUTES: [khr::Int; 3] = [khr::CONTEXT_CLIENT_VERSION, 2, khr::NONE];

/// [`GraphicsContext`] over EGL for an `ANativeWindow`.
///
/// Build it on the render thread through the factory given to
/// [`LayerManager::launch`].
///
/// [`LayerManager::launch`]: lamina_core::manager::LayerManager::launch
pub struct EglContext {
    request: SurfaceRequest,
    egl: Option<Egl>,
    display: Option<khr::Display>,
    config: Option<khr::Config>,
    context: Option<khr::Context>,
    surface: Option<(NativeWindow, khr::Surface)>,
    gpu: Option<GlowGpu>,
}

impl fmt::Debug for EglContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EglContext")
            .field("request", &self.request)
            .field("loaded", &self.egl.is_some())
            .field("initialized", &self.display.is_some())
            .field("created", &self.context.is_some())
            .field("bound", &self.surface.map(|(window, _)| window))
            .field("gpu", &self.gpu)
            .finish_non_exhaustive()
    }
}

impl Default for EglContext {
    fn default() -> Self {
        Self::new(SurfaceRequest::EMBEDDED)
    }
}

impl EglContext {
    /// Creates an unloaded context that will negotiate for `request`.
    #[must_use]
    pub const fn new(request: SurfaceRequest) -> Self {
        Self {
            request,
            egl: None,
            display: None,
            config: None,
            context: None,
            surface: None,
            gpu: None,
        }
    }

    /// Loads libEGL, initializes the default display, picks a config and
    /// creates the ES context. Partial state is left for
    /// [`teardown_context`](GraphicsContext::teardown_context).
    fn initialize(&mut self) -> Result<()> {
        // SAFETY: loading the system EGL library runs no foreign code beyond
        // its initializers.
        let egl = unsafe { Egl::load_required() }.map_err(|e| Error::Backend {
            call: "load libEGL",
            message: e.to_string(),
        })?;
        let egl = self.egl.insert(egl);

        // SAFETY: DEFAULT_DISPLAY is always a valid native display id.
        let display = unsafe { egl.get_display(khr::DEFAULT_DISPLAY) }.ok_or_else(|| {
            let cause = egl.get_error().unwrap_or(khr::Error::BadDisplay);
            platform("eglGetDisplay")(cause)
        })?;
        let (major, minor) = egl
            .initialize(display)
            .map_err(platform("eglInitialize"))?;
        self.display = Some(display);
        log::info!("EGL {major}.{minor} initialized");

        let config = egl
            .choose_first_config(display, &config_attributes(&self.request))
            .map_err(platform("eglChooseConfig"))?
            .ok_or_else(|| {
                Error::PixelFormat(format!("eglChooseConfig found nothing for {:?}", self.request))
            })?;
        self.config = Some(config);

        let context = egl
            .create_context(display, config, None, &CONTEXT_ATTRIBUTES)
            .map_err(platform("eglCreateContext"))?;
        self.context = Some(context);
        log::info!("EGL context {:?} created", context.as_ptr());
        Ok(())
    }
}

impl GraphicsContext for EglContext {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded
    }

    fn create_context(&mut self) -> Result<()> {
        if self.context.is_some() {
            return Ok(());
        }
        self.initialize()
    }

    fn create_window_surface(&mut self, window: NativeWindow) -> Result<()> {
        self.destroy_window_surface();
        let (Some(egl), Some(display), Some(config), Some(context)) =
            (&self.egl, self.display, self.config, self.context)
        else {
            return Err(Error::NotCurrent);
        };

        // SAFETY: the host guarantees `window` is a live ANativeWindow until
        // `stop` returns, and the surface is destroyed before that.
        let surface = unsafe {
            egl.create_window_surface(display, config, window.as_ptr(), None)
        }
        .map_err(platform("eglCreateWindowSurface"))?;

        if let Err(e) = egl.make_current(display, Some(surface), Some(surface), Some(context)) {
            if let Err(e) = egl.destroy_surface(display, surface) {
                log::warn!("eglDestroySurface failed: {e}");
            }
            return Err(platform("eglMakeCurrent")(e));
        }
        self.surface = Some((window, surface));

        if self.gpu.is_none() {
            let loader = |name: &str| {
                egl.get_proc_address(name)
                    .map_or(core::ptr::null(), |f| f as *const c_void)
            };
            // SAFETY: the context was made current on this thread above.
            self.gpu = Some(unsafe { GlowGpu::from_loader(loader) });
        }
        Ok(())
    }

    fn destroy_window_surface(&mut self) {
        let Some((window, surface)) = self.surface.take() else {
            return;
        };
        let (Some(egl), Some(display)) = (&self.egl, self.display) else {
            return;
        };
        if let Err(e) = egl.make_current(display, None, None, None) {
            log::warn!("eglMakeCurrent(none) failed: {e}");
        }
        if let Err(e) = egl.destroy_surface(display, surface) {
            log::warn!("eglDestroySurface for {window:?} failed: {e}");
        }
    }

    fn make_current(&mut self, current: bool) -> Result<()> {
        let (Some(egl), Some(display)) = (&self.egl, self.display) else {
            return Err(Error::NotCurrent);
        };
        if current {
            let (Some((_, surface)), Some(context)) = (self.surface, self.context) else {
                return Err(Error::NotCurrent);
            };
            egl.make_current(display, Some(surface), Some(surface), Some(context))
        } else {
            egl.make_current(display, None, None, None)
        }
        .map_err(platform("eglMakeCurrent"))
    }

    fn swap_buffers(&mut self) -> Result<()> {
        let (Some(egl), Some(display), Some((_, surface))) =
            (&self.egl, self.display, self.surface)
        else {
            return Err(Error::NotCurrent);
        };
        egl.swap_buffers(display, surface)
            .map_err(platform("eglSwapBuffers"))
    }

    fn teardown_context(&mut self) {
        self.gpu = None;
        self.destroy_window_surface();
        let Some(egl) = self.egl.take() else {
            return;
        };
        if let Some(display) = self.display.take() {
            if let Some(context) = self.context.take() {
                match egl.destroy_context(display, context) {
                    Ok(()) => log::info!("EGL context {:?} destroyed", context.as_ptr()),
                    Err(e) => log::warn!("eglDestroyContext failed: {e}"),
                }
            }
            if let Err(e) = egl.terminate(display) {
                log::warn!("eglTerminate failed: {e}");
            }
        }
        self.config = None;
        self.context = None;
    }

    fn gpu(&mut self) -> Option<&mut dyn Gpu> {
        self.gpu.as_mut().map(|gpu| gpu as &mut dyn Gpu)
    }
}

impl Drop for EglContext {
    fn drop(&mut self) {
        self.teardown_context();
    }
}
