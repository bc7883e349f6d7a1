// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Win32 host for lamina.
//!
//! Opens a window, hands its `HWND` to a [`LayerManager`] driving a
//! [`WglContext`], and forwards left-button mouse input as touch events so
//! layers can be dragged. A right click swaps the top layer for a
//! checkerboard image. Minimizing stops rendering; restoring resumes it.
//!
//! Run with `RUST_LOG=info` to see lifecycle logging. An optional first
//! argument names a TOML configuration file.

#[cfg(not(windows))]
fn main() {
    eprintln!("windows_layers only runs on Windows");
}

#[cfg(windows)]
fn main() {
    env_logger::init();
    if let Err(e) = host::run() {
        log::error!("windows_layers: {e}");
        std::process::exit(1);
    }
}

#[cfg(windows)]
#[expect(unsafe_code, reason = "Win32 window creation and message dispatch")]
mod host {
    use std::cell::RefCell;
    use std::error::Error;

    use lamina_backend_windows::WglContext;
    use lamina_core::config::LayerManagerConfig;
    use lamina_core::content::ImageContent;
    use lamina_core::context::{BackendKind, NativeWindow};
    use lamina_core::geometry::{IntPoint, IntSize};
    use lamina_core::image::{ImageBuffer, PixelFormat};
    use lamina_core::layer::{LayerPlacement, TouchEvent, TouchKind};
    use lamina_core::manager::LayerManager;
    use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CS_HREDRAW, CS_OWNDC, CS_VREDRAW, CW_USEDEFAULT, CreateWindowExW, DefWindowProcW,
        DestroyWindow, DispatchMessageW, GetMessageW, IDC_ARROW, LoadCursorW, MSG,
        PostQuitMessage, RegisterClassW, SIZE_MINIMIZED, SW_SHOW, ShowWindow, TranslateMessage,
        WINDOW_EX_STYLE, WM_CLOSE, WM_DESTROY, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MOUSEMOVE,
        WM_RBUTTONDOWN, WM_SIZE, WNDCLASSW, WS_OVERLAPPEDWINDOW,
    };
    use windows::core::w;

    const MK_LBUTTON: usize = 0x0001;
    const CHECKER_SIZE: u32 = 256;

    thread_local! {
        static MANAGER: RefCell<Option<LayerManager>> = const { RefCell::new(None) };
    }

    fn with_manager(f: impl FnOnce(&LayerManager)) {
        MANAGER.with_borrow(|manager| {
            if let Some(manager) = manager {
                f(manager);
            }
        });
    }

    fn load_config() -> Result<LayerManagerConfig, Box<dyn Error>> {
        let config = match std::env::args_os().nth(1) {
            Some(path) => LayerManagerConfig::load(path)?,
            None => LayerManagerConfig::for_backend(BackendKind::Desktop),
        };
        if config.backend != BackendKind::Desktop {
            log::warn!("configured for {:?}; WGL is used regardless", config.backend);
        }
        Ok(config)
    }

    pub(crate) fn run() -> Result<(), Box<dyn Error>> {
        let config = load_config()?;

        // SAFETY: plain Win32 class registration and window creation; the
        // class name and title are static wide strings.
        let hwnd = unsafe {
            let instance = GetModuleHandleW(None)?;
            let class = WNDCLASSW {
                style: CS_HREDRAW | CS_VREDRAW | CS_OWNDC,
                lpfnWndProc: Some(wnd_proc),
                hInstance: instance.into(),
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                lpszClassName: w!("LaminaLayers"),
                ..WNDCLASSW::default()
            };
            if RegisterClassW(&class) == 0 {
                return Err("RegisterClassW failed".into());
            }
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                w!("LaminaLayers"),
                w!("lamina layers"),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                800,
                600,
                None,
                None,
                Some(instance.into()),
                None,
            )?
        };
        let window = NativeWindow::from_ptr(hwnd.0).ok_or("CreateWindowExW returned null")?;

        let request = config.surface;
        let mut manager = LayerManager::new(config)?;
        manager.launch(move || WglContext::new(window, request))?;
        MANAGER.with_borrow_mut(|slot| *slot = Some(manager));

        // SAFETY: `hwnd` is the live window created above; WM_SIZE from
        // ShowWindow starts rendering.
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }

        if let Some(mut manager) = MANAGER.take() {
            manager.shutdown();
            log::info!("final status: {:?}", manager.status());
        }
        Ok(())
    }

    /// Splits `lParam` into signed client coordinates.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "LOWORD / HIWORD extraction"
    )]
    fn client_point(lparam: LPARAM) -> IntPoint {
        let x = lparam.0 as u16 as i16;
        let y = (lparam.0 >> 16) as u16 as i16;
        IntPoint::new(i32::from(x), i32::from(y))
    }

    fn touch(kind: TouchKind, lparam: LPARAM) {
        let p = client_point(lparam);
        let event = TouchEvent::new(kind, f64::from(p.x), f64::from(p.y));
        with_manager(|m| m.touch(event));
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "LOWORD / HIWORD extraction"
    )]
    fn client_size(lparam: LPARAM) -> (u32, u32) {
        let width = lparam.0 as u16;
        let height = (lparam.0 >> 16) as u16;
        (u32::from(width), u32::from(height))
    }

    fn checkerboard() -> lamina_core::Result<ImageBuffer> {
        let side = CHECKER_SIZE as usize;
        let mut bytes = Vec::with_capacity(side * side * 4);
        for y in 0..side {
            for x in 0..side {
                let dark = (x / 32 + y / 32) % 2 == 1;
                bytes.extend_from_slice(if dark {
                    &[40, 40, 160, 255]
                } else {
                    &[255, 255, 255, 255]
                });
            }
        }
        ImageBuffer::new(IntSize::new(CHECKER_SIZE, CHECKER_SIZE), PixelFormat::Rgba, bytes)
    }

    fn on_size(hwnd: HWND, wparam: WPARAM, lparam: LPARAM) {
        let (width, height) = client_size(lparam);
        with_manager(|manager| {
            if wparam.0 == SIZE_MINIMIZED as usize || width == 0 || height == 0 {
                manager.stop();
            } else if let Some(window) = NativeWindow::from_ptr(hwnd.0) {
                manager.start(window, width, height);
            }
        });
    }

    fn on_right_click(lparam: LPARAM) {
        let origin = client_point(lparam);
        with_manager(|manager| {
            let last = manager.config().layers.len().saturating_sub(1);
            let size = IntSize::new(CHECKER_SIZE, CHECKER_SIZE);
            let replaced = checkerboard().and_then(|image| {
                let content = ImageContent::new(image, IntPoint::ZERO);
                manager.replace_layer(last, LayerPlacement::fixed(origin, size), Box::new(content))
            });
            if let Err(e) = replaced {
                log::warn!("layer {last} not replaced: {e}");
            }
        });
    }

    unsafe extern "system" fn wnd_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_SIZE => on_size(hwnd, wparam, lparam),
            WM_LBUTTONDOWN => touch(TouchKind::Down, lparam),
            WM_MOUSEMOVE if wparam.0 & MK_LBUTTON != 0 => touch(TouchKind::Move, lparam),
            WM_LBUTTONUP => touch(TouchKind::Up, lparam),
            WM_RBUTTONDOWN => on_right_click(lparam),
            WM_CLOSE => {
                // The surface must be released before the window goes away.
                with_manager(|m| {
                    m.stop();
                });
                // SAFETY: `hwnd` is this window procedure's own window.
                if let Err(e) = unsafe { DestroyWindow(hwnd) } {
                    log::warn!("DestroyWindow failed: {e}");
                }
            }
            WM_DESTROY => {
                // SAFETY: posts WM_QUIT to this thread's queue.
                unsafe { PostQuitMessage(0) };
            }
            // SAFETY: forwarding the original message arguments.
            _ => return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
        LRESULT(0)
    }
}
