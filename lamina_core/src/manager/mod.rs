// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host-facing layer manager.
//!
//! A [`LayerManager`] is built on the host thread from a
//! [`LayerManagerConfig`], launched once with a factory for its
//! [`GraphicsContext`], and then driven with window lifecycle and touch
//! calls:
//!
//! ```text
//! host thread                          render thread
//! ───────────                          ─────────────
//! new(config)
//! launch(factory) ───── spawn ───────► factory() → create_context()
//!                                        Paused: wait for a window
//! start(window, w, h) ── notify ─────►  create_window_surface → Running
//! touch(event) ───────── queue ──────►  applied before the next frame
//! stop() ─────────────── notify ─────►  destroy_window_surface → Paused
//!   (returns once the surface is gone)
//! shutdown() ─────────── notify ─────►  release layers, teardown_context
//!   (joins)                              Terminated
//! ```
//!
//! Only the window handle, its size, the run flag and a change counter are
//! shared under a mutex. Touch events and layer replacements travel over a
//! channel and are applied by the render thread, which owns every layer.
//! Drag moves are only queued while the render thread is running.

mod render;
mod shared;

pub use shared::ManagerStatus;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use self::render::RenderLoop;
use self::shared::Shared;
use crate::compositor::Compositor;
use crate::config::LayerManagerConfig;
use crate::content::LayerContent;
use crate::context::{GraphicsContext, NativeWindow};
use crate::error::{Error, Result};
use crate::geometry::IntSize;
use crate::layer::{LayerPlacement, LayerStack, TouchEvent, TouchKind};
use crate::lifecycle::RenderState;

/// Work queued for the render thread.
pub(crate) enum Command {
    Touch(TouchEvent),
    Replace {
        index: usize,
        placement: LayerPlacement,
        content: Box<dyn LayerContent>,
    },
}

/// Owns the render thread and everything it composites.
///
/// Dropping the manager shuts the render thread down and joins it.
pub struct LayerManager {
    config: LayerManagerConfig,
    shared: Arc<Shared>,
    commands: Sender<Command>,
    /// Render-thread state held until [`launch`](Self::launch).
    pending: Option<(Receiver<Command>, LayerStack)>,
    layer_count: usize,
    thread: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for LayerManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayerManager")
            .field("backend", &self.config.backend)
            .field("layers", &self.layer_count)
            .field("launched", &self.pending.is_none())
            .field("status", &self.shared.status())
            .finish()
    }
}

impl LayerManager {
    /// Validates `config` and builds the layer stack it describes. No
    /// thread is started and no GPU work happens until
    /// [`launch`](Self::launch).
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the configuration does not validate.
    pub fn new(config: LayerManagerConfig) -> Result<Self> {
        config.validate()?;
        let mut stack = LayerStack::new();
        for layer in &config.layers {
            stack.push(layer.placement(), layer.content.build())?;
        }
        let layer_count = stack.len();
        let (commands, receiver) = mpsc::channel();
        Ok(Self {
            shared: Arc::new(Shared::new(ManagerStatus {
                layers: stack.status(),
                ..ManagerStatus::default()
            })),
            config,
            commands,
            pending: Some((receiver, stack)),
            layer_count,
            thread: None,
        })
    }

    /// The configuration this manager was built from.
    #[must_use]
    pub fn config(&self) -> &LayerManagerConfig {
        &self.config
    }

    /// Replaces the content of layer `index` before launch, e.g. with an
    /// [`ImageContent`](crate::content::ImageContent).
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyLaunched`] after [`launch`](Self::launch), or
    /// [`Error::LayerIndex`] for an unknown layer.
    pub fn set_content(&mut self, index: usize, content: Box<dyn LayerContent>) -> Result<()> {
        let (_, stack) = self.pending.as_mut().ok_or(Error::AlreadyLaunched)?;
        stack.set_content(index, content)
    }

    /// Spawns the render thread. `factory` runs on that thread and builds
    /// the graphics context, so the context never crosses threads.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyLaunched`] on a second call, [`Error::Spawn`] if the
    /// thread cannot be created.
    pub fn launch<C, F>(&mut self, factory: F) -> Result<()>
    where
        C: GraphicsContext + 'static,
        F: FnOnce() -> C + Send + 'static,
    {
        let (commands, stack) = self.pending.take().ok_or(Error::AlreadyLaunched)?;
        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        let spawned = thread::Builder::new()
            .name("lamina-render".into())
            .spawn(move || {
                let ctx = factory();
                let kind = ctx.kind();
                if kind != config.backend {
                    log::warn!(
                        "configured for {:?} but the context is {kind:?}; using its shaders",
                        config.backend
                    );
                }
                RenderLoop {
                    ctx,
                    shared,
                    commands,
                    stack,
                    compositor: Compositor::new(),
                    sources: config.shader_sources(kind),
                    frame_interval: config.frame_interval(),
                    surface_poll: config.surface_poll(),
                    state: RenderState::Stopped,
                    bound: None,
                    frames: 0,
                    generation: 0,
                }
                .run();
            });
        match spawned {
            Ok(handle) => {
                self.thread = Some(handle);
                log::info!("render thread launched ({:?})", self.config.backend);
                Ok(())
            }
            Err(e) => {
                self.shared.publish(|s| s.state = RenderState::Terminated);
                Err(Error::Spawn(e))
            }
        }
    }

    /// Hands the render thread a window to draw into. Calling again with
    /// the same handle updates the size; a different handle makes the
    /// render thread rebuild its surface.
    pub fn start(&self, window: NativeWindow, width: u32, height: u32) {
        self.shared.update_host(|h| {
            h.window = Some(window);
            h.size = IntSize::new(width, height);
        });
        log::info!("start: {window:?} {width}x{height}");
    }

    /// Withdraws the window and waits until the render thread has released
    /// its surface, so the host may destroy the window afterwards. Returns
    /// the withdrawn handle.
    pub fn stop(&self) -> Option<NativeWindow> {
        let (previous, generation) = self.shared.update_host(|h| h.window.take());
        log::info!("stop: {previous:?}");
        if self.thread.is_some() {
            let _ = self.shared.wait_status(None, |s| {
                s.state.is_terminal()
                    || (s.generation >= generation && s.state != RenderState::Running)
            });
        }
        previous
    }

    /// Queues a touch event for the render thread.
    ///
    /// [`TouchKind::Move`] events are dropped unless the manager is
    /// [`Running`](RenderState::Running), so a paused render thread does not
    /// replay a backlog of drags when it resumes.
    pub fn touch(&self, event: TouchEvent) {
        if event.kind == TouchKind::Move {
            let state = self.shared.state();
            if state != RenderState::Running {
                log::trace!("move dropped while {state:?}");
                return;
            }
        }
        if self.commands.send(Command::Touch(event)).is_err() {
            log::debug!("touch dropped: render thread gone");
        }
    }

    /// Queues replacement of layer `index`; the old layer's GPU objects are
    /// released and the new one is created on a following frame.
    ///
    /// # Errors
    ///
    /// [`Error::LayerIndex`] for an unknown layer.
    pub fn replace_layer(
        &self,
        index: usize,
        placement: LayerPlacement,
        content: Box<dyn LayerContent>,
    ) -> Result<()> {
        if index >= self.layer_count {
            return Err(Error::LayerIndex {
                index,
                count: self.layer_count,
            });
        }
        let cmd = Command::Replace {
            index,
            placement,
            content,
        };
        if self.commands.send(cmd).is_err() {
            log::debug!("layer {index} replacement dropped: render thread gone");
        }
        Ok(())
    }

    /// The status the render thread published last.
    #[must_use]
    pub fn status(&self) -> ManagerStatus {
        self.shared.status()
    }

    /// Waits up to `timeout` for the render thread to reach `state`.
    /// Returns whether it did.
    pub fn wait_for_state(&self, state: RenderState, timeout: Duration) -> bool {
        self.wait_until(timeout, |s| s.state == state).is_some()
    }

    /// Waits up to `timeout` for the published status to satisfy `pred`.
    pub fn wait_until(
        &self,
        timeout: Duration,
        pred: impl FnMut(&ManagerStatus) -> bool,
    ) -> Option<ManagerStatus> {
        self.shared.wait_status(Some(timeout), pred)
    }

    /// Stops the render thread and joins it. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.shared.update_host(|h| h.run = false);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("render thread panicked");
            }
            log::info!("render thread joined");
        }
    }
}

impl Drop for LayerManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SolidColor;
    use crate::context::BackendKind;
    use crate::geometry::IntPoint;
    use crate::gpu::Rgba;
    use crate::shader::ShaderSources;
    use crate::testing::{ContextProbe, MockContext};

    const WAIT: Duration = Duration::from_secs(5);

    fn window(raw: usize) -> NativeWindow {
        NativeWindow::from_raw(raw).unwrap()
    }

    fn fast_config() -> LayerManagerConfig {
        LayerManagerConfig {
            frame_interval_ms: 1,
            surface_poll_ms: 5,
            ..LayerManagerConfig::default()
        }
    }

    fn launched(config: LayerManagerConfig, probe: &ContextProbe) -> LayerManager {
        let mut manager = LayerManager::new(config).unwrap();
        let probe = probe.clone();
        manager.launch(move || MockContext::new(probe)).unwrap();
        assert!(manager.wait_for_state(RenderState::Paused, WAIT));
        manager
    }

    fn frames_after(manager: &LayerManager, n: u64) -> ManagerStatus {
        manager
            .wait_until(WAIT, |s| s.state == RenderState::Running && s.frames >= n)
            .expect("render thread stalled")
    }

    #[test]
    fn two_layers_are_created_once_and_survive_surface_loss() {
        let probe = ContextProbe::new();
        let mut manager = launched(fast_config(), &probe);

        manager.start(window(1), 800, 600);
        let status = frames_after(&manager, 2);
        assert_eq!(status.layers[0].size, IntSize::new(800, 600));
        assert_eq!(status.layers[1].origin, IntPoint::new(50, 50));
        assert_eq!(status.layers[1].size, IntSize::new(500, 500));
        assert!(status.layers.iter().all(|l| l.created && l.create_count == 1));

        assert_eq!(manager.stop(), Some(window(1)));
        assert_eq!(manager.status().state, RenderState::Paused);
        assert_eq!(probe.with(|p| p.surfaces_destroyed), 1);

        manager.start(window(1), 800, 600);
        let status = frames_after(&manager, status.frames + 2);
        assert!(status.layers.iter().all(|l| l.created && l.create_count == 1));
        assert_eq!(probe.with(|p| p.surfaces_created), 2);

        manager.shutdown();
        assert_eq!(manager.status().state, RenderState::Terminated);
        probe.with(|p| {
            assert_eq!(p.contexts_created, 1);
            assert_eq!(p.teardowns, 1);
            assert_eq!(p.surfaces_created, p.surfaces_destroyed);
            assert_eq!(p.live_at_teardown, Some(0));
            assert_eq!(p.allocations, p.frees);
        });
    }

    #[test]
    fn touch_drags_the_topmost_layer() {
        let probe = ContextProbe::new();
        let manager = launched(fast_config(), &probe);
        manager.start(window(1), 800, 600);
        frames_after(&manager, 1);

        manager.touch(TouchEvent::down(60.0, 60.0));
        manager.touch(TouchEvent::moved(70.0, 80.0));
        let status = manager
            .wait_until(WAIT, |s| s.layers[1].origin == IntPoint::new(60, 70))
            .expect("drag not applied");
        assert_eq!(status.active_layer, Some(1));
        assert_eq!(status.layers[0].origin, IntPoint::ZERO);

        manager.touch(TouchEvent::up(70.0, 80.0));
        manager.touch(TouchEvent::moved(200.0, 200.0));
        let frames = manager.status().frames;
        let status = frames_after(&manager, frames + 3);
        assert_eq!(status.active_layer, None);
        assert_eq!(status.layers[1].origin, IntPoint::new(60, 70));
    }

    #[test]
    fn moves_while_paused_are_not_replayed() {
        let probe = ContextProbe::new();
        let manager = launched(fast_config(), &probe);
        manager.start(window(12), 800, 600);
        frames_after(&manager, 1);
        manager.touch(TouchEvent::down(60.0, 60.0));
        manager
            .wait_until(WAIT, |s| s.active_layer == Some(1))
            .expect("down not applied");

        manager.stop();
        for step in 1..=50 {
            manager.touch(TouchEvent::moved(60.0 + f64::from(step), 60.0));
        }
        manager.start(window(12), 800, 600);
        let status = frames_after(&manager, manager.status().frames + 3);
        assert_eq!(status.active_layer, Some(1));
        assert_eq!(status.layers[1].origin, IntPoint::new(50, 50));

        manager.touch(TouchEvent::moved(70.0, 60.0));
        manager
            .wait_until(WAIT, |s| s.layers[1].origin == IntPoint::new(60, 50))
            .expect("drag after resume not applied");
    }

    #[test]
    fn builtin_shader_matches_the_context_kind() {
        let probe = ContextProbe::new();
        probe.with(|p| p.kind = BackendKind::Desktop);
        let config = LayerManagerConfig::from_toml_str("frame_interval_ms = 1\n").unwrap();
        assert_eq!(config.backend, BackendKind::Embedded);
        let mut manager = launched(config, &probe);
        manager.start(window(13), 64, 64);
        frames_after(&manager, 1);
        manager.shutdown();
        probe.with(|p| {
            assert_eq!(p.compiled_shaders.len(), 2);
            assert!(p.compiled_shaders.iter().all(|s| s.starts_with("#version 120")));
        });
    }

    #[test]
    fn teardown_releases_the_context_once() {
        let probe = ContextProbe::new();
        let mut manager = launched(fast_config(), &probe);
        manager.start(window(14), 64, 64);
        frames_after(&manager, 1);
        manager.shutdown();
        probe.with(|p| {
            assert_eq!(p.releases, 1);
            assert_eq!(p.teardowns, 1);
        });
    }

    #[test]
    fn negotiation_failure_terminates_without_running() {
        let probe = ContextProbe::new();
        probe.with(|p| p.fail_create_context = true);
        let mut manager = LayerManager::new(fast_config()).unwrap();
        let p = probe.clone();
        manager.launch(move || MockContext::new(p)).unwrap();
        assert!(manager.wait_for_state(RenderState::Terminated, WAIT));

        manager.start(window(3), 100, 100);
        assert_eq!(manager.stop(), Some(window(3)));
        manager.shutdown();
        assert_eq!(probe.with(|p| p.surfaces_created), 0);
        assert_eq!(manager.status().frames, 0);
    }

    #[test]
    fn surface_failure_is_fatal() {
        let probe = ContextProbe::new();
        probe.with(|p| p.fail_surface = true);
        let mut manager = launched(fast_config(), &probe);
        manager.start(window(4), 100, 100);
        assert!(manager.wait_for_state(RenderState::Terminated, WAIT));
        manager.shutdown();
        assert_eq!(probe.with(|p| p.teardowns), 1);
    }

    #[test]
    fn shader_failure_is_fatal() {
        let probe = ContextProbe::new();
        let config = LayerManagerConfig {
            shader: Some(ShaderSources {
                vertex: "#error no".into(),
                fragment: String::new(),
            }),
            ..fast_config()
        };
        let mut manager = launched(config, &probe);
        manager.start(window(5), 100, 100);
        assert!(manager.wait_for_state(RenderState::Terminated, WAIT));
        manager.shutdown();
        probe.with(|p| {
            assert_eq!(p.swaps, 0);
            assert_eq!(p.live_at_teardown, Some(0));
        });
    }

    #[test]
    fn incomplete_framebuffer_is_retried() {
        let probe = ContextProbe::new();
        probe.with(|p| p.fail_framebuffers = 1);
        let manager = launched(fast_config(), &probe);
        manager.start(window(6), 320, 240);
        let status = manager
            .wait_until(WAIT, |s| s.layers.iter().all(|l| l.created))
            .expect("layers never created");
        assert!(status.layers.iter().all(|l| l.create_count == 1));
    }

    #[test]
    fn a_new_window_rebuilds_the_surface() {
        let probe = ContextProbe::new();
        let manager = launched(fast_config(), &probe);
        manager.start(window(7), 320, 240);
        frames_after(&manager, 1);
        manager.start(window(8), 320, 240);
        manager
            .wait_until(WAIT, |_| probe.with(|p| p.surfaces_created) == 2)
            .expect("surface not rebuilt");
        let status = frames_after(&manager, manager.status().frames + 1);
        assert!(status.layers.iter().all(|l| l.create_count == 1));
        assert_eq!(probe.with(|p| p.windows.clone()), vec![window(7), window(8)]);
    }

    #[test]
    fn shutdown_while_paused_abandons_gpu_objects() {
        let probe = ContextProbe::new();
        let mut manager = launched(fast_config(), &probe);
        manager.start(window(9), 320, 240);
        frames_after(&manager, 1);
        manager.stop();
        manager.shutdown();
        probe.with(|p| {
            assert_eq!(p.teardowns, 1);
            assert_eq!(p.surfaces_created, p.surfaces_destroyed);
            // Objects died with the context; nothing was freed twice.
            assert!(p.live_at_teardown.is_some_and(|n| n > 0));
        });
    }

    #[test]
    fn replace_layer_builds_a_new_one() {
        let probe = ContextProbe::new();
        let manager = launched(fast_config(), &probe);
        assert!(matches!(
            manager.replace_layer(2, LayerPlacement::default(), Box::new(SolidColor(Rgba::BLACK))),
            Err(Error::LayerIndex { index: 2, count: 2 })
        ));
        manager.start(window(10), 320, 240);
        frames_after(&manager, 1);
        manager
            .replace_layer(
                1,
                LayerPlacement::fixed(IntPoint::new(5, 6), IntSize::new(16, 16)),
                Box::new(SolidColor(Rgba::BLACK)),
            )
            .unwrap();
        let status = manager
            .wait_until(WAIT, |s| {
                s.layers[1].created && s.layers[1].origin == IntPoint::new(5, 6)
            })
            .expect("replacement not applied");
        assert_eq!(status.layers[1].size, IntSize::new(16, 16));
    }

    #[test]
    fn launch_and_content_are_one_shot() {
        let probe = ContextProbe::new();
        let mut manager = LayerManager::new(fast_config()).unwrap();
        manager
            .set_content(0, Box::new(SolidColor(Rgba::BLACK)))
            .unwrap();
        assert!(matches!(
            manager.set_content(5, Box::new(SolidColor(Rgba::BLACK))),
            Err(Error::LayerIndex { .. })
        ));
        let p = probe.clone();
        manager.launch(move || MockContext::new(p)).unwrap();
        let p = probe.clone();
        assert!(matches!(
            manager.launch(move || MockContext::new(p)),
            Err(Error::AlreadyLaunched)
        ));
        assert!(matches!(
            manager.set_content(0, Box::new(SolidColor(Rgba::BLACK))),
            Err(Error::AlreadyLaunched)
        ));
    }

    #[test]
    fn stop_before_launch_does_not_block() {
        let manager = LayerManager::new(fast_config()).unwrap();
        manager.start(window(11), 10, 10);
        assert_eq!(manager.stop(), Some(window(11)));
        assert_eq!(manager.status().state, RenderState::Stopped);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = LayerManagerConfig {
            layers: Vec::new(),
            ..LayerManagerConfig::default()
        };
        assert!(matches!(LayerManager::new(config), Err(Error::Config(_))));
    }
}
