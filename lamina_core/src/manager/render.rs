// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render thread body.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use super::Command;
use super::shared::Shared;
use crate::compositor::Compositor;
use crate::context::{GraphicsContext, NativeWindow};
use crate::error::{Error, Result};
use crate::geometry::IntSize;
use crate::gpu::Rgba;
use crate::layer::LayerStack;
use crate::lifecycle::{RenderState, Transition, on_window};
use crate::shader::ShaderSources;
use crate::transform::Transform3d;

/// Publishes [`RenderState::Terminated`] however the render thread exits,
/// unwinding included, so host-side waits never hang.
struct TerminateOnExit(Arc<Shared>);

impl Drop for TerminateOnExit {
    fn drop(&mut self) {
        self.0.publish(|s| s.state = RenderState::Terminated);
    }
}

pub(crate) struct RenderLoop<C> {
    pub(crate) ctx: C,
    pub(crate) shared: Arc<Shared>,
    pub(crate) commands: Receiver<Command>,
    pub(crate) stack: LayerStack,
    pub(crate) compositor: Compositor,
    pub(crate) sources: ShaderSources,
    pub(crate) frame_interval: Duration,
    pub(crate) surface_poll: Duration,
    pub(crate) state: RenderState,
    pub(crate) bound: Option<NativeWindow>,
    pub(crate) frames: u64,
    pub(crate) generation: u64,
}

impl<C: GraphicsContext> RenderLoop<C> {
    /// Runs until shutdown or a fatal error, then releases everything.
    pub(crate) fn run(mut self) {
        let _exit = TerminateOnExit(Arc::clone(&self.shared));

        if let Err(e) = self.ctx.create_context() {
            log::error!("{:?} context creation failed: {e}", self.ctx.kind());
            self.ctx.teardown_context();
            return;
        }
        log::info!("{:?} context created", self.ctx.kind());
        self.state = RenderState::Paused;
        self.publish();

        if let Err(e) = self.drive() {
            log::error!("render loop terminated: {e}");
        }
        self.teardown();
        log::info!("render loop exited after {} frames", self.frames);
    }

    fn drive(&mut self) -> Result<()> {
        loop {
            let host = self.shared.snapshot();
            if !host.run {
                return Ok(());
            }
            self.generation = host.generation;

            let changed = matches!(
                (self.bound, host.window),
                (Some(bound), Some(window)) if bound != window
            );
            match on_window(self.state, host.window.is_some(), changed) {
                Transition::Resume => {
                    let window = host.window.ok_or(Error::NotCurrent)?;
                    self.ctx.create_window_surface(window)?;
                    self.bound = Some(window);
                    self.state = RenderState::Running;
                    log::info!("surface created for {window:?} {:?}", host.size);
                }
                Transition::Suspend => {
                    self.ctx.destroy_window_surface();
                    log::info!("surface for {:?} destroyed", self.bound);
                    self.bound = None;
                    self.state = RenderState::Paused;
                    self.publish();
                    continue;
                }
                Transition::Stay => {}
            }

            let wait = if self.state == RenderState::Running {
                self.frame(host.size)?;
                self.frame_interval
            } else {
                self.surface_poll
            };
            self.publish();
            self.shared.wait_for_host(host.generation, wait);
        }
    }

    /// Applies queued commands, renders every layer and composites them
    /// onto the window surface.
    fn frame(&mut self, window: IntSize) -> Result<()> {
        let gpu = self.ctx.gpu().ok_or(Error::NotCurrent)?;

        loop {
            match self.commands.try_recv() {
                Ok(Command::Touch(event)) => self.stack.touch(event),
                Ok(Command::Replace {
                    index,
                    placement,
                    content,
                }) => {
                    if let Err(e) = self.stack.replace(gpu, index, placement, content) {
                        log::warn!("layer replacement rejected: {e}");
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        self.compositor
            .ensure(gpu, &self.sources)
            .inspect_err(|e| log::error!("compositing program unavailable: {e}"))?;
        self.stack.ensure_created(gpu, window);
        self.stack.draw_contents(gpu, &self.compositor, self.frames);

        gpu.viewport(0, 0, window);
        gpu.clear(Rgba::BLACK);
        let projection = Transform3d::orthographic(
            0.0,
            f64::from(window.width),
            f64::from(window.height),
            0.0,
            -1.0,
            1.0,
        );
        if projection.is_finite() {
            self.stack.composite(gpu, &self.compositor, &projection);
        } else {
            log::debug!("nothing composited onto a {window:?} window");
        }
        gpu.flush();

        self.ctx.swap_buffers()?;
        self.frames += 1;
        Ok(())
    }

    fn publish(&self) {
        let layers = self.stack.status();
        let active_layer = self.stack.active_layer();
        self.shared.publish(|s| {
            s.state = self.state;
            s.frames = self.frames;
            s.layers = layers;
            s.active_layer = active_layer;
            s.generation = self.generation;
        });
    }

    /// Releases GPU objects while a surface keeps the context current,
    /// forgets them otherwise, then drops the surface, unbinds the context
    /// from this thread and tears it down.
    fn teardown(&mut self) {
        let gpu = if self.bound.is_some() {
            self.ctx.gpu()
        } else {
            None
        };
        if let Some(gpu) = gpu {
            self.stack.destroy_all(gpu);
            self.compositor.destroy(gpu);
        } else {
            self.stack.abandon_all();
            self.compositor.abandon();
        }
        if self.bound.take().is_some() {
            self.ctx.destroy_window_surface();
        }
        if let Err(e) = self.ctx.make_current(false) {
            log::debug!("releasing the context before teardown failed: {e}");
        }
        self.ctx.teardown_context();
        self.state = RenderState::Terminated;
        self.publish();
    }
}
