// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State shared between the host thread and the render thread.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::context::NativeWindow;
use crate::geometry::IntSize;
use crate::layer::LayerStatus;
use crate::lifecycle::RenderState;

/// What the host has told the render thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HostState {
    pub(crate) window: Option<NativeWindow>,
    pub(crate) size: IntSize,
    pub(crate) run: bool,
    /// Bumped on every host mutation.
    pub(crate) generation: u64,
}

/// Observable progress of the render thread.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManagerStatus {
    /// Lifecycle state.
    pub state: RenderState,
    /// Frames presented so far.
    pub frames: u64,
    /// Per-layer snapshot in paint order.
    pub layers: Vec<LayerStatus>,
    /// Layer currently being dragged by touch input.
    pub active_layer: Option<usize>,
    /// Latest host-state generation the render thread has acted on.
    pub generation: u64,
}

#[derive(Debug)]
pub(crate) struct Shared {
    host: Mutex<HostState>,
    host_changed: Condvar,
    status: Mutex<ManagerStatus>,
    status_changed: Condvar,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    pub(crate) fn new(status: ManagerStatus) -> Self {
        Self {
            host: Mutex::new(HostState {
                window: None,
                size: IntSize::default(),
                run: true,
                generation: 0,
            }),
            host_changed: Condvar::new(),
            status: Mutex::new(status),
            status_changed: Condvar::new(),
        }
    }

    // -- Host side --

    /// Applies `f` to the host state, bumps the generation and wakes the
    /// render thread. Returns what `f` returned and the new generation.
    pub(crate) fn update_host<R>(&self, f: impl FnOnce(&mut HostState) -> R) -> (R, u64) {
        let mut host = lock(&self.host);
        let r = f(&mut host);
        host.generation += 1;
        let generation = host.generation;
        drop(host);
        self.host_changed.notify_all();
        (r, generation)
    }

    pub(crate) fn status(&self) -> ManagerStatus {
        lock(&self.status).clone()
    }

    pub(crate) fn state(&self) -> RenderState {
        lock(&self.status).state
    }

    /// Blocks until `pred` holds for the published status, or `timeout`
    /// elapses (`None` waits indefinitely).
    pub(crate) fn wait_status(
        &self,
        timeout: Option<Duration>,
        mut pred: impl FnMut(&ManagerStatus) -> bool,
    ) -> Option<ManagerStatus> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut status = lock(&self.status);
        loop {
            if pred(&status) {
                return Some(status.clone());
            }
            status = match deadline {
                None => self
                    .status_changed
                    .wait(status)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let left = deadline.checked_duration_since(Instant::now())?;
                    self.status_changed
                        .wait_timeout(status, left)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    // -- Render side --

    pub(crate) fn snapshot(&self) -> HostState {
        *lock(&self.host)
    }

    /// Waits until the host state moves past `seen` generation, shutdown is
    /// requested, or `timeout` elapses.
    pub(crate) fn wait_for_host(&self, seen: u64, timeout: Duration) {
        let host = lock(&self.host);
        let _ = self
            .host_changed
            .wait_timeout_while(host, timeout, |h| h.run && h.generation == seen)
            .unwrap_or_else(PoisonError::into_inner);
    }

    pub(crate) fn publish(&self, f: impl FnOnce(&mut ManagerStatus)) {
        let mut status = lock(&self.status);
        f(&mut status);
        drop(status);
        self.status_changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn host_updates_bump_the_generation() {
        let shared = Shared::new(ManagerStatus::default());
        let ((), g1) = shared.update_host(|h| h.size = IntSize::new(1, 1));
        let ((), g2) = shared.update_host(|h| h.window = NativeWindow::from_raw(5));
        assert_eq!((g1, g2), (1, 2));
        let snap = shared.snapshot();
        assert_eq!(snap.size, IntSize::new(1, 1));
        assert_eq!(snap.window, NativeWindow::from_raw(5));
    }

    #[test]
    fn host_wait_wakes_on_update() {
        let shared = Arc::new(Shared::new(ManagerStatus::default()));
        let waiter = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let start = Instant::now();
                shared.wait_for_host(0, Duration::from_secs(10));
                start.elapsed()
            })
        };
        thread::sleep(Duration::from_millis(20));
        shared.update_host(|h| h.run = false);
        assert!(waiter.join().unwrap() < Duration::from_secs(10));
    }

    #[test]
    fn state_reads_the_published_status() {
        let shared = Shared::new(ManagerStatus::default());
        assert_eq!(shared.state(), RenderState::Stopped);
        shared.publish(|s| s.state = RenderState::Running);
        assert_eq!(shared.state(), RenderState::Running);
    }

    #[test]
    fn status_wait_times_out() {
        let shared = Shared::new(ManagerStatus::default());
        let got = shared.wait_status(Some(Duration::from_millis(10)), |s| s.frames > 0);
        assert!(got.is_none());
        shared.publish(|s| s.frames = 3);
        let got = shared.wait_status(Some(Duration::from_millis(10)), |s| s.frames > 0);
        assert_eq!(got.map(|s| s.frames), Some(3));
    }
}
