// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-thread lifecycle states.
//!
//! ```text
//!            launch            handle present
//! Stopped ──────────► Paused ◄───────────────► Running
//!                        │      handle absent     │
//!                        └──────────┬─────────────┘
//!                                   ▼
//!                              Terminated
//! ```
//!
//! Only the window-handle transitions are decided here; `Terminated` is
//! entered by the render loop on shutdown or on a fatal error.

/// Where the render thread is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderState {
    /// Constructed, render thread not launched.
    #[default]
    Stopped,
    /// Render thread alive with a context but no window surface.
    Paused,
    /// A window surface is bound and frames are being composited.
    Running,
    /// The render loop has exited, either on shutdown or after a fatal
    /// error. Final.
    Terminated,
}

impl RenderState {
    /// Whether the loop has exited.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// What the render loop must do about its window surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Keep the current state.
    Stay,
    /// Create the surface and move to [`RenderState::Running`].
    Resume,
    /// Destroy the surface and move to [`RenderState::Paused`].
    Suspend,
}

/// Decides the surface transition for `state` given whether the host
/// currently supplies a window handle and whether it differs from the one
/// the surface was built for.
#[must_use]
pub const fn on_window(state: RenderState, present: bool, changed: bool) -> Transition {
    match state {
        RenderState::Paused if present => Transition::Resume,
        RenderState::Running if !present || changed => Transition::Suspend,
        _ => Transition::Stay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_resumes_only_with_a_handle() {
        assert_eq!(on_window(RenderState::Paused, true, false), Transition::Resume);
        assert_eq!(on_window(RenderState::Paused, false, false), Transition::Stay);
    }

    #[test]
    fn running_suspends_when_the_handle_goes_or_changes() {
        assert_eq!(on_window(RenderState::Running, false, false), Transition::Suspend);
        assert_eq!(on_window(RenderState::Running, true, true), Transition::Suspend);
        assert_eq!(on_window(RenderState::Running, true, false), Transition::Stay);
    }

    #[test]
    fn other_states_never_move() {
        for state in [RenderState::Stopped, RenderState::Terminated] {
            for present in [false, true] {
                assert_eq!(on_window(state, present, present), Transition::Stay);
            }
        }
        assert!(RenderState::Terminated.is_terminal());
        assert!(!RenderState::Paused.is_terminal());
    }

    #[test]
    fn any_handle_sequence_alternates_paused_and_running() {
        // start/stop/start(other)/stop over a tiny state walk
        let mut state = RenderState::Paused;
        let mut bound: Option<u8> = None;
        let mut seen = Vec::new();
        for handle in [None, Some(1), Some(1), None, None, Some(2), Some(3), None] {
            loop {
                let changed = matches!((bound, handle), (Some(a), Some(b)) if a != b);
                match on_window(state, handle.is_some(), changed) {
                    Transition::Stay => break,
                    Transition::Resume => {
                        bound = handle;
                        seen.push((state, RenderState::Running));
                        state = RenderState::Running;
                    }
                    Transition::Suspend => {
                        bound = None;
                        seen.push((state, RenderState::Paused));
                        state = RenderState::Paused;
                    }
                }
            }
        }
        assert!(seen.iter().all(|t| matches!(
            t,
            (RenderState::Paused, RenderState::Running) | (RenderState::Running, RenderState::Paused)
        )));
        assert_eq!(seen.len(), 6);
    }
}
