// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Touch / pointer routing to layers.

use kurbo::Point;

use crate::geometry::IntPoint;

/// Phase of a touch gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchKind {
    /// Finger or button went down.
    Down,
    /// Pointer moved while down.
    Move,
    /// Finger or button released.
    Up,
}

/// A touch event in window-local pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    /// Gesture phase.
    pub kind: TouchKind,
    /// Window-local position.
    pub position: Point,
}

impl TouchEvent {
    /// Creates an event.
    #[inline]
    #[must_use]
    pub const fn new(kind: TouchKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
        }
    }

    /// A [`TouchKind::Down`] event.
    #[inline]
    #[must_use]
    pub const fn down(x: f64, y: f64) -> Self {
        Self::new(TouchKind::Down, x, y)
    }

    /// A [`TouchKind::Move`] event.
    #[inline]
    #[must_use]
    pub const fn moved(x: f64, y: f64) -> Self {
        Self::new(TouchKind::Move, x, y)
    }

    /// A [`TouchKind::Up`] event.
    #[inline]
    #[must_use]
    pub const fn up(x: f64, y: f64) -> Self {
        Self::new(TouchKind::Up, x, y)
    }
}

/// Which layer is being dragged, and from where.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TouchRouter {
    active: Option<usize>,
    last: IntPoint,
}

/// A drag step for the active layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Drag {
    pub(crate) index: usize,
    pub(crate) dx: i32,
    pub(crate) dy: i32,
}

impl TouchRouter {
    pub(crate) const fn new() -> Self {
        Self {
            active: None,
            last: IntPoint::ZERO,
        }
    }

    /// Feeds one event through the router.
    ///
    /// `hit_test` is consulted on [`TouchKind::Down`] and must return the
    /// topmost layer under the point. Returns the translation to apply on
    /// [`TouchKind::Move`] while a layer is active.
    pub(crate) fn route(
        &mut self,
        event: TouchEvent,
        hit_test: impl FnOnce(Point) -> Option<usize>,
    ) -> Option<Drag> {
        let pos = IntPoint::from_point_trunc(event.position);
        match event.kind {
            TouchKind::Down => {
                self.active = hit_test(event.position);
                self.last = pos;
                log::debug!("touch down at {pos:?}: active layer {:?}", self.active);
                None
            }
            TouchKind::Move => {
                let index = self.active?;
                let drag = Drag {
                    index,
                    dx: pos.x.saturating_sub(self.last.x),
                    dy: pos.y.saturating_sub(self.last.y),
                };
                self.last = pos;
                log::debug!("touch move: layer {index} by ({}, {})", drag.dx, drag.dy);
                Some(drag)
            }
            TouchKind::Up => {
                if let Some(index) = self.active.take() {
                    log::debug!("touch up: layer {index} released");
                }
                None
            }
        }
    }

    /// The layer currently being dragged.
    pub(crate) const fn active(&self) -> Option<usize> {
        self.active
    }

    /// Forgets the active layer if it is `index`.
    pub(crate) fn release_index(&mut self, index: usize) {
        if self.active == Some(index) {
            self.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn down_selects_what_the_hit_test_returns() {
        let mut r = TouchRouter::default();
        assert_eq!(r.route(TouchEvent::down(60.0, 60.0), |_| Some(1)), None);
        assert_eq!(r.active(), Some(1));
        assert_eq!(r.route(TouchEvent::down(0.0, 0.0), |_| None), None);
        assert_eq!(r.active(), None);
    }

    #[test]
    fn move_yields_integer_deltas() {
        let mut r = TouchRouter::default();
        r.route(TouchEvent::down(60.5, 60.9), |_| Some(0));
        let d = r.route(TouchEvent::moved(70.2, 80.0), |_| unreachable!());
        assert_eq!(
            d,
            Some(Drag {
                index: 0,
                dx: 10,
                dy: 20
            })
        );
        let d = r.route(TouchEvent::moved(69.0, 80.0), |_| unreachable!());
        assert_eq!(
            d,
            Some(Drag {
                index: 0,
                dx: -1,
                dy: 0
            })
        );
    }

    #[test]
    fn extreme_moves_saturate() {
        let mut r = TouchRouter::default();
        r.route(TouchEvent::down(-1e12, -1e12), |_| Some(0));
        let d = r.route(TouchEvent::moved(1e12, 1e12), |_| unreachable!());
        assert_eq!(
            d,
            Some(Drag {
                index: 0,
                dx: i32::MAX,
                dy: i32::MAX
            })
        );
        let d = r.route(TouchEvent::moved(-1e12, 0.0), |_| unreachable!());
        assert_eq!(d.map(|d| (d.dx, d.dy)), Some((i32::MIN, -i32::MAX)));
    }

    #[test]
    fn up_ends_the_drag() {
        let mut r = TouchRouter::default();
        r.route(TouchEvent::down(1.0, 1.0), |_| Some(2));
        r.route(TouchEvent::up(1.0, 1.0), |_| unreachable!());
        assert_eq!(r.active(), None);
        assert_eq!(r.route(TouchEvent::moved(9.0, 9.0), |_| unreachable!()), None);
    }

    #[test]
    fn releasing_another_index_keeps_the_drag() {
        let mut r = TouchRouter::default();
        r.route(TouchEvent::down(1.0, 1.0), |_| Some(2));
        r.release_index(1);
        assert_eq!(r.active(), Some(2));
        r.release_index(2);
        assert_eq!(r.active(), None);
    }
}
