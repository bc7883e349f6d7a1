// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ordered, bounded collection of layers owned by the render thread.

use kurbo::Point;

use super::offscreen::Layer;
use super::touch::{TouchEvent, TouchKind, TouchRouter};
use crate::compositor::Compositor;
use crate::content::{LayerContent, LayerFrame, destroy_with_content};
use crate::error::{Error, Result};
use crate::geometry::{IntPoint, IntSize};
use crate::gpu::Gpu;
use crate::transform::Transform3d;

/// Upper bound on the number of layers one manager composites.
pub const MAX_LAYERS: usize = 8;

/// Where a layer goes on the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayerPlacement {
    /// Window-pixel origin of the layer's top-left corner.
    pub origin: IntPoint,
    /// Fixed size, or `None` for the window size at creation time.
    pub size: Option<IntSize>,
}

impl LayerPlacement {
    /// A placement with a fixed size.
    #[must_use]
    pub const fn fixed(origin: IntPoint, size: IntSize) -> Self {
        Self {
            origin,
            size: Some(size),
        }
    }

    /// A placement that takes the window size when created.
    #[must_use]
    pub const fn window_sized(origin: IntPoint) -> Self {
        Self { origin, size: None }
    }
}

/// Snapshot of one layer, published with the manager status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerStatus {
    /// Current on-screen origin.
    pub origin: IntPoint,
    /// Framebuffer size (zero until first created).
    pub size: IntSize,
    /// Whether the layer's GPU objects exist.
    pub created: bool,
    /// How many times the GPU objects have been successfully created.
    pub create_count: u32,
}

struct Slot {
    placement: LayerPlacement,
    layer: Layer,
    content: Box<dyn LayerContent>,
    create_count: u32,
}

impl Slot {
    fn new(placement: LayerPlacement, content: Box<dyn LayerContent>) -> Self {
        Self {
            placement,
            layer: Layer::new(placement.origin),
            content,
            create_count: 0,
        }
    }
}

/// Layers in paint order, plus the touch routing state that moves them.
///
/// Index 0 is painted first (bottom); hit-testing scans from the last
/// index down.
pub struct LayerStack {
    slots: Vec<Slot>,
    router: TouchRouter,
}

impl core::fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayerStack")
            .field("layers", &self.slots.iter().map(|s| &s.layer).collect::<Vec<_>>())
            .field("router", &self.router)
            .finish()
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStack {
    /// An empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            router: TouchRouter::new(),
        }
    }

    /// Appends a layer on top of the existing ones.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the stack already holds [`MAX_LAYERS`].
    pub fn push(&mut self, placement: LayerPlacement, content: Box<dyn LayerContent>) -> Result<()> {
        if self.slots.len() >= MAX_LAYERS {
            return Err(Error::Config(format!(
                "at most {MAX_LAYERS} layers are supported"
            )));
        }
        self.slots.push(Slot::new(placement, content));
        Ok(())
    }

    /// Number of layers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no layers.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Borrows layer `index`.
    #[cfg(test)]
    pub(crate) fn layer(&self, index: usize) -> Option<&Layer> {
        self.slots.get(index).map(|s| &s.layer)
    }

    /// Swaps in new content for layer `index` before any GPU work has
    /// happened.
    ///
    /// # Errors
    ///
    /// [`Error::LayerIndex`] if `index` is out of range.
    pub fn set_content(&mut self, index: usize, content: Box<dyn LayerContent>) -> Result<()> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::LayerIndex { index, count })?;
        slot.content = content;
        Ok(())
    }

    /// Creates every layer that does not exist yet.
    ///
    /// Layers without a fixed size take `window`. Failures are logged and
    /// the layer is retried on the next call.
    pub fn ensure_created(&mut self, gpu: &mut dyn Gpu, window: IntSize) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.layer.is_created() {
                continue;
            }
            let size = slot.placement.size.unwrap_or(window);
            if size.is_empty() {
                continue;
            }
            match slot.layer.create(gpu, slot.placement.origin, size) {
                Ok(()) => slot.create_count += 1,
                Err(e) => log::warn!("layer {index}: {e}; retrying next frame"),
            }
        }
    }

    /// Renders each created layer's content into its framebuffer.
    pub fn draw_contents(&mut self, gpu: &mut dyn Gpu, compositor: &Compositor, frame_index: u64) {
        for slot in &mut self.slots {
            let size = slot.layer.size();
            let Some(mut scope) = slot.layer.draw_scope(gpu) else {
                continue;
            };
            let mut frame = LayerFrame {
                gpu: scope.gpu(),
                compositor,
                size,
                frame_index,
            };
            slot.content.draw(&mut frame);
        }
    }

    /// Draws every created layer onto the current target in paint order.
    ///
    /// The caller has set the viewport and cleared the target.
    pub fn composite(&self, gpu: &mut dyn Gpu, compositor: &Compositor, projection: &Transform3d) {
        compositor.begin(gpu, projection);
        for slot in &self.slots {
            let layer = &slot.layer;
            let (Some(texture), Some(coords), Some(uv)) =
                (layer.texture(), layer.coord_buffer(), layer.uv_buffer())
            else {
                continue;
            };
            compositor.draw_quad(gpu, texture, coords, uv, &layer.model_view_matrix());
        }
        compositor.end(gpu);
    }

    /// The topmost created layer containing `p`.
    #[must_use]
    pub fn hit_test(&self, p: Point) -> Option<usize> {
        self.slots
            .iter()
            .rposition(|s| s.layer.is_created() && s.layer.is_collision(p))
    }

    /// Routes a touch event: `Down` picks the topmost layer under the
    /// point, `Move` drags it, `Up` lets go.
    pub fn touch(&mut self, event: TouchEvent) {
        let hit = match event.kind {
            TouchKind::Down => self.hit_test(event.position),
            TouchKind::Move | TouchKind::Up => None,
        };
        let Some(drag) = self.router.route(event, |_| hit) else {
            return;
        };
        if let Some(slot) = self.slots.get_mut(drag.index) {
            let origin = slot.layer.position().offset(drag.dx, drag.dy);
            slot.layer.update_position(origin);
            slot.placement.origin = origin;
        }
    }

    /// The layer currently being dragged.
    #[must_use]
    pub fn active_layer(&self) -> Option<usize> {
        self.router.active()
    }

    /// Replaces layer `index` with a fresh one, releasing the old layer's
    /// GPU objects and content.
    ///
    /// # Errors
    ///
    /// [`Error::LayerIndex`] if `index` is out of range.
    pub fn replace(
        &mut self,
        gpu: &mut dyn Gpu,
        index: usize,
        placement: LayerPlacement,
        content: Box<dyn LayerContent>,
    ) -> Result<()> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::LayerIndex { index, count })?;
        destroy_with_content(gpu, &mut slot.layer, slot.content.as_mut());
        *slot = Slot::new(placement, content);
        self.router.release_index(index);
        log::info!("layer {index} replaced at {:?}", placement.origin);
        Ok(())
    }

    /// Releases every layer's GPU objects and content. Requires a current
    /// context.
    pub fn destroy_all(&mut self, gpu: &mut dyn Gpu) {
        for slot in &mut self.slots {
            destroy_with_content(gpu, &mut slot.layer, slot.content.as_mut());
        }
    }

    /// Forgets every GPU handle without GPU calls.
    pub fn abandon_all(&mut self) {
        for slot in &mut self.slots {
            slot.content.abandon();
            slot.layer.abandon();
        }
    }

    /// Per-layer snapshot in paint order.
    #[must_use]
    pub fn status(&self) -> Vec<LayerStatus> {
        self.slots
            .iter()
            .map(|s| LayerStatus {
                origin: s.layer.position(),
                size: s.layer.size(),
                created: s.layer.is_created(),
                create_count: s.create_count,
            })
            .collect()
    }
}
