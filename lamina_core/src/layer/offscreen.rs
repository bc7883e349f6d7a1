// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One layer's framebuffer object and quad geometry.

use kurbo::{Point, Rect};

use crate::error::{Error, Result};
use crate::geometry::{IntPoint, IntSize, contains_inclusive, draw_area};
use crate::gpu::{
    BufferId, FRAMEBUFFER_COMPLETE, FramebufferId, Gpu, RenderbufferId, TextureId, raw_or_zero,
};
use crate::image::PixelFormat;
use crate::transform::Transform3d;

/// UVs for a four-vertex triangle strip covering the whole texture.
pub(crate) const QUAD_UV: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];

/// Positions for a four-vertex triangle strip spanning `[0, size]`.
#[expect(
    clippy::cast_precision_loss,
    reason = "layer dimensions are far below f32's exact integer range"
)]
pub(crate) fn quad_coords(size: IntSize) -> [f32; 8] {
    let w = size.width as f32;
    let h = size.height as f32;
    [0.0, 0.0, w, 0.0, 0.0, h, w, h]
}

/// An off-screen render target placed on the window.
///
/// All GPU handles are created together by [`create`](Self::create) and
/// released together by [`destroy`](Self::destroy); a failed `create`
/// leaves nothing allocated. [`is_created`](Self::is_created) is true
/// exactly when the framebuffer handle is present.
#[derive(Debug, Default)]
pub struct Layer {
    origin: IntPoint,
    size: IntSize,
    framebuffer: Option<FramebufferId>,
    color: Option<TextureId>,
    depth: Option<RenderbufferId>,
    coords: Option<BufferId>,
    uv: Option<BufferId>,
}

impl Layer {
    /// A layer at `origin` with no GPU objects yet.
    #[must_use]
    pub fn new(origin: IntPoint) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }

    /// Allocates the color texture, depth renderbuffer, framebuffer and
    /// quad vertex buffers for a `size` layer placed at `origin`.
    ///
    /// A layer that is already created is left untouched.
    ///
    /// # Errors
    ///
    /// [`Error::FramebufferIncomplete`] if the framebuffer does not pass
    /// the completeness check, or [`Error::Allocation`] if the driver
    /// refuses a name. Either way every handle created so far is released
    /// and the layer stays not-created.
    pub fn create(&mut self, gpu: &mut dyn Gpu, origin: IntPoint, size: IntSize) -> Result<()> {
        if self.is_created() {
            return Ok(());
        }
        self.origin = origin;
        self.size = size;
        if let Err(e) = self.allocate(gpu) {
            log::warn!(
                "layer {:?} {:?}: create failed ({e}); fbo={} color={} depth={}",
                self.origin,
                self.size,
                raw_or_zero(self.framebuffer, FramebufferId::get),
                raw_or_zero(self.color, TextureId::get),
                raw_or_zero(self.depth, RenderbufferId::get),
            );
            self.release(gpu);
            return Err(e);
        }
        log::info!(
            "layer {:?} {:?} created: fbo={} color={} depth={} vbo=({}, {})",
            self.origin,
            self.size,
            raw_or_zero(self.framebuffer, FramebufferId::get),
            raw_or_zero(self.color, TextureId::get),
            raw_or_zero(self.depth, RenderbufferId::get),
            raw_or_zero(self.coords, BufferId::get),
            raw_or_zero(self.uv, BufferId::get),
        );
        Ok(())
    }

    fn allocate(&mut self, gpu: &mut dyn Gpu) -> Result<()> {
        let color = gpu.create_texture()?;
        self.color = Some(color);
        gpu.texture_image(color, self.size, PixelFormat::Rgba, None);

        let depth = gpu.create_depth_buffer(self.size)?;
        self.depth = Some(depth);

        let framebuffer = gpu.create_framebuffer()?;
        self.framebuffer = Some(framebuffer);
        let status = gpu.attach_targets(framebuffer, color, depth);
        if status != FRAMEBUFFER_COMPLETE {
            return Err(Error::FramebufferIncomplete { status });
        }

        self.coords = Some(gpu.create_vertex_buffer(&quad_coords(self.size))?);
        self.uv = Some(gpu.create_vertex_buffer(&QUAD_UV)?);
        Ok(())
    }

    /// Deletes whichever handles are present.
    fn release(&mut self, gpu: &mut dyn Gpu) {
        if let Some(b) = self.uv.take() {
            gpu.delete_buffer(b);
        }
        if let Some(b) = self.coords.take() {
            gpu.delete_buffer(b);
        }
        if let Some(fb) = self.framebuffer.take() {
            gpu.delete_framebuffer(fb);
        }
        if let Some(rb) = self.depth.take() {
            gpu.delete_renderbuffer(rb);
        }
        if let Some(tex) = self.color.take() {
            gpu.delete_texture(tex);
        }
    }

    /// Whether the GPU objects exist.
    #[inline]
    #[must_use]
    pub const fn is_created(&self) -> bool {
        self.framebuffer.is_some()
    }

    /// Releases every GPU object. A layer that is not created is left
    /// as is.
    pub fn destroy(&mut self, gpu: &mut dyn Gpu) {
        if !self.is_created() {
            return;
        }
        log::info!(
            "layer {:?} destroyed: fbo={}",
            self.origin,
            raw_or_zero(self.framebuffer, FramebufferId::get)
        );
        self.release(gpu);
    }

    /// Forgets every GPU handle without issuing GPU calls.
    ///
    /// Used when the owning context is torn down while no surface is bound;
    /// the objects die with the context.
    pub fn abandon(&mut self) {
        if self.is_created() {
            log::info!(
                "layer {:?} abandoned: fbo={}",
                self.origin,
                raw_or_zero(self.framebuffer, FramebufferId::get)
            );
        }
        self.framebuffer = None;
        self.color = None;
        self.depth = None;
        self.coords = None;
        self.uv = None;
    }

    /// Binds the layer framebuffer as render target and sets the viewport
    /// to the layer size. Returns `false` (and does nothing) when the layer
    /// is not created.
    pub fn begin_draw(&self, gpu: &mut dyn Gpu) -> bool {
        let Some(fb) = self.framebuffer else {
            return false;
        };
        gpu.bind_framebuffer(Some(fb));
        gpu.viewport(0, 0, self.size);
        true
    }

    /// Restores the window surface as render target.
    pub fn end_draw(&self, gpu: &mut dyn Gpu) {
        gpu.bind_framebuffer(None);
    }

    /// Begins drawing into this layer, returning a guard that ends the draw
    /// when dropped. `None` when the layer is not created.
    pub fn draw_scope<'a>(&self, gpu: &'a mut dyn Gpu) -> Option<DrawScope<'a>> {
        if self.begin_draw(gpu) {
            Some(DrawScope { gpu })
        } else {
            None
        }
    }

    /// Moves the layer on screen. The framebuffer is not touched.
    #[inline]
    pub fn update_position(&mut self, origin: IntPoint) {
        self.origin = origin;
    }

    /// Current on-screen origin.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> IntPoint {
        self.origin
    }

    /// Framebuffer size (zero until created).
    #[inline]
    #[must_use]
    pub const fn size(&self) -> IntSize {
        self.size
    }

    /// The window rectangle this layer covers.
    #[must_use]
    pub fn calc_draw_area(&self) -> Rect {
        draw_area(self.origin, self.size)
    }

    /// Whether `p` lies inside the layer, edges included.
    #[must_use]
    pub fn is_collision(&self, p: Point) -> bool {
        contains_inclusive(self.calc_draw_area(), p)
    }

    /// Translation from layer-local coordinates to window coordinates.
    #[must_use]
    pub fn model_view_matrix(&self) -> Transform3d {
        Transform3d::from_translation(f64::from(self.origin.x), f64::from(self.origin.y), 0.0)
    }

    /// The color attachment, sampled when compositing.
    #[inline]
    #[must_use]
    pub const fn texture(&self) -> Option<TextureId> {
        self.color
    }

    /// Quad positions.
    #[inline]
    #[must_use]
    pub const fn coord_buffer(&self) -> Option<BufferId> {
        self.coords
    }

    /// Quad texture coordinates.
    #[inline]
    #[must_use]
    pub const fn uv_buffer(&self) -> Option<BufferId> {
        self.uv
    }
}

/// Draw guard returned by [`Layer::draw_scope`].
///
/// While alive, GPU calls made through [`gpu`](Self::gpu) land in the layer
/// framebuffer. Dropping it rebinds the window surface.
pub struct DrawScope<'a> {
    gpu: &'a mut dyn Gpu,
}

impl DrawScope<'_> {
    /// The GPU, with the layer framebuffer bound.
    pub fn gpu(&mut self) -> &mut dyn Gpu {
        self.gpu
    }
}

impl core::fmt::Debug for DrawScope<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DrawScope").finish_non_exhaustive()
    }
}

impl Drop for DrawScope<'_> {
    fn drop(&mut self) {
        self.gpu.bind_framebuffer(None);
    }
}
