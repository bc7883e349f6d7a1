// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Textured-quad drawing with the compositing program.
//!
//! [`Compositor`] is used twice per frame: by image content to draw into a
//! layer framebuffer, and by the render loop to draw every layer's color
//! texture onto the window surface.

use crate::error::Result;
use crate::gpu::{AttribLocation, BufferId, Gpu, Sampling, TextureId, UniformLocation};
use crate::shader::{
    ATTR_POINT, ATTR_UV, ShaderProgram, ShaderSources, UNIF_MV, UNIF_PROJ, UNIF_TEXTURE,
};
use crate::transform::Transform3d;

/// The compositing program plus its cached binding locations.
#[derive(Debug, Default)]
pub struct Compositor {
    program: ShaderProgram,
    attr_point: Option<AttribLocation>,
    attr_uv: Option<AttribLocation>,
    unif_proj: Option<UniformLocation>,
    unif_mv: Option<UniformLocation>,
    unif_texture: Option<UniformLocation>,
}

impl Compositor {
    /// A compositor whose program has not been built yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the program on first use and caches its locations.
    ///
    /// # Errors
    ///
    /// Propagates shader compile and link errors.
    pub fn ensure(&mut self, gpu: &mut dyn Gpu, sources: &ShaderSources) -> Result<()> {
        if self.program.is_created() {
            return Ok(());
        }
        self.program.create(gpu, sources)?;
        self.attr_point = self.program.attr_location(gpu, ATTR_POINT);
        self.attr_uv = self.program.attr_location(gpu, ATTR_UV);
        self.unif_proj = self.program.uniform_location(gpu, UNIF_PROJ);
        self.unif_mv = self.program.uniform_location(gpu, UNIF_MV);
        self.unif_texture = self.program.uniform_location(gpu, UNIF_TEXTURE);
        if self.attr_point.is_none() || self.attr_uv.is_none() {
            log::warn!("compositing program lacks {ATTR_POINT} or {ATTR_UV}; quads will not draw");
        }
        Ok(())
    }

    /// Whether the program is linked.
    #[inline]
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.program.is_created()
    }

    /// Makes the program current, uploads `projection`, points the sampler
    /// at unit 0 and enables the vertex attributes.
    ///
    /// The caller sets the viewport and clears the target.
    pub fn begin(&self, gpu: &mut dyn Gpu, projection: &Transform3d) {
        gpu.use_program(self.program.program());
        gpu.uniform_matrix4(self.unif_proj, &projection.to_gl());
        gpu.uniform_sampler(self.unif_texture, 0);
        for loc in [self.attr_point, self.attr_uv].into_iter().flatten() {
            gpu.enable_attrib(loc);
        }
    }

    /// Draws `texture` as a four-vertex triangle strip from `coords`/`uv`,
    /// placed by `model_view`, with edge-clamped linear sampling.
    pub fn draw_quad(
        &self,
        gpu: &mut dyn Gpu,
        texture: TextureId,
        coords: BufferId,
        uv: BufferId,
        model_view: &Transform3d,
    ) {
        gpu.bind_texture(Some(texture));
        gpu.set_sampling(Sampling::CLAMP_LINEAR);
        gpu.uniform_matrix4(self.unif_mv, &model_view.to_gl());
        if let Some(loc) = self.attr_point {
            gpu.attrib_buffer(loc, coords, 2);
        }
        if let Some(loc) = self.attr_uv {
            gpu.attrib_buffer(loc, uv, 2);
        }
        gpu.draw_triangle_strip(4);
    }

    /// Disables the attributes and unbinds texture and program.
    pub fn end(&self, gpu: &mut dyn Gpu) {
        for loc in [self.attr_point, self.attr_uv].into_iter().flatten() {
            gpu.disable_attrib(loc);
        }
        gpu.bind_texture(None);
        gpu.use_program(None);
    }

    /// Deletes the program.
    pub fn destroy(&mut self, gpu: &mut dyn Gpu) {
        self.program.destroy(gpu);
        self.forget_locations();
    }

    /// Forgets the program without GPU calls.
    pub fn abandon(&mut self) {
        self.program.abandon();
        self.forget_locations();
    }

    fn forget_locations(&mut self) {
        self.attr_point = None;
        self.attr_uv = None;
        self.unif_proj = None;
        self.unif_mv = None;
        self.unif_texture = None;
    }
}
