// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! OpenGL / OpenGL ES rendering for lamina via [`glow`].
//!
//! [`GlowGpu`] implements [`lamina_core::gpu::Gpu`] on top of a
//! [`glow::Context`]. It uses only entry points common to desktop OpenGL 2.1
//! (plus framebuffer objects) and OpenGL ES 2.0, so the same code serves
//! both the WGL and the EGL backends.
//!
//! # Safety
//!
//! A [`GlowGpu`] must only be used on the thread where its context is
//! current. The backends uphold this by creating it on the render thread
//! after the first successful make-current.

#![expect(unsafe_code, reason = "every OpenGL call goes through glow's unsafe API")]

use core::ffi::c_void;
use core::fmt;

use glow::HasContext;
use lamina_core::Error;
use lamina_core::Result;
use lamina_core::geometry::IntSize;
use lamina_core::gpu::{
    AttribLocation, BufferId, Filter, FramebufferId, Gpu, ProgramId, RenderbufferId, Rgba,
    Sampling, ShaderId, TextureId, UniformLocation, Wrap,
};
use lamina_core::image::PixelFormat;
use lamina_core::shader::ShaderStage;

/// `(internal format, format)` for a pixel layout.
const fn gl_format(format: PixelFormat) -> (u32, u32) {
    match format {
        PixelFormat::Alpha => (glow::ALPHA, glow::ALPHA),
        PixelFormat::Rgb => (glow::RGB, glow::RGB),
        PixelFormat::Rgba => (glow::RGBA, glow::RGBA),
    }
}

const fn gl_wrap(wrap: Wrap) -> i32 {
    match wrap {
        Wrap::ClampToEdge => glow::CLAMP_TO_EDGE.cast_signed(),
        Wrap::Repeat => glow::REPEAT.cast_signed(),
    }
}

const fn gl_filter(filter: Filter) -> i32 {
    match filter {
        Filter::Linear => glow::LINEAR.cast_signed(),
        Filter::Nearest => glow::NEAREST.cast_signed(),
    }
}

const fn gl_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn allocation(object: &'static str) -> impl FnOnce(String) -> Error {
    move |message| Error::Allocation { object, message }
}

/// The lamina [`Gpu`] capability over a current OpenGL or OpenGL ES
/// context.
pub struct GlowGpu {
    gl: glow::Context,
}

impl fmt::Debug for GlowGpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowGpu")
            .field("version", self.gl.version())
            .finish_non_exhaustive()
    }
}

impl GlowGpu {
    /// Wraps an existing glow context.
    #[must_use]
    pub fn new(gl: glow::Context) -> Self {
        let v = gl.version();
        log::info!(
            "GL{} {}.{} ({})",
            if v.is_embedded { " ES" } else { "" },
            v.major,
            v.minor,
            v.vendor_info
        );
        Self { gl }
    }

    /// Loads GL entry points through `loader` and wraps the result.
    ///
    /// # Safety
    ///
    /// The context the entry points belong to must be current on the
    /// calling thread, and `loader` must return valid function pointers (or
    /// null) for the requested names.
    pub unsafe fn from_loader(loader: impl FnMut(&str) -> *const c_void) -> Self {
        // SAFETY: forwarded to the caller.
        let gl = unsafe { glow::Context::from_loader_function(loader) };
        Self::new(gl)
    }

    /// The underlying glow context.
    #[must_use]
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

// SAFETY (all blocks below): `GlowGpu` is only reachable from the render
// thread while its context is current, and every handle passed in was
// produced by this same context.
impl Gpu for GlowGpu {
    // -- Textures --

    fn create_texture(&mut self) -> Result<TextureId> {
        let tex = unsafe { self.gl.create_texture() }.map_err(allocation("texture"))?;
        Ok(TextureId(tex.0))
    }

    fn texture_image(
        &mut self,
        texture: TextureId,
        size: IntSize,
        format: PixelFormat,
        pixels: Option<&[u8]>,
    ) {
        let (internal, fmt) = gl_format(format);
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, Some(glow::NativeTexture(texture.0)));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal.cast_signed(),
                size.width_i32(),
                size.height_i32(),
                0,
                fmt,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0);
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.0)));
        }
    }

    fn set_sampling(&mut self, sampling: Sampling) {
        let wrap = gl_wrap(sampling.wrap);
        let filter = gl_filter(sampling.filter);
        unsafe {
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) };
    }

    // -- Renderbuffers and framebuffers --

    fn create_depth_buffer(&mut self, size: IntSize) -> Result<RenderbufferId> {
        let rb = unsafe { self.gl.create_renderbuffer() }.map_err(allocation("renderbuffer"))?;
        unsafe {
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(rb));
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH_COMPONENT16,
                size.width_i32(),
                size.height_i32(),
            );
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
        }
        Ok(RenderbufferId(rb.0))
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        unsafe {
            self.gl
                .delete_renderbuffer(glow::NativeRenderbuffer(renderbuffer.0));
        }
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        let fb = unsafe { self.gl.create_framebuffer() }.map_err(allocation("framebuffer"))?;
        Ok(FramebufferId(fb.0))
    }

    fn attach_targets(
        &mut self,
        framebuffer: FramebufferId,
        color: TextureId,
        depth: RenderbufferId,
    ) -> u32 {
        unsafe {
            self.gl.bind_framebuffer(
                glow::FRAMEBUFFER,
                Some(glow::NativeFramebuffer(framebuffer.0)),
            );
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(glow::NativeTexture(color.0)),
                0,
            );
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(glow::NativeRenderbuffer(depth.0)),
            );
            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            status
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        unsafe {
            self.gl.bind_framebuffer(
                glow::FRAMEBUFFER,
                framebuffer.map(|f| glow::NativeFramebuffer(f.0)),
            );
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        unsafe {
            self.gl
                .delete_framebuffer(glow::NativeFramebuffer(framebuffer.0));
        }
    }

    // -- Vertex data --

    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<BufferId> {
        let buffer = unsafe { self.gl.create_buffer() }.map_err(allocation("buffer"))?;
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
        Ok(BufferId(buffer.0))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) };
    }

    // -- Programs --

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId> {
        let shader = unsafe { self.gl.create_shader(gl_stage(stage)) }
            .map_err(allocation("shader"))?;
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                log::error!("{stage} shader compile failed: {log}");
                return Err(Error::ShaderCompile { stage, log });
            }
        }
        Ok(ShaderId(shader.0))
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId> {
        let program = unsafe { self.gl.create_program() }.map_err(allocation("program"))?;
        let vs = glow::NativeShader(vertex.0);
        let fs = glow::NativeShader(fragment.0);
        unsafe {
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                log::error!("program link failed: {log}");
                return Err(Error::ShaderLink { log });
            }
        }
        Ok(ProgramId(program.0))
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.0)) };
    }

    fn delete_program(&mut self, program: ProgramId) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) };
    }

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        unsafe {
            self.gl
                .get_attrib_location(glow::NativeProgram(program.0), name)
        }
        .map(AttribLocation)
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
        }
        .map(|loc| UniformLocation(loc.0))
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        unsafe {
            self.gl
                .use_program(program.map(|p| glow::NativeProgram(p.0)));
        }
    }

    fn uniform_matrix4(&mut self, location: Option<UniformLocation>, matrix: &[f32; 16]) {
        let Some(loc) = location.map(|l| glow::NativeUniformLocation(l.0)) else {
            return;
        };
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&loc), false, matrix);
        }
    }

    fn uniform_sampler(&mut self, location: Option<UniformLocation>, unit: i32) {
        let Some(loc) = location.map(|l| glow::NativeUniformLocation(l.0)) else {
            return;
        };
        unsafe { self.gl.uniform_1_i32(Some(&loc), unit) };
    }

    // -- Drawing --

    fn viewport(&mut self, x: i32, y: i32, size: IntSize) {
        unsafe {
            self.gl
                .viewport(x, y, size.width_i32(), size.height_i32());
        }
    }

    fn clear(&mut self, color: Rgba) {
        unsafe {
            self.gl.clear_color(color.r, color.g, color.b, color.a);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn enable_attrib(&mut self, location: AttribLocation) {
        unsafe { self.gl.enable_vertex_attrib_array(location.0) };
    }

    fn disable_attrib(&mut self, location: AttribLocation) {
        unsafe { self.gl.disable_vertex_attrib_array(location.0) };
    }

    fn attrib_buffer(&mut self, location: AttribLocation, buffer: BufferId, components: i32) {
        unsafe {
            self.gl
                .bind_buffer(glow::ARRAY_BUFFER, Some(glow::NativeBuffer(buffer.0)));
            self.gl
                .vertex_attrib_pointer_f32(location.0, components, glow::FLOAT, false, 0, 0);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn draw_triangle_strip(&mut self, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLE_STRIP, 0, count) };
    }

    fn flush(&mut self) {
        unsafe { self.gl.flush() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_formats_are_unsized() {
        assert_eq!(gl_format(PixelFormat::Rgba), (glow::RGBA, glow::RGBA));
        assert_eq!(gl_format(PixelFormat::Rgb), (glow::RGB, glow::RGB));
        assert_eq!(gl_format(PixelFormat::Alpha), (glow::ALPHA, glow::ALPHA));
    }

    #[test]
    fn compositing_sampling_maps_to_clamp_linear() {
        let s = Sampling::CLAMP_LINEAR;
        assert_eq!(gl_wrap(s.wrap), 0x812F);
        assert_eq!(gl_filter(s.filter), 0x2601);
    }

    #[test]
    fn stages_map_to_shader_types() {
        assert_eq!(gl_stage(ShaderStage::Vertex), 0x8B31);
        assert_eq!(gl_stage(ShaderStage::Fragment), 0x8B30);
    }

    #[test]
    fn framebuffer_complete_matches_gl() {
        assert_eq!(lamina_core::gpu::FRAMEBUFFER_COMPLETE, glow::FRAMEBUFFER_COMPLETE);
    }
}
