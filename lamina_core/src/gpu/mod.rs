// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The GPU capability consumed by layers, shaders and the compositor.
//!
//! [`Gpu`] is the narrow slice of OpenGL / OpenGL ES that layer compositing
//! needs. `lamina_render` implements it over `glow`; tests implement it with
//! a recording mock so that allocation/free balance can be checked without a
//! driver.
//!
//! Every method must be called on the thread that holds the rendering
//! context current. The trait is object safe; the render loop works with
//! `&mut dyn Gpu`.

mod handle;

pub use handle::{
    AttribLocation, BufferId, FramebufferId, ProgramId, RenderbufferId, ShaderId, TextureId,
    UniformLocation,
};
pub(crate) use handle::raw_or_zero;

use crate::error::Result;
use crate::geometry::IntSize;
use crate::image::PixelFormat;
use crate::shader::ShaderStage;

/// `GL_FRAMEBUFFER_COMPLETE`.
pub const FRAMEBUFFER_COMPLETE: u32 = 0x8CD5;

/// An RGBA clear color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgba {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a color.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from 8-bit components.
    #[must_use]
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }
}

/// Texture coordinate wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wrap {
    /// `GL_CLAMP_TO_EDGE`.
    ClampToEdge,
    /// `GL_REPEAT`.
    Repeat,
}

/// Texture minification/magnification filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Filter {
    /// `GL_LINEAR`.
    Linear,
    /// `GL_NEAREST`.
    Nearest,
}

/// Sampling state applied to the bound texture before drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sampling {
    /// Wrap mode for both S and T.
    pub wrap: Wrap,
    /// Filter for both minification and magnification.
    pub filter: Filter,
}

impl Sampling {
    /// Edge-clamped bilinear sampling, used when compositing layers.
    pub const CLAMP_LINEAR: Self = Self {
        wrap: Wrap::ClampToEdge,
        filter: Filter::Linear,
    };
}

/// The GPU operations layer compositing is built from.
///
/// Allocation methods return [`Error::Allocation`](crate::Error::Allocation)
/// when the driver refuses a name. Binding and drawing methods cannot fail;
/// like their GL counterparts they record errors in driver state instead.
pub trait Gpu {
    // -- Textures --

    /// Generates a texture name.
    fn create_texture(&mut self) -> Result<TextureId>;

    /// Specifies level 0 of `texture`. `pixels = None` leaves the storage
    /// uninitialized. Leaves no texture bound.
    fn texture_image(
        &mut self,
        texture: TextureId,
        size: IntSize,
        format: PixelFormat,
        pixels: Option<&[u8]>,
    );

    /// Binds `texture` (or unbinds with `None`) on texture unit 0.
    fn bind_texture(&mut self, texture: Option<TextureId>);

    /// Applies `sampling` to the currently bound texture.
    fn set_sampling(&mut self, sampling: Sampling);

    /// Deletes a texture.
    fn delete_texture(&mut self, texture: TextureId);

    // -- Renderbuffers and framebuffers --

    /// Generates a renderbuffer with depth storage of `size`.
    fn create_depth_buffer(&mut self, size: IntSize) -> Result<RenderbufferId>;

    /// Deletes a renderbuffer.
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId);

    /// Generates a framebuffer name.
    fn create_framebuffer(&mut self) -> Result<FramebufferId>;

    /// Attaches `color` as color attachment 0 and `depth` as the depth
    /// attachment of `framebuffer`, then returns the completeness status
    /// (compare with [`FRAMEBUFFER_COMPLETE`]). Leaves the default
    /// framebuffer bound.
    fn attach_targets(
        &mut self,
        framebuffer: FramebufferId,
        color: TextureId,
        depth: RenderbufferId,
    ) -> u32;

    /// Binds `framebuffer` as the render target (`None` = window surface).
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    /// Deletes a framebuffer.
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    // -- Vertex data --

    /// Creates a static vertex buffer holding `data`.
    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<BufferId>;

    /// Deletes a vertex buffer.
    fn delete_buffer(&mut self, buffer: BufferId);

    // -- Programs --

    /// Compiles one shader stage. On failure the stage is deleted and the
    /// driver info log is returned in [`Error::ShaderCompile`](crate::Error::ShaderCompile).
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId>;

    /// Links a program from compiled stages. On failure the program is
    /// deleted and the info log is returned in
    /// [`Error::ShaderLink`](crate::Error::ShaderLink).
    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId>;

    /// Deletes a shader stage.
    fn delete_shader(&mut self, shader: ShaderId);

    /// Deletes a program.
    fn delete_program(&mut self, program: ProgramId);

    /// Looks up a vertex attribute; `None` if the program has no active
    /// attribute of that name.
    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation>;

    /// Looks up a uniform; `None` if the program has no active uniform of
    /// that name.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Makes `program` current (`None` = no program).
    fn use_program(&mut self, program: Option<ProgramId>);

    /// Uploads a column-major 4×4 matrix. `None` is silently ignored.
    fn uniform_matrix4(&mut self, location: Option<UniformLocation>, matrix: &[f32; 16]);

    /// Points a sampler uniform at a texture unit. `None` is silently ignored.
    fn uniform_sampler(&mut self, location: Option<UniformLocation>, unit: i32);

    // -- Drawing --

    /// Sets the viewport.
    fn viewport(&mut self, x: i32, y: i32, size: IntSize);

    /// Clears the color buffer (and depth buffer of the current target).
    fn clear(&mut self, color: Rgba);

    /// Enables a vertex attribute array.
    fn enable_attrib(&mut self, location: AttribLocation);

    /// Disables a vertex attribute array.
    fn disable_attrib(&mut self, location: AttribLocation);

    /// Sources attribute `location` from `buffer` as tightly packed
    /// `components`-wide `f32` vectors.
    fn attrib_buffer(&mut self, location: AttribLocation, buffer: BufferId, components: i32);

    /// Draws `count` vertices as a triangle strip.
    fn draw_triangle_strip(&mut self, count: i32);

    /// Flushes queued commands.
    fn flush(&mut self);
}
