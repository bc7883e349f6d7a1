// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What gets rendered into each layer.
//!
//! A [`LayerContent`] draws into its layer's framebuffer once per frame. The
//! framebuffer is already bound and the viewport set to the layer size when
//! [`draw`](LayerContent::draw) runs.
//!
//! Built-in contents:
//!
//! - [`ColorRamp`]: a clear color whose chosen channel climbs by a step
//!   every frame and wraps back to zero after 255.
//! - [`SolidColor`]: a constant clear color.
//! - [`ImageContent`]: a decoded [`ImageBuffer`] drawn at an offset.

use serde::{Deserialize, Serialize};

use crate::compositor::Compositor;
use crate::error::Result;
use crate::geometry::{IntPoint, IntSize};
use crate::gpu::{BufferId, Gpu, Rgba, TextureId};
use crate::image::ImageBuffer;
use crate::layer::{Layer, QUAD_UV, quad_coords};
use crate::transform::Transform3d;

/// Per-frame drawing context handed to [`LayerContent::draw`].
pub struct LayerFrame<'a> {
    /// The GPU, with the layer framebuffer bound.
    pub gpu: &'a mut dyn Gpu,
    /// The shared compositing program, for textured quads.
    pub compositor: &'a Compositor,
    /// Layer framebuffer size.
    pub size: IntSize,
    /// Number of frames presented before this one.
    pub frame_index: u64,
}

impl core::fmt::Debug for LayerFrame<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayerFrame")
            .field("size", &self.size)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

/// Content rendered into a layer every frame.
///
/// Contents are built on the host thread and then moved to the render
/// thread, hence the `Send` bound. GPU objects a content creates belong to
/// the render thread's context.
pub trait LayerContent: Send {
    /// Renders one frame into the bound layer framebuffer.
    fn draw(&mut self, frame: &mut LayerFrame<'_>);

    /// Releases GPU objects created by [`draw`](Self::draw). Called with
    /// the context current, before the layer itself is destroyed.
    fn release(&mut self, gpu: &mut dyn Gpu) {
        let _ = gpu;
    }

    /// Forgets GPU objects without GPU calls.
    fn abandon(&mut self) {}
}

/// A color channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Red.
    Red,
    /// Green.
    Green,
    /// Blue.
    Blue,
}

/// Clears the layer with one channel ramping upwards each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorRamp {
    channel: Channel,
    step: u8,
    value: u8,
}

impl ColorRamp {
    /// A ramp on `channel` that starts at zero and climbs by `step`.
    #[must_use]
    pub const fn new(channel: Channel, step: u8) -> Self {
        Self {
            channel,
            step,
            value: 0,
        }
    }

    /// The channel value the next frame will clear with.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// The clear color for the current value, then advances the ramp.
    fn next_color(&mut self) -> Rgba {
        let v = self.value;
        let color = match self.channel {
            Channel::Red => Rgba::from_u8(v, 0, 0, 255),
            Channel::Green => Rgba::from_u8(0, v, 0, 255),
            Channel::Blue => Rgba::from_u8(0, 0, v, 255),
        };
        let next = u16::from(v) + u16::from(self.step);
        self.value = u8::try_from(next).unwrap_or(0);
        color
    }
}

impl LayerContent for ColorRamp {
    fn draw(&mut self, frame: &mut LayerFrame<'_>) {
        let color = self.next_color();
        frame.gpu.clear(color);
    }
}

/// Clears the layer with a fixed color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidColor(pub Rgba);

impl LayerContent for SolidColor {
    fn draw(&mut self, frame: &mut LayerFrame<'_>) {
        frame.gpu.clear(self.0);
    }
}

/// Draws a decoded image at an offset inside the layer.
///
/// The image is uploaded to a texture on the first frame and drawn with the
/// compositing program every frame after clearing to `background`.
#[derive(Debug)]
pub struct ImageContent {
    image: ImageBuffer,
    offset: IntPoint,
    background: Rgba,
    texture: Option<TextureId>,
    coords: Option<BufferId>,
    uv: Option<BufferId>,
}

impl ImageContent {
    /// Image content with a transparent background.
    #[must_use]
    pub fn new(image: ImageBuffer, offset: IntPoint) -> Self {
        Self {
            image,
            offset,
            background: Rgba::new(0.0, 0.0, 0.0, 0.0),
            texture: None,
            coords: None,
            uv: None,
        }
    }

    /// Sets the color cleared behind the image.
    #[must_use]
    pub fn with_background(mut self, background: Rgba) -> Self {
        self.background = background;
        self
    }

    fn upload(&mut self, gpu: &mut dyn Gpu) -> Result<()> {
        let texture = gpu.create_texture()?;
        self.texture = Some(texture);
        gpu.texture_image(
            texture,
            self.image.size(),
            self.image.format(),
            Some(self.image.bytes()),
        );
        self.coords = Some(gpu.create_vertex_buffer(&quad_coords(self.image.size()))?);
        self.uv = Some(gpu.create_vertex_buffer(&QUAD_UV)?);
        log::info!(
            "image {:?} uploaded: texture={}",
            self.image.size(),
            texture.get()
        );
        Ok(())
    }

    /// Projection for drawing inside a layer framebuffer.
    ///
    /// Compositing samples the framebuffer with `v = 0` at the layer's top
    /// edge, so y grows towards the framebuffer's GL top here.
    fn projection(size: IntSize) -> Transform3d {
        Transform3d::orthographic(
            0.0,
            f64::from(size.width),
            0.0,
            f64::from(size.height),
            -1.0,
            1.0,
        )
    }
}

impl LayerContent for ImageContent {
    fn draw(&mut self, frame: &mut LayerFrame<'_>) {
        frame.gpu.clear(self.background);
        if self.texture.is_none() {
            if let Err(e) = self.upload(frame.gpu) {
                log::warn!("image upload failed: {e}");
                self.release(frame.gpu);
                return;
            }
        }
        let (Some(texture), Some(coords), Some(uv)) = (self.texture, self.coords, self.uv) else {
            return;
        };
        let compositor = frame.compositor;
        compositor.begin(frame.gpu, &Self::projection(frame.size));
        let mv = Transform3d::from_translation(
            f64::from(self.offset.x),
            f64::from(self.offset.y),
            0.0,
        );
        compositor.draw_quad(frame.gpu, texture, coords, uv, &mv);
        compositor.end(frame.gpu);
    }

    fn release(&mut self, gpu: &mut dyn Gpu) {
        if let Some(b) = self.uv.take() {
            gpu.delete_buffer(b);
        }
        if let Some(b) = self.coords.take() {
            gpu.delete_buffer(b);
        }
        if let Some(t) = self.texture.take() {
            gpu.delete_texture(t);
        }
    }

    fn abandon(&mut self) {
        self.texture = None;
        self.coords = None;
        self.uv = None;
    }
}

/// Releases a layer together with its content.
pub(crate) fn destroy_with_content(
    gpu: &mut dyn Gpu,
    layer: &mut Layer,
    content: &mut dyn LayerContent,
) {
    content.release(gpu);
    layer.destroy(gpu);
}
