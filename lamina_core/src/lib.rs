// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layered off-screen compositing over OpenGL and OpenGL ES.
//!
//! `lamina_core` owns one framebuffer object per logical layer, renders each
//! layer's content into its framebuffer, and composites all layers onto a
//! window surface as textured quads. It drives the platform rendering
//! context from a dedicated render thread that follows the host's window
//! lifecycle. Nothing here touches a platform API directly: backends supply
//! a [`GraphicsContext`](context::GraphicsContext) and a [`Gpu`](gpu::Gpu).
//!
//! # Architecture
//!
//! ```text
//!   Host thread                              Render thread
//!   ───────────                              ─────────────
//!   LayerManager::start / stop ──► Shared ──► RenderLoop
//!   LayerManager::touch ─────────► channel ─►   │
//!                                               ▼
//!                          GraphicsContext (surface, swap, gpu())
//!                                               │
//!            ┌──────────────────────────────────┘
//!            ▼
//!   LayerStack::ensure_created ──► Layer::create (FBO + texture + depth)
//!   LayerStack::draw_contents  ──► LayerContent::draw into each FBO
//!   LayerStack::composite      ──► Compositor::draw_quad per layer
//! ```
//!
//! **[`manager`]**: [`LayerManager`](manager::LayerManager): the host API
//! and the render loop behind it.
//!
//! **[`lifecycle`]**: The `Stopped → Paused ⇄ Running → Terminated` state
//! machine.
//!
//! **[`layer`]**: [`Layer`](layer::Layer) framebuffers, the ordered
//! [`LayerStack`](layer::LayerStack), and touch routing.
//!
//! **[`content`]**: [`LayerContent`](content::LayerContent) and the
//! built-in color ramp, solid color and image contents.
//!
//! **[`compositor`]** / **[`shader`]**: The textured-quad program and the
//! draw calls built on it.
//!
//! **[`context`]** / **[`gpu`]**: The traits backends implement.
//!
//! **[`config`]**: [`LayerManagerConfig`](config::LayerManagerConfig),
//! loadable from TOML.
//!
//! **[`geometry`]**, **[`transform`]**, **[`image`]**: Value types.

pub mod compositor;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod image;
pub mod layer;
pub mod lifecycle;
pub mod manager;
pub mod shader;
pub mod transform;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
