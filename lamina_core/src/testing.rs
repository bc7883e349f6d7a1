// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording GPU and scripted context used by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use crate::context::{BackendKind, GraphicsContext, NativeWindow};
use crate::error::{Error, Result};
use crate::geometry::IntSize;
use crate::gpu::{
    AttribLocation, BufferId, FRAMEBUFFER_COMPLETE, FramebufferId, Gpu, ProgramId, RenderbufferId,
    Rgba, Sampling, ShaderId, TextureId, UniformLocation,
};
use crate::image::PixelFormat;
use crate::shader::ShaderStage;

/// `GL_FRAMEBUFFER_UNSUPPORTED`.
const FRAMEBUFFER_UNSUPPORTED: u32 = 0x8CDD;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Kind {
    Texture,
    Renderbuffer,
    Framebuffer,
    Buffer,
    Shader,
    Program,
}

/// A state-changing or drawing call, in issue order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum GpuCall {
    TextureImage(TextureId),
    BindTexture(Option<TextureId>),
    SetSampling(Sampling),
    BindFramebuffer(Option<FramebufferId>),
    UseProgram(Option<ProgramId>),
    UniformMatrix(Option<UniformLocation>),
    UniformSampler(Option<UniformLocation>),
    Viewport(IntSize),
    Clear(Rgba),
    EnableAttrib(AttribLocation),
    DisableAttrib(AttribLocation),
    AttribBuffer(AttribLocation, BufferId),
    DrawTriangleStrip(i32),
    Flush,
}

/// A [`Gpu`] that hands out fresh names, tracks which are alive and
/// records every other call.
///
/// Deleting a name that is not alive panics, so double frees show up as
/// test failures.
#[derive(Debug, Default)]
pub(crate) struct MockGpu {
    next_name: u32,
    live: HashSet<(Kind, u32)>,
    allocations: usize,
    frees: usize,
    calls: Vec<GpuCall>,
    bound_texture: Option<TextureId>,
    drawn: Vec<TextureId>,
    buffers: HashMap<u32, Vec<f32>>,
    sources: HashMap<u32, String>,
    compiled: Vec<String>,
    names: Vec<String>,
    fail_framebuffers: u32,
    fail_buffers: u32,
}

impl MockGpu {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` framebuffer completeness checks fail.
    pub(crate) fn fail_framebuffers(&mut self, n: u32) {
        self.fail_framebuffers = n;
    }

    /// Makes the next `n` vertex buffer allocations fail.
    pub(crate) fn fail_buffers(&mut self, n: u32) {
        self.fail_buffers = n;
    }

    pub(crate) fn live_objects(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn live_shaders(&self) -> usize {
        self.count(Kind::Shader)
    }

    pub(crate) fn live_programs(&self) -> usize {
        self.count(Kind::Program)
    }

    pub(crate) fn allocations(&self) -> usize {
        self.allocations
    }

    pub(crate) fn frees(&self) -> usize {
        self.frees
    }

    pub(crate) fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    pub(crate) fn clear_calls(&mut self) {
        self.calls.clear();
        self.drawn.clear();
    }

    /// Textures bound at each draw call, in order.
    pub(crate) fn drawn_textures(&self) -> Vec<TextureId> {
        self.drawn.clone()
    }

    /// Every shader source compiled so far, in order.
    pub(crate) fn compiled_sources(&self) -> &[String] {
        &self.compiled
    }

    pub(crate) fn buffer_data(&self, buffer: BufferId) -> Vec<f32> {
        self.buffers.get(&buffer.get()).cloned().unwrap_or_default()
    }

    fn count(&self, kind: Kind) -> usize {
        self.live.iter().filter(|(k, _)| *k == kind).count()
    }

    fn alloc(&mut self, kind: Kind) -> u32 {
        self.next_name += 1;
        self.live.insert((kind, self.next_name));
        self.allocations += 1;
        self.next_name
    }

    fn free(&mut self, kind: Kind, name: u32) {
        assert!(
            self.live.remove(&(kind, name)),
            "{kind:?} {name} freed while not alive"
        );
        self.frees += 1;
    }

    fn location(&mut self, program: ProgramId, name: &str) -> Option<u32> {
        let source = self.sources.get(&program.get())?;
        if !source.contains(name) {
            return None;
        }
        let index = match self.names.iter().position(|n| n == name) {
            Some(i) => i,
            None => {
                self.names.push(name.to_owned());
                self.names.len() - 1
            }
        };
        u32::try_from(index).ok()
    }
}

fn name<T>(raw: u32, wrap: fn(u32) -> Option<T>) -> T {
    wrap(raw).expect("mock names start at 1")
}

impl Gpu for MockGpu {
    fn create_texture(&mut self) -> Result<TextureId> {
        let raw = self.alloc(Kind::Texture);
        Ok(name(raw, TextureId::from_raw))
    }

    fn texture_image(
        &mut self,
        texture: TextureId,
        _size: IntSize,
        _format: PixelFormat,
        _pixels: Option<&[u8]>,
    ) {
        self.calls.push(GpuCall::TextureImage(texture));
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        self.bound_texture = texture;
        self.calls.push(GpuCall::BindTexture(texture));
    }

    fn set_sampling(&mut self, sampling: Sampling) {
        self.calls.push(GpuCall::SetSampling(sampling));
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.free(Kind::Texture, texture.get());
    }

    fn create_depth_buffer(&mut self, _size: IntSize) -> Result<RenderbufferId> {
        let raw = self.alloc(Kind::Renderbuffer);
        Ok(name(raw, RenderbufferId::from_raw))
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        self.free(Kind::Renderbuffer, renderbuffer.get());
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        let raw = self.alloc(Kind::Framebuffer);
        Ok(name(raw, FramebufferId::from_raw))
    }

    fn attach_targets(
        &mut self,
        _framebuffer: FramebufferId,
        _color: TextureId,
        _depth: RenderbufferId,
    ) -> u32 {
        if self.fail_framebuffers > 0 {
            self.fail_framebuffers -= 1;
            FRAMEBUFFER_UNSUPPORTED
        } else {
            FRAMEBUFFER_COMPLETE
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.calls.push(GpuCall::BindFramebuffer(framebuffer));
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.free(Kind::Framebuffer, framebuffer.get());
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<BufferId> {
        if self.fail_buffers > 0 {
            self.fail_buffers -= 1;
            return Err(Error::Allocation {
                object: "buffer",
                message: "out of memory".into(),
            });
        }
        let raw = self.alloc(Kind::Buffer);
        self.buffers.insert(raw, data.to_vec());
        Ok(name(raw, BufferId::from_raw))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.free(Kind::Buffer, buffer.get());
        self.buffers.remove(&buffer.get());
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId> {
        if source.contains("#error") {
            return Err(Error::ShaderCompile {
                stage,
                log: "0:1: '#error' : broken".into(),
            });
        }
        let raw = self.alloc(Kind::Shader);
        self.sources.insert(raw, source.to_owned());
        self.compiled.push(source.to_owned());
        Ok(name(raw, ShaderId::from_raw))
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId> {
        let mut source = self.sources.get(&vertex.get()).cloned().unwrap_or_default();
        source.push_str(self.sources.get(&fragment.get()).map_or("", String::as_str));
        if source.contains("#link-error") {
            return Err(Error::ShaderLink {
                log: "unresolved varying".into(),
            });
        }
        let raw = self.alloc(Kind::Program);
        self.sources.insert(raw, source);
        Ok(name(raw, ProgramId::from_raw))
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.free(Kind::Shader, shader.get());
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.free(Kind::Program, program.get());
    }

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        self.location(program, name).map(AttribLocation)
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.location(program, name).map(UniformLocation)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.calls.push(GpuCall::UseProgram(program));
    }

    fn uniform_matrix4(&mut self, location: Option<UniformLocation>, _matrix: &[f32; 16]) {
        self.calls.push(GpuCall::UniformMatrix(location));
    }

    fn uniform_sampler(&mut self, location: Option<UniformLocation>, _unit: i32) {
        self.calls.push(GpuCall::UniformSampler(location));
    }

    fn viewport(&mut self, _x: i32, _y: i32, size: IntSize) {
        self.calls.push(GpuCall::Viewport(size));
    }

    fn clear(&mut self, color: Rgba) {
        self.calls.push(GpuCall::Clear(color));
    }

    fn enable_attrib(&mut self, location: AttribLocation) {
        self.calls.push(GpuCall::EnableAttrib(location));
    }

    fn disable_attrib(&mut self, location: AttribLocation) {
        self.calls.push(GpuCall::DisableAttrib(location));
    }

    fn attrib_buffer(&mut self, location: AttribLocation, buffer: BufferId, _components: i32) {
        self.calls.push(GpuCall::AttribBuffer(location, buffer));
    }

    fn draw_triangle_strip(&mut self, count: i32) {
        if let Some(t) = self.bound_texture {
            self.drawn.push(t);
        }
        self.calls.push(GpuCall::DrawTriangleStrip(count));
    }

    fn flush(&mut self) {
        self.calls.push(GpuCall::Flush);
    }
}

/// Script and observations shared between a test and the [`MockContext`]
/// living on the render thread.
#[derive(Debug, Default)]
pub(crate) struct ProbeState {
    /// The backend kind the mock context reports.
    pub(crate) kind: BackendKind,
    pub(crate) fail_create_context: bool,
    pub(crate) fail_surface: bool,
    pub(crate) fail_framebuffers: u32,
    pub(crate) contexts_created: u32,
    pub(crate) surfaces_created: u32,
    pub(crate) surfaces_destroyed: u32,
    pub(crate) teardowns: u32,
    /// `make_current(false)` calls.
    pub(crate) releases: u32,
    pub(crate) swaps: u64,
    pub(crate) windows: Vec<NativeWindow>,
    /// GPU objects still alive when the context was torn down.
    pub(crate) live_at_teardown: Option<usize>,
    pub(crate) allocations: usize,
    pub(crate) frees: usize,
    pub(crate) compiled_shaders: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ContextProbe(Arc<Mutex<ProbeState>>);

impl ContextProbe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut ProbeState) -> R) -> R {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// A [`GraphicsContext`] driven by a [`ContextProbe`].
#[derive(Debug)]
pub(crate) struct MockContext {
    probe: ContextProbe,
    gpu: MockGpu,
    created: bool,
    surface: Option<NativeWindow>,
    ever_current: bool,
}

impl MockContext {
    pub(crate) fn new(probe: ContextProbe) -> Self {
        let mut gpu = MockGpu::new();
        gpu.fail_framebuffers(probe.with(|p| p.fail_framebuffers));
        Self {
            probe,
            gpu,
            created: false,
            surface: None,
            ever_current: false,
        }
    }
}

impl GraphicsContext for MockContext {
    fn kind(&self) -> BackendKind {
        self.probe.with(|p| p.kind)
    }

    fn create_context(&mut self) -> Result<()> {
        if self.probe.with(|p| p.fail_create_context) {
            return Err(Error::PixelFormat("mock: no matching config".into()));
        }
        self.created = true;
        self.probe.with(|p| p.contexts_created += 1);
        Ok(())
    }

    fn create_window_surface(&mut self, window: NativeWindow) -> Result<()> {
        if !self.created {
            return Err(Error::NotCurrent);
        }
        if self.probe.with(|p| p.fail_surface) {
            return Err(Error::Platform {
                call: "mock_create_surface",
                code: 0x300B,
            });
        }
        self.surface = Some(window);
        self.ever_current = true;
        self.probe.with(|p| {
            p.surfaces_created += 1;
            p.windows.push(window);
        });
        Ok(())
    }

    fn destroy_window_surface(&mut self) {
        if self.surface.take().is_some() {
            self.probe.with(|p| p.surfaces_destroyed += 1);
        }
    }

    fn make_current(&mut self, current: bool) -> Result<()> {
        if current && self.surface.is_none() {
            return Err(Error::NotCurrent);
        }
        if !current {
            self.probe.with(|p| p.releases += 1);
        }
        Ok(())
    }

    fn swap_buffers(&mut self) -> Result<()> {
        self.probe.with(|p| p.swaps += 1);
        Ok(())
    }

    fn teardown_context(&mut self) {
        if !self.created {
            return;
        }
        self.created = false;
        let (live, allocations, frees) = (
            self.gpu.live_objects(),
            self.gpu.allocations(),
            self.gpu.frees(),
        );
        let compiled = self.gpu.compiled_sources().to_vec();
        self.probe.with(|p| {
            p.teardowns += 1;
            p.live_at_teardown = Some(live);
            p.allocations = allocations;
            p.frees = frees;
            p.compiled_shaders = compiled;
        });
    }

    fn gpu(&mut self) -> Option<&mut dyn Gpu> {
        if self.ever_current {
            Some(&mut self.gpu)
        } else {
            None
        }
    }
}
