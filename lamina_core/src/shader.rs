// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compositing shader program.
//!
//! Every layer is drawn with the same textured-quad program:
//!
//! ```text
//! attr_point ──► unif_proj · unif_mv · point ──► gl_Position
//! attr_uv    ──► v_uv ──► texture2D(unif_texture, v_uv) ──► gl_FragColor
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::context::BackendKind;
use crate::error::Result;
use crate::gpu::{AttribLocation, Gpu, ProgramId, UniformLocation};

/// Name of the vertex position attribute.
pub const ATTR_POINT: &str = "attr_point";
/// Name of the texture coordinate attribute.
pub const ATTR_UV: &str = "attr_uv";
/// Name of the projection matrix uniform.
pub const UNIF_PROJ: &str = "unif_proj";
/// Name of the model-view matrix uniform.
pub const UNIF_MV: &str = "unif_mv";
/// Name of the sampler uniform.
pub const UNIF_TEXTURE: &str = "unif_texture";

const EMBEDDED_VERTEX: &str = "#version 100
attribute mediump vec4 attr_point;
attribute mediump vec2 attr_uv;
uniform mediump mat4 unif_proj;
uniform mediump mat4 unif_mv;
varying mediump vec2 v_uv;
void main() {
    gl_Position = unif_proj * unif_mv * attr_point;
    v_uv = attr_uv;
}
";

const EMBEDDED_FRAGMENT: &str = "#version 100
uniform lowp sampler2D unif_texture;
varying mediump vec2 v_uv;
void main() {
    gl_FragColor = texture2D(unif_texture, v_uv);
}
";

const DESKTOP_VERTEX: &str = "#version 120
attribute vec4 attr_point;
attribute vec2 attr_uv;
uniform mat4 unif_proj;
uniform mat4 unif_mv;
varying vec2 v_uv;
void main() {
    gl_Position = unif_proj * unif_mv * attr_point;
    v_uv = attr_uv;
}
";

const DESKTOP_FRAGMENT: &str = "#version 120
uniform sampler2D unif_texture;
varying vec2 v_uv;
void main() {
    gl_FragColor = texture2D(unif_texture, v_uv);
}
";

/// A programmable pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// GLSL source for the two stages of the compositing program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShaderSources {
    /// Vertex stage source.
    pub vertex: String,
    /// Fragment stage source.
    pub fragment: String,
}

impl ShaderSources {
    /// The built-in textured-quad program for a backend family.
    #[must_use]
    pub fn builtin(kind: BackendKind) -> Self {
        let (vertex, fragment) = match kind {
            BackendKind::Desktop => (DESKTOP_VERTEX, DESKTOP_FRAGMENT),
            BackendKind::Embedded => (EMBEDDED_VERTEX, EMBEDDED_FRAGMENT),
        };
        Self {
            vertex: vertex.to_owned(),
            fragment: fragment.to_owned(),
        }
    }
}

/// A linked vertex + fragment program.
///
/// Created lazily on the render thread the first time it is needed; once
/// [`create`](Self::create) succeeds, [`is_created`](Self::is_created) stays
/// true until the program is destroyed with its context.
#[derive(Debug, Default)]
pub struct ShaderProgram {
    program: Option<ProgramId>,
}

impl ShaderProgram {
    /// An empty, not-yet-created program.
    #[must_use]
    pub const fn new() -> Self {
        Self { program: None }
    }

    /// Compiles both stages and links them. The stage objects are released
    /// once linking has been attempted.
    ///
    /// Calling this on an already created program is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::ShaderCompile`](crate::Error::ShaderCompile) or
    /// [`Error::ShaderLink`](crate::Error::ShaderLink) carrying the driver
    /// info log. No GPU objects are left behind on failure.
    pub fn create(&mut self, gpu: &mut dyn Gpu, sources: &ShaderSources) -> Result<()> {
        if self.program.is_some() {
            return Ok(());
        }
        let vs = gpu.compile_shader(ShaderStage::Vertex, &sources.vertex)?;
        let fs = match gpu.compile_shader(ShaderStage::Fragment, &sources.fragment) {
            Ok(fs) => fs,
            Err(e) => {
                gpu.delete_shader(vs);
                return Err(e);
            }
        };
        let linked = gpu.link_program(vs, fs);
        gpu.delete_shader(vs);
        gpu.delete_shader(fs);
        let program = linked?;
        log::info!(
            "shader program created: program={} vs={} fs={}",
            program.get(),
            vs.get(),
            fs.get()
        );
        self.program = Some(program);
        Ok(())
    }

    /// Whether the program has been linked.
    #[inline]
    #[must_use]
    pub const fn is_created(&self) -> bool {
        self.program.is_some()
    }

    /// The linked program, if any.
    #[inline]
    #[must_use]
    pub const fn program(&self) -> Option<ProgramId> {
        self.program
    }

    /// Location of vertex attribute `name`, or `None` when the program is
    /// not created or has no such active attribute.
    pub fn attr_location(&self, gpu: &mut dyn Gpu, name: &str) -> Option<AttribLocation> {
        gpu.attrib_location(self.program?, name)
    }

    /// Location of uniform `name`, or `None` when the program is not created
    /// or has no such active uniform.
    pub fn uniform_location(&self, gpu: &mut dyn Gpu, name: &str) -> Option<UniformLocation> {
        gpu.uniform_location(self.program?, name)
    }

    /// Deletes the program. Requires a current context; no-op when not
    /// created.
    pub fn destroy(&mut self, gpu: &mut dyn Gpu) {
        if let Some(program) = self.program.take() {
            gpu.delete_program(program);
            log::info!("shader program destroyed: program={}", program.get());
        }
    }

    /// Forgets the program without issuing GPU calls.
    pub fn abandon(&mut self) {
        if let Some(program) = self.program.take() {
            log::info!("shader program abandoned: program={}", program.get());
        }
    }
}
