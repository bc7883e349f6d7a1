// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by the core crate and the platform backends.

use std::io;
use std::path::PathBuf;

use crate::shader::ShaderStage;

/// Convenience alias used throughout `lamina_core`.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Everything that can go wrong while configuring, creating or driving a
/// layer compositor.
///
/// Backends map their platform errors into [`Error::Platform`] (numeric
/// error codes such as `GetLastError` or `eglGetError`) or
/// [`Error::Backend`] (errors that only carry a message).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration parsed but holds values the compositor cannot use.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The configuration text is not valid TOML for [`LayerManagerConfig`].
    ///
    /// [`LayerManagerConfig`]: crate::config::LayerManagerConfig
    #[error("failed to parse configuration")]
    ConfigParse(#[from] toml::de::Error),
    /// The configuration file could not be read.
    #[error("failed to read configuration file {}", path.display())]
    ConfigRead {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// No pixel format / surface configuration satisfies the request.
    #[error("no pixel format matches the request: {0}")]
    PixelFormat(String),
    /// A platform call failed with a numeric error code.
    #[error("{call} failed (error {code:#x})")]
    Platform {
        /// Name of the failing platform call.
        call: &'static str,
        /// Platform error code.
        code: i64,
    },
    /// A platform or binding call failed with a message only.
    #[error("{call} failed: {message}")]
    Backend {
        /// Name of the failing call.
        call: &'static str,
        /// Message reported by the binding.
        message: String,
    },
    /// A layer framebuffer did not pass the completeness check.
    #[error("framebuffer incomplete (status {status:#x})")]
    FramebufferIncomplete {
        /// Status returned by the completeness check.
        status: u32,
    },
    /// A shader stage failed to compile.
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile {
        /// The stage that failed.
        stage: ShaderStage,
        /// Driver info log.
        log: String,
    },
    /// The program failed to link.
    #[error("shader program failed to link: {log}")]
    ShaderLink {
        /// Driver info log.
        log: String,
    },
    /// The GPU refused to allocate an object name.
    #[error("failed to allocate {object}: {message}")]
    Allocation {
        /// Kind of object being allocated.
        object: &'static str,
        /// Message reported by the binding.
        message: String,
    },
    /// An image buffer's byte length does not match its dimensions.
    #[error("image buffer holds {actual} bytes, expected {expected}")]
    ImageSize {
        /// Length implied by width, height and pixel format.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
    /// A layer index is outside the configured layer count.
    #[error("layer index {index} out of range (layer count {count})")]
    LayerIndex {
        /// Requested index.
        index: usize,
        /// Number of configured layers.
        count: usize,
    },
    /// [`LayerManager::launch`](crate::manager::LayerManager::launch) was
    /// called twice.
    #[error("render thread already launched")]
    AlreadyLaunched,
    /// The render thread could not be spawned.
    #[error("failed to spawn render thread")]
    Spawn(#[source] io::Error),
    /// A GPU operation was requested while no context is current.
    #[error("no rendering context is current")]
    NotCurrent,
}
