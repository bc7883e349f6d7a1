// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Manager configuration, loadable from TOML.
//!
//! Every field has a default, so an empty document yields the reference
//! two-layer setup:
//!
//! ```toml
//! backend = "embedded"
//! frame_interval_ms = 40
//! surface_poll_ms = 100
//!
//! [[layers]]
//! origin = [0, 0]
//! content = { kind = "ramp", channel = "red" }
//!
//! [[layers]]
//! origin = [50, 50]
//! size = [500, 500]
//! content = { kind = "ramp", channel = "blue" }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::content::{Channel, ColorRamp, LayerContent, SolidColor};
use crate::context::{BackendKind, SurfaceRequest};
use crate::error::{Error, Result};
use crate::geometry::{IntPoint, IntSize};
use crate::gpu::Rgba;
use crate::layer::{LayerPlacement, MAX_LAYERS};
use crate::shader::ShaderSources;

/// Default pause between frames.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 40;
/// Default fallback poll while waiting for a window.
pub const DEFAULT_SURFACE_POLL_MS: u64 = 100;

/// Everything a [`LayerManager`](crate::manager::LayerManager) needs to
/// know up front.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayerManagerConfig {
    /// Which API family the render thread drives.
    pub backend: BackendKind,
    /// Pause after each composited frame, in milliseconds.
    pub frame_interval_ms: u64,
    /// Upper bound on one wait for a window handle, in milliseconds.
    pub surface_poll_ms: u64,
    /// Pixel / surface configuration to negotiate.
    pub surface: SurfaceRequest,
    /// Compositing shader; the built-in one for the context's backend when
    /// absent.
    pub shader: Option<ShaderSources>,
    /// Layers in paint order.
    pub layers: Vec<LayerConfig>,
}

/// One configured layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// Window-pixel origin.
    #[serde(default)]
    pub origin: [i32; 2],
    /// Fixed size; the window size at creation when absent.
    #[serde(default)]
    pub size: Option<[u32; 2]>,
    /// What to draw.
    pub content: ContentConfig,
}

/// Configurable built-in content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentConfig {
    /// A [`ColorRamp`].
    Ramp {
        /// Ramped channel.
        channel: Channel,
        /// Increment per frame.
        #[serde(default = "default_step")]
        step: u8,
    },
    /// A [`SolidColor`], as 8-bit RGBA.
    Solid {
        /// Color components.
        color: [u8; 4],
    },
}

const fn default_step() -> u8 {
    1
}

impl ContentConfig {
    /// Builds the content this entry describes.
    #[must_use]
    pub fn build(self) -> Box<dyn LayerContent> {
        match self {
            Self::Ramp { channel, step } => Box::new(ColorRamp::new(channel, step)),
            Self::Solid { color: [r, g, b, a] } => {
                Box::new(SolidColor(Rgba::from_u8(r, g, b, a)))
            }
        }
    }
}

impl LayerConfig {
    /// The placement this entry describes.
    #[must_use]
    pub fn placement(&self) -> LayerPlacement {
        LayerPlacement {
            origin: IntPoint::from(self.origin),
            size: self.size.map(IntSize::from),
        }
    }
}

impl Default for LayerManagerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            surface_poll_ms: DEFAULT_SURFACE_POLL_MS,
            surface: SurfaceRequest::default(),
            shader: None,
            layers: vec![
                LayerConfig {
                    origin: [0, 0],
                    size: None,
                    content: ContentConfig::Ramp {
                        channel: Channel::Red,
                        step: 1,
                    },
                },
                LayerConfig {
                    origin: [50, 50],
                    size: Some([500, 500]),
                    content: ContentConfig::Ramp {
                        channel: Channel::Blue,
                        step: 1,
                    },
                },
            ],
        }
    }
}

impl LayerManagerConfig {
    /// The reference configuration for a backend family, with the matching
    /// surface request.
    #[must_use]
    pub fn for_backend(backend: BackendKind) -> Self {
        Self {
            backend,
            surface: SurfaceRequest::for_backend(backend),
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigParse`] for malformed TOML, [`Error::Config`] when
    /// validation fails.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigRead`] if the file cannot be read, plus everything
    /// [`from_toml_str`](Self::from_toml_str) reports.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks the values the render loop relies on.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() || self.layers.len() > MAX_LAYERS {
            return Err(Error::Config(format!(
                "layers: expected 1..={MAX_LAYERS} entries, found {}",
                self.layers.len()
            )));
        }
        if self.frame_interval_ms == 0 {
            return Err(Error::Config("frame_interval_ms must be non-zero".into()));
        }
        if self.surface_poll_ms == 0 {
            return Err(Error::Config("surface_poll_ms must be non-zero".into()));
        }
        if self.surface.color_bits != 32 {
            return Err(Error::Config(format!(
                "surface.color_bits: only 32 is supported, found {}",
                self.surface.color_bits
            )));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if let Some([w, h]) = layer.size
                && (w == 0 || h == 0)
            {
                return Err(Error::Config(format!("layers[{i}].size must be non-zero")));
            }
            if let ContentConfig::Ramp { step: 0, .. } = layer.content {
                return Err(Error::Config(format!("layers[{i}].content.step must be at least 1")));
            }
        }
        Ok(())
    }

    /// [`frame_interval_ms`](Self::frame_interval_ms) as a duration.
    #[must_use]
    pub const fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// [`surface_poll_ms`](Self::surface_poll_ms) as a duration.
    #[must_use]
    pub const fn surface_poll(&self) -> Duration {
        Duration::from_millis(self.surface_poll_ms)
    }

    /// The configured shader, or the built-in one for `kind`.
    ///
    /// `kind` is the backend the context actually reports, which may differ
    /// from [`backend`](Self::backend).
    #[must_use]
    pub fn shader_sources(&self, kind: BackendKind) -> ShaderSources {
        self.shader
            .clone()
            .unwrap_or_else(|| ShaderSources::builtin(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_reference_setup() {
        let config = LayerManagerConfig::from_toml_str("").unwrap();
        assert_eq!(config, LayerManagerConfig::default());
        assert_eq!(config.frame_interval(), Duration::from_millis(40));
        assert_eq!(config.surface_poll(), Duration::from_millis(100));
        assert_eq!(config.layers.len(), 2);
        assert_eq!(
            config.layers[1].placement(),
            LayerPlacement::fixed(IntPoint::new(50, 50), IntSize::new(500, 500))
        );
    }

    #[test]
    fn full_document_parses() {
        let config = LayerManagerConfig::from_toml_str(
            r#"
            backend = "desktop"
            frame_interval_ms = 16

            [surface]
            depth_bits = 24
            stencil_bits = 8

            [shader]
            vertex = "v"
            fragment = "f"

            [[layers]]
            content = { kind = "solid", color = [255, 0, 0, 255] }

            [[layers]]
            origin = [10, -5]
            size = [64, 32]
            content = { kind = "ramp", channel = "green", step = 3 }
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendKind::Desktop);
        assert_eq!(config.surface.depth_bits, 24);
        assert_eq!(config.surface.color_bits, 32);
        assert_eq!(config.shader_sources(BackendKind::Embedded).vertex, "v");
        assert_eq!(config.layers[0].placement(), LayerPlacement::default());
        assert_eq!(
            config.layers[1].content,
            ContentConfig::Ramp {
                channel: Channel::Green,
                step: 3
            }
        );
    }

    #[test]
    fn builtin_shader_follows_backend() {
        let config = LayerManagerConfig::for_backend(BackendKind::Desktop);
        assert_eq!(
            config.shader_sources(BackendKind::Desktop),
            ShaderSources::builtin(BackendKind::Desktop)
        );
        assert_eq!(config.surface, SurfaceRequest::DESKTOP);
    }

    #[test]
    fn builtin_shader_follows_the_context_not_the_default_backend() {
        let config = LayerManagerConfig::from_toml_str("frame_interval_ms = 40\n").unwrap();
        assert_eq!(config.backend, BackendKind::Embedded);
        let sources = config.shader_sources(BackendKind::Desktop);
        assert!(sources.vertex.starts_with("#version 120"));
        assert_eq!(sources, ShaderSources::builtin(BackendKind::Desktop));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            "layers = []",
            "frame_interval_ms = 0",
            "surface_poll_ms = 0",
            "[surface]\ncolor_bits = 16",
            "[[layers]]\nsize = [0, 10]\ncontent = { kind = \"solid\", color = [0, 0, 0, 0] }",
            "[[layers]]\ncontent = { kind = \"ramp\", channel = \"red\", step = 0 }",
        ];
        for text in cases {
            let err = LayerManagerConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{text}: {err:?}");
        }
    }

    #[test]
    fn too_many_layers() {
        let mut config = LayerManagerConfig::default();
        config.layers = vec![config.layers[0].clone(); MAX_LAYERS + 1];
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            LayerManagerConfig::from_toml_str("backend = \"vulkan\""),
            Err(Error::ConfigParse(_))
        ));
        assert!(matches!(
            LayerManagerConfig::from_toml_str("unknown = 1"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = LayerManagerConfig::load("/nonexistent/lamina.toml").unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
        assert!(err.to_string().contains("/nonexistent/lamina.toml"));
    }
}
