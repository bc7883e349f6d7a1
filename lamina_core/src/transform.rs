// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal column-major 4×4 transform.
//!
//! Covers what layer compositing needs (identity, translation, orthographic
//! projection, multiply) without pulling in a full linear-algebra crate.

use core::ops::Mul;

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, which is the memory layout
/// `glUniformMatrix4fv` expects with `transpose = GL_FALSE`. Matrices built
/// here can therefore be uploaded with [`to_gl`](Self::to_gl) directly; no
/// transpose is needed before upload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates an orthographic projection mapping the box
    /// `[left, right] × [bottom, top] × [-near, -far]` onto clip space, with
    /// the same conventions as `glOrtho`.
    ///
    /// Passing `bottom = height, top = 0` yields a y-down projection whose
    /// origin is the top-left corner of the window.
    #[must_use]
    pub fn orthographic(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        let rl = right - left;
        let tb = top - bottom;
        let fnr = far - near;
        Self {
            cols: [
                [2.0 / rl, 0.0, 0.0, 0.0],
                [0.0, 2.0 / tb, 0.0, 0.0],
                [0.0, 0.0, -2.0 / fnr, 0.0],
                [
                    -(right + left) / rl,
                    -(top + bottom) / tb,
                    -(far + near) / fnr,
                    1.0,
                ],
            ],
        }
    }

    /// Applies this transform to the point `(x, y, z, 1)` and returns the
    /// resulting `[x, y, z, w]`.
    #[cfg(test)]
    pub(crate) fn transform_point(self, x: f64, y: f64, z: f64) -> [f64; 4] {
        let c = &self.cols;
        let mut out = [0.0_f64; 4];
        for (i, o) in out.iter_mut().enumerate() {
            *o = c[0][i] * x + c[1][i] * y + c[2][i] * z + c[3][i];
        }
        out
    }

    /// Flattens to 16 column-major `f32`s for uniform upload.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "GPU uniforms are single precision"
    )]
    pub fn to_gl(self) -> [f32; 16] {
        let mut out = [0.0_f32; 16];
        for (j, col) in self.cols.iter().enumerate() {
            for (i, v) in col.iter().enumerate() {
                out[j * 4 + i] = *v as f32;
            }
        }
        out
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}
