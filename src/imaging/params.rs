//! Write-option value types for image encoding.
//!
//! These structs describe *what* an encode should look like, not *how* the
//! codec achieves it. They are the interface between the chain (which
//! accumulates options lazily) and the [`backend`](super::backend) (which
//! hands them to the actual encoders at the single materialize point).
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`SharpenKernel`] — 3×3 high-pass convolution + scale divisor, applied after downscales.
//! - [`PngCompression`] — PNG-specific effort/size tradeoff flag.
//! - [`EncodeOptions`] — Accumulated write options handed to `encode_to`.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
///
/// Only meaningful when the effective output format is JPEG; encoders for
/// other formats ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// A 3×3 convolution mask with a scale divisor.
///
/// Applied after downscaling resizes to counteract resampling softness.
/// The divisor must be non-zero; [`normalized`](Self::normalized) folds it
/// into the matrix for convolution backends that take plain weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharpenKernel {
    pub matrix: [[i32; 3]; 3],
    pub scale: i32,
}

impl SharpenKernel {
    /// The stock high-pass mask: strong center, -1 ring, divided by 16.
    pub fn classic() -> Self {
        Self {
            matrix: [[-1, -1, -1], [-1, 24, -1], [-1, -1, -1]],
            scale: 16,
        }
    }

    /// Row-major f32 weights with the scale divisor folded in.
    pub fn normalized(&self) -> [f32; 9] {
        let scale = self.scale as f32;
        let mut out = [0.0; 9];
        for (i, row) in self.matrix.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                out[i * 3 + j] = v as f32 / scale;
            }
        }
        out
    }
}

impl Default for SharpenKernel {
    fn default() -> Self {
        Self::classic()
    }
}

/// PNG encoder effort flag. The codec-specific write option: honored for
/// PNG output only, ignored everywhere else (same contract as quality on
/// non-JPEG output).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

/// Accumulated write options applied at the single encode point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// JPEG quality. `None` uses the encoder default.
    pub quality: Option<Quality>,
    /// Omit all EXIF/ICC metadata from the output.
    pub strip: bool,
    /// PNG compression effort.
    pub png_compression: PngCompression,
}
