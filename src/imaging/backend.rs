//! Image backend trait and the decoded-image capability surface.
//!
//! [`ImageBackend`] decodes a source file into an [`ImageHandle`]; the
//! handle exposes exactly the operations the pipeline composes — resize by
//! ratio, crop, pad, convolve, rotate, orientation metadata, encode. The
//! rest of the crate is backend-agnostic: the chain and executor depend only
//! on these traits, never on a concrete codec library.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust, everything
//! statically linked into the binary.

use super::geometry::{CropRegion, PadSpec, ResampleKernel};
use super::params::{EncodeOptions, SharpenKernel};
use crate::format::ImageFormat;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

/// Quarter-turn rotations, the only ones auto-orientation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

/// A decoded image plus its pending state.
///
/// `width`/`height` always reflect the current in-memory pixels: every
/// resize, crop, pad, or rotate updates them, so later chain steps observe
/// the result of earlier ones. Handles are single-owner; dropping one
/// releases the decoded pixels and any descriptors behind it.
pub trait ImageHandle {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Container format the image was decoded from.
    fn source_format(&self) -> ImageFormat;

    /// Scale uniformly by `ratio` with the given kernel class.
    fn resize(&mut self, ratio: f64, kernel: ResampleKernel) -> Result<(), BackendError>;

    /// Extract a region. Implementations clamp the region to the actual
    /// image bounds — an extraction can shrink, it can never fail for being
    /// a pixel too large.
    fn crop(&mut self, region: CropRegion) -> Result<(), BackendError>;

    /// Place the image onto a `spec`-sized canvas filled with `background`
    /// (RGBA).
    fn pad(&mut self, spec: PadSpec, background: [u8; 4]) -> Result<(), BackendError>;

    /// Apply a 3×3 convolution.
    fn convolve(&mut self, kernel: &SharpenKernel) -> Result<(), BackendError>;

    fn rotate(&mut self, rotation: Rotation) -> Result<(), BackendError>;

    /// EXIF orientation tag value, if present. Reads the primary IFD first
    /// and falls back to the thumbnail IFD when the primary is absent or
    /// malformed.
    fn orientation(&self) -> Option<u16>;

    /// Drop the orientation tag (both fields) so encoded output is never
    /// re-rotated by a downstream viewer.
    fn clear_orientation(&mut self);

    /// Encode to `path` in `format`, honoring `options`. Quality applies to
    /// JPEG output only; the PNG compression flag to PNG only.
    fn encode_to(
        &self,
        path: &Path,
        format: ImageFormat,
        options: &EncodeOptions,
    ) -> Result<(), BackendError>;
}

/// Decodes source files into handles.
pub trait ImageBackend {
    type Image: ImageHandle;

    /// Decode the image at `path`. Implementations should use a streaming/
    /// sequential read for formats that benefit from it (JPEG, PNG).
    fn decode(&self, path: &Path) -> Result<Self::Image, BackendError>;
}
