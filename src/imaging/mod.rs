//! Image processing — pure Rust, no system dependencies.
//!
//! | Concern | Module |
//! |---|---|
//! | **Resize policy math** | [`geometry`] — pure functions, no I/O |
//! | **Write options** | [`params`] — quality, sharpen kernel, codec flags |
//! | **Capability seam** | [`backend`] — [`ImageBackend`] / [`ImageHandle`] traits |
//! | **Production backend** | [`rust_backend`] — `image` crate + `kamadak-exif` |
//!
//! The split keeps geometry unit-testable without pixels and lets the chain
//! and executor run against a mock backend in tests.

pub mod backend;
mod geometry;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, ImageHandle, Rotation};
pub use geometry::{
    CropRegion, PadSpec, ResampleKernel, ResizeMode, ResizePlan, compute_resize,
};
pub use params::{EncodeOptions, PngCompression, Quality, SharpenKernel};
pub use rust_backend::RustBackend;
