//! # Darkroom
//!
//! A deterministic image transformation pipeline for upload processing.
//! Chain-building calls accumulate resize / convert / quality / strip /
//! auto-orient operations without touching pixels; one finalize pass decodes
//! the source, applies the chain in order, and publishes the result
//! atomically (temp file + rename) at the source path.
//!
//! # Architecture: Build Lazily, Materialize Once
//!
//! ```text
//! 1. Build     chain calls  →  OperationChain   (no I/O, validation only)
//! 2. Plan      per resize   →  ResizePlan       (pure geometry)
//! 3. Execute   Pipeline::run →  decode, apply, encode, atomic rename
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Single side-effect point**: the file is read once and replaced once,
//!   however many operations are queued. A failed run leaves the original
//!   bytes in place.
//! - **Testability**: resize policy is pure math ([`imaging::compute_resize`])
//!   and chain execution runs against a mock backend; neither needs a codec.
//! - **Early failure**: the only eager work is validation, so a bad convert
//!   target errors at the call site rather than mid-encode.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`chain`] | Ordered, lazy operation list and its one-shot finalize |
//! | [`pipeline`] | Executor — decode, apply, encode to temp, atomic publish |
//! | [`imaging`] | Resize geometry, write options, backend traits, the `image`-crate backend |
//! | [`uploader`] | Host-framework adapter: `UploadSource` capability + `Attachment` glue |
//! | [`config`] | `darkroom.toml` loading, validation, stock config generation |
//! | [`format`] | Format identification and output-filename derivation |
//!
//! # Design Decisions
//!
//! ## Resize Policies, Not Resize Calls
//!
//! All four modes (fit, fill, limit, pad) share one ratio computation and
//! differ only in policy: min vs max ratio, whether upscaling is allowed,
//! and what happens to the leftover space (crop vs pad). That policy lives
//! in a pure function returning a [`imaging::ResizePlan`], so the
//! odd-aspect-ratio edge cases are table-testable without decoding a single
//! image.
//!
//! ## Kernel Choice Follows Direction
//!
//! Upscales use nearest-neighbor — a smooth kernel cannot invent detail the
//! source doesn't have, so the cheap filter wins. Downscales use CatmullRom
//! followed by an optional 3×3 high-pass sharpen to counter resampling
//! softness. Ratio-1.0 resizes short-circuit entirely.
//!
//! ## Atomic Publish
//!
//! Output is encoded to a `_tmp`-suffixed sibling and renamed over the
//! source. Readers of the published path never observe a partial file, and
//! any failure deletes the temp and leaves the original untouched.
//!
//! ## Pure-Rust Imaging
//!
//! The default backend uses the `image` crate and `kamadak-exif` — no
//! ImageMagick, no libvips, no system dependencies. The binary is fully
//! self-contained. Swapping codecs means implementing the two traits in
//! [`imaging::backend`]; nothing above that seam changes.

pub mod chain;
pub mod config;
pub mod format;
pub mod imaging;
pub mod pipeline;
pub mod uploader;
