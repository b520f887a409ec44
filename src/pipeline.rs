//! Pipeline execution: the single materialize point.
//!
//! A [`Pipeline`] owns a backend and a configuration. [`Pipeline::run`]
//! decodes the source (lazily — an empty chain never touches the file),
//! applies the chain, encodes to a sibling temp file, and atomically renames
//! it over the source path. Either the rename lands or the original file is
//! left byte-for-byte untouched; no partially-written output is ever visible
//! at the published path.
//!
//! Every backend failure — decode, transform, or encode — is normalized here
//! into [`ProcessingError`] carrying the original cause, so callers have one
//! failure surface regardless of which step failed.
//!
//! The decoded image is scoped to the `run` call and dropped on every exit
//! path. Sustained batch use must not accumulate handles or descriptors:
//! one decode, one temp file, one rename per invocation.

use crate::chain::{FinalizeError, OperationChain};
use crate::config::PipelineConfig;
use crate::format::ImageFormat;
use crate::imaging::{BackendError, EncodeOptions, ImageBackend, ImageHandle};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Surfaced by `AutoOrient` when the orientation tag is out of range.
    #[error("invalid EXIF orientation value: {value}")]
    InvalidOrientation { value: u16 },
    /// Any decode/transform/encode failure from the image backend.
    #[error("failed to process {path}: {source}")]
    Backend {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Executes operation chains against source files.
pub struct Pipeline<B: ImageBackend> {
    backend: B,
    config: PipelineConfig,
}

impl<B: ImageBackend> Pipeline<B> {
    pub fn new(backend: B, config: PipelineConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// A fresh chain bound to this pipeline's configuration.
    pub fn chain(&self) -> OperationChain {
        OperationChain::new(&self.config)
    }

    /// Materialize `chain` against the file at `source` and publish the
    /// result in place. Returns the published path (always `source`).
    ///
    /// An empty chain is a no-op: the file is not even opened.
    pub fn run(
        &self,
        source: &Path,
        chain: &mut OperationChain,
    ) -> Result<PathBuf, ProcessingError> {
        if chain.is_empty() {
            tracing::debug!(path = %source.display(), "nothing pending, skipping");
            return Ok(source.to_path_buf());
        }

        let mut image = self
            .backend
            .decode(source)
            .map_err(|e| backend_error(source, e))?;

        let spec = chain.finalize(&mut image, &self.config).map_err(|e| match e {
            FinalizeError::InvalidOrientation { value } => {
                ProcessingError::InvalidOrientation { value }
            }
            FinalizeError::Backend(cause) => backend_error(source, cause),
        })?;

        let effective = spec.format.unwrap_or_else(|| image.source_format());
        let options = EncodeOptions {
            quality: spec.quality,
            strip: spec.strip,
            png_compression: spec.png_compression.unwrap_or_default(),
        };

        let tmp = temp_path(source, effective);
        if let Err(e) = image.encode_to(&tmp, effective, &options) {
            let _ = fs::remove_file(&tmp);
            return Err(backend_error(source, e));
        }
        if let Err(e) = fs::rename(&tmp, source) {
            let _ = fs::remove_file(&tmp);
            return Err(ProcessingError::Io(e));
        }

        tracing::debug!(
            path = %source.display(),
            format = %effective,
            width = image.width(),
            height = image.height(),
            "published"
        );
        Ok(source.to_path_buf())
    }
}

fn backend_error(source: &Path, cause: BackendError) -> ProcessingError {
    ProcessingError::Backend {
        path: source.to_path_buf(),
        source: cause,
    }
}

/// Sibling temp path: same directory, `_tmp` suffix, extension matching the
/// effective output format.
fn temp_path(source: &Path, format: ImageFormat) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = format.extension().map(str::to_string).or_else(|| {
        source
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
    });
    let name = match ext {
        Some(ext) => format!("{stem}_tmp.{ext}"),
        None => format!("{stem}_tmp"),
    };
    source.with_file_name(name)
}
