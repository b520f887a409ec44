//! Host upload-framework adapter.
//!
//! The host is modeled as the two-method [`UploadSource`] capability: where
//! the file currently lives, and how to make sure it is locally
//! materialized. Nothing in the core depends on a concrete host type.
//!
//! [`Attachment`] is the glue an upload framework mounts: its chain-building
//! calls return immediately without I/O, and [`finalize_and_publish`]
//! (intended to run from the host's after-process lifecycle hook, once the
//! host's own processing step has completed) materializes everything in one
//! pass.

use crate::chain::{ChainError, OperationChain};
use crate::format::{self, ImageFormat};
use crate::imaging::{ImageBackend, PngCompression};
use crate::pipeline::{Pipeline, ProcessingError};
use std::io;
use std::path::{Path, PathBuf};

/// What the adapter needs from the host framework, and nothing more.
pub trait UploadSource {
    /// Filesystem path of the file currently being processed.
    fn current_path(&self) -> &Path;

    /// Ensure the source file is locally materialized (e.g. pulled out of
    /// the host's cache) before it is decoded.
    fn cache_if_needed(&mut self) -> io::Result<()>;
}

/// An upload being processed: a source, a pipeline, and the pending chain.
pub struct Attachment<S: UploadSource, B: ImageBackend> {
    source: S,
    pipeline: Pipeline<B>,
    chain: OperationChain,
}

impl<S: UploadSource, B: ImageBackend> Attachment<S, B> {
    pub fn new(source: S, pipeline: Pipeline<B>) -> Self {
        let chain = pipeline.chain();
        Self {
            source,
            pipeline,
            chain,
        }
    }

    pub fn resize_to_fit(&mut self, width: u32, height: u32) -> &mut Self {
        self.chain.resize_to_fit(width, height);
        self
    }

    pub fn resize_to_fill(&mut self, width: u32, height: u32) -> &mut Self {
        self.chain.resize_to_fill(width, height);
        self
    }

    pub fn resize_to_limit(&mut self, width: u32, height: u32) -> &mut Self {
        self.chain.resize_to_limit(width, height);
        self
    }

    pub fn resize_and_pad(
        &mut self,
        width: u32,
        height: u32,
        background: Option<[u8; 4]>,
    ) -> &mut Self {
        self.chain.resize_and_pad(width, height, background);
        self
    }

    /// Request a format conversion. Rejected immediately when `format` is
    /// outside the configured allowed set.
    pub fn convert(&mut self, format: ImageFormat) -> Result<&mut Self, ChainError> {
        self.chain.convert(format)?;
        Ok(self)
    }

    pub fn convert_with_compression(
        &mut self,
        format: ImageFormat,
        compression: PngCompression,
    ) -> Result<&mut Self, ChainError> {
        self.chain.convert_with_compression(format, compression)?;
        Ok(self)
    }

    pub fn quality(&mut self, percent: u32) -> &mut Self {
        self.chain.quality(percent);
        self
    }

    pub fn strip(&mut self) -> &mut Self {
        self.chain.strip();
        self
    }

    pub fn auto_orient(&mut self) -> &mut Self {
        self.chain.auto_orient();
        self
    }

    /// Materialize the pending chain against the host's current file and
    /// publish atomically in place. Call once per upload-processing cycle;
    /// a second call finds nothing pending and does nothing.
    pub fn finalize_and_publish(&mut self) -> Result<PathBuf, ProcessingError> {
        self.source.cache_if_needed()?;
        let path = self.source.current_path().to_path_buf();
        self.pipeline.run(&path, &mut self.chain)
    }

    /// Output filename the host should store the file under, reflecting any
    /// format override from a `convert`.
    pub fn derived_filename(&self) -> Option<String> {
        format::derived_filename(self.source.current_path(), self.chain.format_override())
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
