//! Lazy, ordered operation chains.
//!
//! Chain-building calls append [`Operation`]s without touching pixels;
//! [`OperationChain::finalize`] applies them in append order against a
//! decoded image exactly once and returns the accumulated write options.
//! The only eager work is `Convert` validation, which rejects formats
//! outside the configured allowed set at append time so bad requests
//! surface at the call site instead of at encode time.

use crate::config::PipelineConfig;
use crate::format::ImageFormat;
use crate::imaging::{
    BackendError, ImageHandle, PngCompression, Quality, ResizeMode, Rotation, compute_resize,
};
use thiserror::Error;

/// Errors surfaced while building a chain.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("unsupported format: {format} is not in the allowed set")]
    UnsupportedFormat { format: ImageFormat },
}

/// Errors surfaced while applying a chain to an image.
#[derive(Error, Debug)]
pub enum FinalizeError {
    /// The orientation tag held a value outside {1, 3, 6, 8}. Guessing a
    /// rotation here would silently corrupt the image, so it is an error.
    #[error("invalid EXIF orientation value: {value}")]
    InvalidOrientation { value: u16 },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One pending transformation step.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Resize {
        mode: ResizeMode,
        width: u32,
        height: u32,
        /// Pad-mode background override; the config default applies when
        /// unset.
        background: Option<[u8; 4]>,
    },
    Convert {
        format: ImageFormat,
        /// PNG-output compression override.
        compression: Option<PngCompression>,
    },
    Quality {
        percent: Quality,
    },
    Strip,
    AutoOrient,
}

/// Write options accumulated by a finalize pass, interpreted at encode time
/// against the final effective format.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EncodeSpec {
    /// Target format from the last `Convert`, if any.
    pub format: Option<ImageFormat>,
    pub quality: Option<Quality>,
    pub strip: bool,
    pub png_compression: Option<PngCompression>,
}

/// Append-only list of pending operations. Insertion order is execution
/// order. `finalize` drains the list, so a second finalize sees an empty
/// chain and does nothing.
#[derive(Debug, Clone)]
pub struct OperationChain {
    ops: Vec<Operation>,
    allowed_formats: Vec<ImageFormat>,
    format_override: Option<ImageFormat>,
}

impl OperationChain {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            ops: Vec::new(),
            allowed_formats: config.allowed_formats.clone(),
            format_override: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Format override from a completed `Convert` append. Survives
    /// finalize so output naming can be derived afterward.
    pub fn format_override(&self) -> Option<ImageFormat> {
        self.format_override
    }

    /// Append one operation. `Convert` is validated here, never deferred.
    pub fn append(&mut self, op: Operation) -> Result<&mut Self, ChainError> {
        if let Operation::Convert { format, .. } = &op {
            if !self.allowed_formats.contains(format) {
                return Err(ChainError::UnsupportedFormat { format: *format });
            }
            self.format_override = Some(*format);
        }
        self.ops.push(op);
        Ok(self)
    }

    fn push(&mut self, op: Operation) -> &mut Self {
        // Infallible variants only; Convert goes through append.
        self.append(op).expect("non-Convert append cannot fail")
    }

    pub fn resize_to_fit(&mut self, width: u32, height: u32) -> &mut Self {
        self.push(Operation::Resize {
            mode: ResizeMode::Fit,
            width,
            height,
            background: None,
        })
    }

    pub fn resize_to_fill(&mut self, width: u32, height: u32) -> &mut Self {
        self.push(Operation::Resize {
            mode: ResizeMode::Fill,
            width,
            height,
            background: None,
        })
    }

    pub fn resize_to_limit(&mut self, width: u32, height: u32) -> &mut Self {
        self.push(Operation::Resize {
            mode: ResizeMode::Limit,
            width,
            height,
            background: None,
        })
    }

    pub fn resize_and_pad(
        &mut self,
        width: u32,
        height: u32,
        background: Option<[u8; 4]>,
    ) -> &mut Self {
        self.push(Operation::Resize {
            mode: ResizeMode::Pad,
            width,
            height,
            background,
        })
    }

    pub fn convert(&mut self, format: ImageFormat) -> Result<&mut Self, ChainError> {
        self.append(Operation::Convert {
            format,
            compression: None,
        })
    }

    pub fn convert_with_compression(
        &mut self,
        format: ImageFormat,
        compression: PngCompression,
    ) -> Result<&mut Self, ChainError> {
        self.append(Operation::Convert {
            format,
            compression: Some(compression),
        })
    }

    pub fn quality(&mut self, percent: u32) -> &mut Self {
        self.push(Operation::Quality {
            percent: Quality::new(percent),
        })
    }

    pub fn strip(&mut self) -> &mut Self {
        self.push(Operation::Strip)
    }

    pub fn auto_orient(&mut self) -> &mut Self {
        self.push(Operation::AutoOrient)
    }

    /// Apply every pending operation to `image` in append order and return
    /// the accumulated write options. Consumes the pending list: calling
    /// again without further appends is a no-op returning an empty spec.
    pub fn finalize<H: ImageHandle>(
        &mut self,
        image: &mut H,
        config: &PipelineConfig,
    ) -> Result<EncodeSpec, FinalizeError> {
        let ops = std::mem::take(&mut self.ops);
        tracing::debug!(count = ops.len(), "applying operation chain");

        let mut spec = EncodeSpec::default();
        for op in &ops {
            match op {
                Operation::Resize {
                    mode,
                    width,
                    height,
                    background,
                } => {
                    apply_resize(image, config, *mode, (*width, *height), *background)?;
                }
                Operation::Convert {
                    format,
                    compression,
                } => {
                    spec.format = Some(*format);
                    if compression.is_some() {
                        spec.png_compression = *compression;
                    }
                }
                Operation::Quality { percent } => {
                    spec.quality = Some(*percent);
                }
                Operation::Strip => {
                    spec.strip = true;
                }
                Operation::AutoOrient => {
                    apply_auto_orient(image)?;
                }
            }
        }
        Ok(spec)
    }
}

/// Execute one resize step: plan from current dimensions, then scale,
/// sharpen, crop, and pad as the plan dictates.
fn apply_resize<H: ImageHandle>(
    image: &mut H,
    config: &PipelineConfig,
    mode: ResizeMode,
    target: (u32, u32),
    background: Option<[u8; 4]>,
) -> Result<(), FinalizeError> {
    let plan = compute_resize((image.width(), image.height()), target, mode);
    if plan.is_noop() {
        return Ok(());
    }
    if plan.ratio != 1.0 {
        image.resize(plan.ratio, plan.kernel)?;
    }
    if plan.sharpen
        && let Some(kernel) = config.sharpen_kernel()
    {
        image.convolve(&kernel)?;
    }
    if let Some(crop) = plan.crop {
        image.crop(crop)?;
    }
    if let Some(pad) = plan.pad {
        image.pad(pad, background.unwrap_or(config.pad_background))?;
    }
    Ok(())
}

/// Rotate per the orientation tag and clear it so downstream viewers never
/// rotate a second time. An absent tag is a no-op; an out-of-set value is
/// an error.
fn apply_auto_orient<H: ImageHandle>(image: &mut H) -> Result<(), FinalizeError> {
    let Some(value) = image.orientation() else {
        return Ok(());
    };
    match value {
        1 => {}
        6 => image.rotate(Rotation::Deg270)?,
        8 => image.rotate(Rotation::Deg180)?,
        3 => image.rotate(Rotation::Deg90)?,
        other => return Err(FinalizeError::InvalidOrientation { value: other }),
    }
    image.clear_orientation();
    Ok(())
}
