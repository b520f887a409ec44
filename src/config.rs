//! Pipeline configuration.
//!
//! Handles loading and validating `darkroom.toml`. Configuration is an
//! explicit value: it is injected into the executor at construction and
//! passed into every function that needs it — there is no process-wide
//! mutable state to race on. `PipelineConfig::default()` is the stock
//! instance for callers that don't need a file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # Formats `convert` may target.
//! allowed_formats = ["jpeg", "png"]
//!
//! # RGBA background for pad-mode resizes.
//! pad_background = [0, 0, 0, 255]
//!
//! [sharpen]
//! enabled = true                 # Sharpen after downscaling resizes
//! mask = [[-1, -1, -1],
//!         [-1, 24, -1],
//!         [-1, -1, -1]]          # 3x3 high-pass convolution
//! scale = 16                     # Mask divisor (non-zero)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! # Only widen the conversion allowlist
//! allowed_formats = ["jpeg", "png", "webp"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::format::ImageFormat;
use crate::imaging::SharpenKernel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Post-downscale sharpening settings.
    pub sharpen: SharpenConfig,
    /// Formats a `convert` operation may target.
    pub allowed_formats: Vec<ImageFormat>,
    /// RGBA background for pad-mode resizes.
    pub pad_background: [u8; 4],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sharpen: SharpenConfig::default(),
            allowed_formats: vec![ImageFormat::Jpeg, ImageFormat::Png],
            pad_background: [0, 0, 0, 255],
        }
    }
}

/// Sharpening configuration: an explicit mask + scale pair, or disabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SharpenConfig {
    pub enabled: bool,
    pub mask: [[i32; 3]; 3],
    pub scale: i32,
}

impl Default for SharpenConfig {
    fn default() -> Self {
        let kernel = SharpenKernel::classic();
        Self {
            enabled: true,
            mask: kernel.matrix,
            scale: kernel.scale,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sharpen.enabled && self.sharpen.scale == 0 {
            return Err(ConfigError::Validation(
                "sharpen.scale must be non-zero".to_string(),
            ));
        }
        if self.allowed_formats.is_empty() {
            return Err(ConfigError::Validation(
                "allowed_formats must not be empty".to_string(),
            ));
        }
        if self.allowed_formats.contains(&ImageFormat::Other) {
            return Err(ConfigError::Validation(
                "allowed_formats cannot include \"other\"".to_string(),
            ));
        }
        Ok(())
    }

    /// The active sharpen kernel, or `None` when sharpening is disabled.
    pub fn sharpen_kernel(&self) -> Option<SharpenKernel> {
        self.sharpen.enabled.then(|| SharpenKernel {
            matrix: self.sharpen.mask,
            scale: self.sharpen.scale,
        })
    }
}

/// A stock `darkroom.toml` with every option documented, for `gen-config`.
pub fn stock_config_toml() -> String {
    r#"# darkroom configuration
# All options are optional - defaults shown below.

# Formats `convert` may target. Requests outside this list are rejected
# at chain-build time.
allowed_formats = ["jpeg", "png"]

# RGBA background color for pad-mode resizes.
pad_background = [0, 0, 0, 255]

# Sharpening applied after downscaling resizes (never on upscale).
[sharpen]
enabled = true
mask = [[-1, -1, -1], [-1, 24, -1], [-1, -1, -1]]
scale = 16
"#
    .to_string()
}
