//! Pure resize-policy calculations.
//!
//! All functions here are pure and testable without any I/O or images.
//! [`compute_resize`] turns (current size, target size, mode) into a
//! [`ResizePlan`] — the chain executes plans, it never does geometry itself.

/// Aspect-ratio-preserving resize policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// Scale so the whole image fits inside the target box; one dimension
    /// may come up short.
    Fit,
    /// Scale so the image covers the target box, then center-crop to
    /// exactly the target.
    Fill,
    /// Like `Fit`, but never upscale: a target at least as large as the
    /// source in both dimensions leaves the image untouched.
    Limit,
    /// Like `Fit`, then pad to exactly the target box with a background
    /// color.
    Pad,
}

/// Resampling kernel classes. Which concrete filter a backend maps these to
/// is its business; the policy is cheap-for-upscale, smooth-for-downscale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleKernel {
    /// Nearest-neighbor class. Used when enlarging — smooth kernels buy
    /// nothing over the source's real resolution.
    Nearest,
    /// Bicubic class. Used when shrinking, paired with optional sharpening.
    CatmullRom,
}

/// A rectangular extraction region on the scaled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Canvas size and centered paste offset for pad mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadSpec {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub top: u32,
}

/// Everything a single resize operation needs to execute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizePlan {
    /// Uniform scale factor. Exactly 1.0 means the scaling step is skipped.
    pub ratio: f64,
    /// Kernel to use when the scaling step runs.
    pub kernel: ResampleKernel,
    /// Dimensions after scaling (equals the input when `ratio == 1.0`).
    pub scaled: (u32, u32),
    /// Center crop to apply after scaling (Fill only).
    pub crop: Option<CropRegion>,
    /// Padding canvas to apply after scaling (Pad only).
    pub pad: Option<PadSpec>,
    /// Whether the post-downscale sharpen pass applies. Never set for
    /// upscales or for `ratio == 1.0`.
    pub sharpen: bool,
}

impl ResizePlan {
    /// True when executing the plan would change nothing. Callers must
    /// short-circuit on this rather than round-tripping pixels.
    pub fn is_noop(&self) -> bool {
        self.ratio == 1.0 && self.crop.is_none() && self.pad.is_none()
    }
}

/// Compute the plan for resizing `current` toward `target` under `mode`.
///
/// Invariant: emitted crop and pad geometry never requests a region larger
/// than the scaled image. Rounding in the scale step can leave a dimension
/// fractionally short of the target; the plan clamps instead of failing.
///
/// # Examples
/// ```
/// # use darkroom::imaging::{compute_resize, ResizeMode};
/// // 640x480 fit into 200x200 → 200x150
/// let plan = compute_resize((640, 480), (200, 200), ResizeMode::Fit);
/// assert_eq!(plan.scaled, (200, 150));
///
/// // Limit never upscales
/// let plan = compute_resize((640, 480), (1000, 1000), ResizeMode::Limit);
/// assert!(plan.is_noop());
/// ```
pub fn compute_resize(current: (u32, u32), target: (u32, u32), mode: ResizeMode) -> ResizePlan {
    let (cur_w, cur_h) = current;
    let (tgt_w, tgt_h) = target;

    let width_ratio = tgt_w as f64 / cur_w as f64;
    let height_ratio = tgt_h as f64 / cur_h as f64;

    let ratio = match mode {
        ResizeMode::Fill => width_ratio.max(height_ratio),
        ResizeMode::Limit if tgt_w >= cur_w && tgt_h >= cur_h => 1.0,
        ResizeMode::Fit | ResizeMode::Limit | ResizeMode::Pad => width_ratio.min(height_ratio),
    };

    let scaled = if ratio == 1.0 {
        current
    } else {
        (scale_dim(cur_w, ratio), scale_dim(cur_h, ratio))
    };

    let kernel = if ratio > 1.0 {
        ResampleKernel::Nearest
    } else {
        ResampleKernel::CatmullRom
    };

    let crop = match mode {
        ResizeMode::Fill => fill_crop(scaled, target),
        _ => None,
    };

    let pad = match mode {
        ResizeMode::Pad if scaled != target => Some(PadSpec {
            width: tgt_w,
            height: tgt_h,
            left: tgt_w.saturating_sub(scaled.0) / 2,
            top: tgt_h.saturating_sub(scaled.1) / 2,
        }),
        _ => None,
    };

    ResizePlan {
        ratio,
        kernel,
        scaled,
        crop,
        pad,
        sharpen: ratio < 1.0,
    }
}

fn scale_dim(dim: u32, ratio: f64) -> u32 {
    ((dim as f64 * ratio).round() as u32).max(1)
}

/// Centered crop bringing `scaled` down to `target`, or `None` when the
/// scaled image already is the target.
///
/// Extraction size is clamped to the scaled image: the max-ratio scale
/// guarantees coverage up to rounding, and the half-pixel shortfalls that
/// rounding produces must shrink the crop, not fail it.
fn fill_crop(scaled: (u32, u32), target: (u32, u32)) -> Option<CropRegion> {
    let (scaled_w, scaled_h) = scaled;
    let (tgt_w, tgt_h) = target;

    let width = tgt_w.min(scaled_w);
    let height = tgt_h.min(scaled_h);

    let (left, top) = if scaled_w > tgt_w {
        ((scaled_w - tgt_w) / 2, 0)
    } else if scaled_h > tgt_h {
        (0, (scaled_h - tgt_h) / 2)
    } else {
        (0, 0)
    };

    if left == 0 && top == 0 && (width, height) == scaled {
        return None;
    }
    Some(CropRegion {
        left,
        top,
        width,
        height,
    })
}
