//! Structural and border-transparency checks for generated sprite images.
//!
//! Validation never fails with an error: every problem found is collected
//! into a [`ValidationReport`] and the caller decides what to do with it.

use crate::config::ValidatorConfig;
use crate::sprite_image::{ImageMetadata, SpriteImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Dimensions an image is required to have. `None` skips the check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpectedSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ExpectedSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn any() -> Self {
        Self::default()
    }
}

/// Outcome of [`validate`]. Built fresh per call and not mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: ImageMetadata,
    /// Measured share of transparent border samples; `None` when the image
    /// has no alpha channel and the border was not sampled.
    pub transparent_percent: Option<f64>,
}

/// Result of sampling the border of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderSample {
    pub total: usize,
    pub transparent: usize,
}

impl BorderSample {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.transparent as f64 / self.total as f64 * 100.0
    }
}

/// Validate `image` against `expected` and the thresholds in `cfg`.
///
/// All checks run independently; a format problem does not hide a size
/// problem. `is_valid` is true exactly when no errors were recorded.
pub fn validate(
    image: &SpriteImage,
    expected: ExpectedSize,
    cfg: &ValidatorConfig,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let metadata = image.metadata();

    if image.format() != cfg.expected_format {
        errors.push(format!(
            "expected {} format, got {}",
            format_name(cfg.expected_format),
            format_name(image.format())
        ));
    }

    if metadata.channels != 4 {
        errors.push(format!(
            "expected 4 channels, got {}: missing alpha-capable channel layout",
            metadata.channels
        ));
    }

    if !metadata.has_alpha {
        errors.push("image has no alpha channel".to_string());
    }

    if let Some(w) = expected.width {
        if metadata.width != w {
            errors.push(format!(
                "width mismatch: expected {}, got {}",
                w, metadata.width
            ));
        }
    }
    if let Some(h) = expected.height {
        if metadata.height != h {
            errors.push(format!(
                "height mismatch: expected {}, got {}",
                h, metadata.height
            ));
        }
    }

    let mut transparent_percent = None;
    if metadata.has_alpha {
        let sample = sample_border(image, cfg.corner_sample_size, cfg.alpha_threshold);
        let pct = sample.percent();
        transparent_percent = Some(pct);
        debug!(
            total = sample.total,
            transparent = sample.transparent,
            percent = pct,
            "border sampled"
        );
        if pct < cfg.min_transparent_border_percent {
            errors.push("background is not transparent along the image border".to_string());
            errors.push(format!(
                "transparent border samples: {:.1}% (required >= {:.1}%)",
                pct, cfg.min_transparent_border_percent
            ));
        } else if sample.transparent < sample.total {
            warnings.push(format!(
                "{} of {} border samples are not transparent ({:.1}% transparent)",
                sample.total - sample.transparent,
                sample.total,
                pct
            ));
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        metadata,
        transparent_percent,
    }
}

/// Sample a `corner`-sized block at each corner plus every
/// `max(1, width / 20)`-th pixel along each edge.
///
/// Pixels shared by a corner block and an edge are counted once per sample
/// site. Images smaller than the corner block are sampled in full.
pub fn sample_border(image: &SpriteImage, corner: u32, alpha_threshold: u8) -> BorderSample {
    let (w, h) = image.dimensions();
    let mut sample = BorderSample {
        total: 0,
        transparent: 0,
    };
    if w == 0 || h == 0 {
        return sample;
    }
    let mut visit = |x: u32, y: u32| {
        sample.total += 1;
        if image.alpha(x, y) <= alpha_threshold {
            sample.transparent += 1;
        }
    };

    let cw = corner.min(w);
    let ch = corner.min(h);
    let origins = [(0, 0), (w - cw, 0), (0, h - ch), (w - cw, h - ch)];
    for (ox, oy) in origins {
        for y in oy..oy + ch {
            for x in ox..ox + cw {
                visit(x, y);
            }
        }
    }

    let step = (w / 20).max(1) as usize;
    for x in (0..w).step_by(step) {
        visit(x, 0);
        visit(x, h - 1);
    }
    for y in (0..h).step_by(step) {
        visit(0, y);
        visit(w - 1, y);
    }
    sample
}

fn format_name(fmt: image::ImageFormat) -> String {
    fmt.extensions_str()
        .first()
        .map(|s| s.to_ascii_uppercase())
        .unwrap_or_else(|| format!("{fmt:?}"))
}
