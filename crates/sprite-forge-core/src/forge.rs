//! Sprite build orchestration: fetch each animation strip from a caller
//! supplied source, check and repair it, slice it and pack every frame once.
//!
//! Fetching is the only fallible external step and is retried in a bounded
//! loop; everything after it is synchronous and works on in-memory buffers.

use crate::background::{dominant_corner_color, ensure_alpha_channel, remove_near_color_background};
use crate::config::{ForgeConfig, RetryConfig};
use crate::error::{Result, SpriteForgeError};
use crate::export::ValidationDocument;
use crate::model::{AnimationIndex, Atlas, Frame};
use crate::packer::pack;
use crate::slice::slice_strip_with;
use crate::sprite_image::SpriteImage;
use crate::sprite_spec::{AnimationSpec, SpriteSpec};
use crate::validate::{ExpectedSize, ValidationReport, validate};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Error type a [`StripSource`] may fail with.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// What to generate for one animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripRequest {
    pub sprite: String,
    pub animation: String,
    pub description: String,
    pub details: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frame_count: u32,
}

impl StripRequest {
    pub fn new(spec: &SpriteSpec, animation: &str, anim: &AnimationSpec) -> Self {
        Self {
            sprite: spec.name.clone(),
            animation: animation.to_string(),
            description: spec.character.description.clone(),
            details: spec.character.details.clone(),
            frame_width: spec.frame_width,
            frame_height: spec.frame_height,
            frame_count: anim.frames,
        }
    }

    /// Width of a strip holding every frame side by side.
    pub fn strip_width(&self) -> u32 {
        self.frame_width.saturating_mul(self.frame_count)
    }
}

/// Produces encoded strip images, e.g. by calling an image generation service.
///
/// `attempt` starts at 1 and grows with every retry of the same request.
pub trait StripSource {
    fn attempt(
        &mut self,
        request: &StripRequest,
        attempt: u32,
    ) -> std::result::Result<Vec<u8>, SourceError>;
}

impl<F> StripSource for F
where
    F: FnMut(&StripRequest, u32) -> std::result::Result<Vec<u8>, SourceError>,
{
    fn attempt(
        &mut self,
        request: &StripRequest,
        attempt: u32,
    ) -> std::result::Result<Vec<u8>, SourceError> {
        self(request, attempt)
    }
}

/// Fetch a strip, retrying up to `retry.max_attempts` times and sleeping
/// `base_delay * attempt` after each failure.
pub fn fetch_strip(
    source: &mut dyn StripSource,
    request: &StripRequest,
    retry: &RetryConfig,
) -> Result<Vec<u8>> {
    fetch_strip_with(source, request, retry, std::thread::sleep)
}

/// [`fetch_strip`] with an injectable sleep.
pub fn fetch_strip_with(
    source: &mut dyn StripSource,
    request: &StripRequest,
    retry: &RetryConfig,
    mut sleep: impl FnMut(Duration),
) -> Result<Vec<u8>> {
    let max = retry.max_attempts.max(1);
    let mut last = String::new();
    for attempt in 1..=max {
        match source.attempt(request, attempt) {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                last = e.to_string();
                warn!(
                    animation = %request.animation,
                    attempt,
                    max,
                    error = %last,
                    "strip generation attempt failed"
                );
                if attempt < max {
                    sleep(retry.base_delay * attempt);
                }
            }
        }
    }
    Err(SpriteForgeError::Generation {
        attempts: max,
        message: last,
    })
}

/// Per-animation record of what happened to its strip.
#[derive(Debug, Clone)]
pub struct AnimationReport {
    pub animation: String,
    /// Label used in the validation document (`{sprite}_{animation}.png`).
    pub file: String,
    /// Final validation (after repair when one was applied).
    pub report: ValidationReport,
    pub fixed: bool,
    pub slice_warnings: Vec<String>,
    pub frames: usize,
}

#[derive(Debug, Clone)]
pub struct ForgeOutput {
    pub atlas: Atlas,
    pub animations: AnimationIndex,
    pub reports: Vec<AnimationReport>,
}

impl ForgeOutput {
    pub fn validation_document(&self) -> ValidationDocument {
        ValidationDocument::new(
            self.reports
                .iter()
                .map(|r| (r.file.as_str(), &r.report)),
        )
    }
}

/// Builds the sheet for `spec`, one animation after another, then packs once.
#[instrument(skip_all, fields(sprite = %spec.name))]
pub fn forge(
    spec: &SpriteSpec,
    source: &mut dyn StripSource,
    cfg: &ForgeConfig,
) -> Result<ForgeOutput> {
    spec.validate()?;
    cfg.validate()?;

    let mut frames: Vec<Frame> = Vec::new();
    let mut reports = Vec::with_capacity(spec.animations.len());
    for (name, anim) in &spec.animations {
        let request = StripRequest::new(spec, name, anim);
        let bytes = fetch_strip(source, &request, &cfg.retry)?;
        let strip = SpriteImage::decode(&bytes)?;
        let (strip, report, fixed) = prepare_strip(strip, &request, cfg);
        if !report.is_valid {
            warn!(animation = %name, errors = ?report.errors, "strip failed validation");
        }

        let sliced = slice_strip_with(
            &strip,
            request.frame_width,
            request.frame_height,
            request.frame_count,
            &cfg.slice,
        )?;
        let count = sliced.frames.len();
        frames.extend(
            sliced
                .frames
                .into_iter()
                .map(|f| f.attach(name, anim.fps, anim.looping)),
        );
        info!(animation = %name, frames = count, fixed, "animation prepared");
        reports.push(AnimationReport {
            animation: name.clone(),
            file: format!("{}_{}.png", spec.name, name),
            report,
            fixed,
            slice_warnings: sliced.warnings,
            frames: count,
        });
    }

    let out = pack(&frames, &cfg.packer)?;
    Ok(ForgeOutput {
        atlas: out.atlas,
        animations: out.animations,
        reports,
    })
}

/// Resize (when enabled), validate and repair (when enabled and needed).
fn prepare_strip(
    strip: SpriteImage,
    request: &StripRequest,
    cfg: &ForgeConfig,
) -> (SpriteImage, ValidationReport, bool) {
    let expected_w = request.strip_width();
    let expected_h = request.frame_height;
    let strip = if cfg.resize_strips && strip.dimensions() != (expected_w, expected_h) {
        debug!(
            from = ?strip.dimensions(),
            to = ?(expected_w, expected_h),
            "resizing strip"
        );
        strip.resize_exact(expected_w, expected_h)
    } else {
        strip
    };
    let expected = ExpectedSize::new(expected_w, expected_h);
    let report = validate(&strip, expected, &cfg.validator);
    if report.is_valid || !cfg.fix.auto_fix {
        return (strip, report, false);
    }

    let mut fixed = ensure_alpha_channel(&strip);
    let border_ok = validate(&fixed, expected, &cfg.validator)
        .transparent_percent
        .is_some_and(|p| p >= cfg.validator.min_transparent_border_percent);
    if !border_ok {
        if let Some(bg) = dominant_corner_color(&fixed) {
            debug!(?bg, tolerance = cfg.fix.tolerance, "removing background color");
            fixed = remove_near_color_background(&fixed, bg, cfg.fix.tolerance);
        }
    }
    let report = validate(&fixed, expected, &cfg.validator);
    (fixed, report, true)
}
