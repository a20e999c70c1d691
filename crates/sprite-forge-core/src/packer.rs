//! Row packer: frames sorted by height, laid out left to right in rows.
//!
//! No rotation, no reordering across rows and no bin search. The layout is a
//! pure function of the input sizes and order, so identical inputs give
//! identical sheets.

use crate::compositing::blit_rgba;
use crate::config::PackerConfig;
use crate::error::{Result, SpriteForgeError};
use crate::model::{
    Animation, AnimationIndex, Atlas, Frame, FrameRect, FrameRef, LayoutResult, SheetMeta,
};
use image::RgbaImage;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument};

/// Output of a packing run: the atlas and the animation grouping of its frames.
#[derive(Debug, Clone)]
pub struct PackOutput {
    pub atlas: Atlas,
    pub animations: AnimationIndex,
}

impl PackOutput {
    /// Computes packing statistics for this output.
    pub fn stats(&self) -> crate::model::PackStats {
        self.atlas.stats()
    }
}

/// Packs `frames` into a single sheet and builds the animation index.
///
/// Fails with [`SpriteForgeError::Empty`] for an empty batch and with
/// [`SpriteForgeError::DuplicateFrame`] when two frames share a name.
/// Frames wider than `max_width` are placed anyway on a row of their own.
#[instrument(skip_all, fields(frames = frames.len()))]
pub fn pack(frames: &[Frame], cfg: &PackerConfig) -> Result<PackOutput> {
    cfg.validate()?;
    if frames.is_empty() {
        return Err(SpriteForgeError::Empty);
    }
    let mut seen: HashSet<&str> = HashSet::with_capacity(frames.len());
    for f in frames {
        if !seen.insert(f.name.as_str()) {
            return Err(SpriteForgeError::DuplicateFrame(f.name.clone()));
        }
    }

    let sizes: Vec<(u32, u32)> = frames.iter().map(|f| f.image.dimensions()).collect();
    let layout = layout(&sizes, cfg)?;

    let mut canvas = RgbaImage::new(layout.sheet_width, layout.sheet_height);
    let mut rects = BTreeMap::new();
    for (frame, &(x, y)) in frames.iter().zip(&layout.positions) {
        let (w, h) = frame.image.dimensions();
        blit_rgba(&frame.image.to_rgba(), &mut canvas, x, y, cfg.outlines);
        rects.insert(
            frame.name.clone(),
            FrameRect {
                x,
                y,
                w,
                h,
                source_size: (w, h),
            },
        );
    }

    let atlas = Atlas {
        image: canvas,
        frames: rects,
        sheet: SheetMeta {
            width: layout.sheet_width,
            height: layout.sheet_height,
            image_file_name: cfg.image_file_name.clone(),
        },
    };
    let animations = build_animation_index(frames);
    debug!(
        width = atlas.sheet.width,
        height = atlas.sheet.height,
        animations = animations.len(),
        "sheet packed"
    );
    Ok(PackOutput { atlas, animations })
}

/// Computes positions for `(width, height)` sizes without touching pixels.
///
/// Positions are returned in the caller's order even though placement walks
/// the sizes sorted by height (descending, stable).
pub fn layout(sizes: &[(u32, u32)], cfg: &PackerConfig) -> Result<LayoutResult> {
    cfg.validate()?;
    if sizes.is_empty() {
        return Err(SpriteForgeError::Empty);
    }

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| sizes[b].1.cmp(&sizes[a].1));

    let pad = cfg.padding;
    let mut positions = vec![(0u32, 0u32); sizes.len()];
    let mut x = pad;
    let mut y = pad;
    let mut row_h = 0u32;
    let mut sheet_w = 0u32;
    let mut sheet_h = 0u32;
    for idx in order {
        let (w, h) = sizes[idx];
        // An empty row takes the frame whatever its width.
        if x > pad && x + w + pad > cfg.max_width {
            x = pad;
            y += row_h + pad;
            row_h = 0;
        }
        positions[idx] = (x, y);
        debug!(idx, x, y, w, h, "frame placed");
        sheet_w = sheet_w.max(x + w + pad);
        sheet_h = sheet_h.max(y + h + pad);
        x += w + pad;
        row_h = row_h.max(h);
    }

    let (sheet_width, sheet_height) = if cfg.power_of_two {
        round_sheet_size(sheet_w, sheet_h)
    } else {
        (sheet_w, sheet_h)
    };
    Ok(LayoutResult {
        positions,
        sheet_width,
        sheet_height,
    })
}

/// Groups frames by animation and orders each group by frame index.
///
/// Independent of the order `frames` arrive in. Unassigned frames are left
/// out of the index.
pub fn build_animation_index(frames: &[Frame]) -> AnimationIndex {
    let mut buckets: BTreeMap<&str, Vec<&Frame>> = BTreeMap::new();
    for f in frames {
        if let Some(anim) = f.animation.as_deref() {
            buckets.entry(anim).or_default().push(f);
        }
    }
    buckets
        .into_iter()
        .map(|(name, mut group)| {
            group.sort_by_key(|f| f.frame_index);
            let fps = group[0].frame_rate;
            let looping = group[0].looping;
            let refs = group
                .iter()
                .map(|f| FrameRef {
                    key: f.name.clone(),
                    frame: f.frame_index,
                })
                .collect();
            (
                name.to_string(),
                Animation {
                    fps,
                    looping,
                    frames: refs,
                },
            )
        })
        .collect()
}

/// Rounds both sheet dimensions up to powers of two, independently.
pub fn round_sheet_size(width: u32, height: u32) -> (u32, u32) {
    (next_pow2(width), next_pow2(height))
}

/// Smallest power of two >= `v` (1 for 0).
pub fn next_pow2(mut v: u32) -> u32 {
    if v <= 1 {
        return 1;
    }
    v -= 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v + 1
}
