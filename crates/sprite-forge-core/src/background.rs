//! Best-effort background repair. Callers re-validate afterwards; nothing here
//! guarantees a passing report.

use crate::sprite_image::SpriteImage;
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Promote a 3-channel image to RGBA with opaque alpha. A 4-channel image is
/// returned as a normalized RGBA PNG. Applying it twice changes nothing.
pub fn ensure_alpha_channel(image: &SpriteImage) -> SpriteImage {
    SpriteImage::from_rgba(image.to_rgba())
}

/// Clear alpha on every pixel whose RGB value is within `tolerance` of
/// `target` on all three channels. Other pixels are copied unchanged.
///
/// The output always has an alpha channel.
pub fn remove_near_color_background(
    image: &SpriteImage,
    target: [u8; 3],
    tolerance: u8,
) -> SpriteImage {
    let mut rgba: RgbaImage = image.to_rgba();
    let mut cleared = 0usize;
    for Rgba(px) in rgba.pixels_mut() {
        let near = px[0].abs_diff(target[0]) <= tolerance
            && px[1].abs_diff(target[1]) <= tolerance
            && px[2].abs_diff(target[2]) <= tolerance;
        if near {
            px[3] = 0;
            cleared += 1;
        }
    }
    debug!(?target, tolerance, cleared, "background pixels cleared");
    SpriteImage::from_rgba(rgba)
}

/// Most frequent RGB value among the four corner pixels. Ties go to the
/// earliest corner in top-left, top-right, bottom-left, bottom-right order.
pub fn dominant_corner_color(image: &SpriteImage) -> Option<[u8; 3]> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let corners = [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)].map(|(x, y)| {
        let p = image.pixel(x, y);
        [p[0], p[1], p[2]]
    });
    let mut best = corners[0];
    let mut best_count = 0;
    for c in &corners {
        let count = corners.iter().filter(|o| *o == c).count();
        if count > best_count {
            best = *c;
            best_count = count;
        }
    }
    Some(best)
}
