use crate::sprite_image::SpriteImage;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// True if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// One animation step cut from a strip or grid.
///
/// Identity is `(animation, frame_index)`. A frame leaves the slicer without
/// an animation; [`Frame::attach`] assigns one together with the batch-unique
/// name used as the atlas key.
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub animation: Option<String>,
    pub frame_index: u32,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub looping: bool,
    pub image: SpriteImage,
}

impl Frame {
    /// Unassigned frame named `frame_{index}`.
    pub fn new(frame_index: u32, image: SpriteImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            name: format!("frame_{frame_index}"),
            animation: None,
            frame_index,
            width,
            height,
            frame_rate: 0,
            looping: true,
            image,
        }
    }

    /// Assign the frame to `animation`; the name becomes `{animation}_{index}`.
    pub fn attach(mut self, animation: &str, frame_rate: u32, looping: bool) -> Self {
        self.name = frame_name(animation, self.frame_index);
        self.animation = Some(animation.to_string());
        self.frame_rate = frame_rate;
        self.looping = looping;
        self
    }
}

/// Atlas key of frame `index` of `animation`.
pub fn frame_name(animation: &str, index: u32) -> String {
    format!("{animation}_{index}")
}

/// Frame placement as written to atlas metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Original frame size (frames are never trimmed, so equal to `w,h`).
    pub source_size: (u32, u32),
}

impl FrameRect {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

/// Sheet-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SheetMeta {
    pub width: u32,
    pub height: u32,
    pub image_file_name: String,
}

/// Packed sheet plus frame rectangles keyed by frame name.
#[derive(Debug, Clone)]
pub struct Atlas {
    pub image: RgbaImage,
    pub frames: BTreeMap<String, FrameRect>,
    pub sheet: SheetMeta,
}

/// Positions aligned 1:1 with the packer's input ordering, plus sheet size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutResult {
    pub positions: Vec<(u32, u32)>,
    pub sheet_width: u32,
    pub sheet_height: u32,
}

/// Reference to one frame of an animation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameRef {
    pub key: String,
    pub frame: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Animation {
    pub fps: u32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub frames: Vec<FrameRef>,
}

/// Animations keyed by name, frames sorted by index.
pub type AnimationIndex = BTreeMap<String, Animation>;

/// Statistics about sheet packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_frames: usize,
    /// Sheet area (width * height).
    pub sheet_area: u64,
    /// Sum of frame areas.
    pub used_frame_area: u64,
    /// used_frame_area / sheet_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl Atlas {
    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> PackStats {
        let sheet_area = (self.sheet.width as u64) * (self.sheet.height as u64);
        let used_frame_area: u64 = self
            .frames
            .values()
            .map(|f| (f.w as u64) * (f.h as u64))
            .sum();
        let occupancy = if sheet_area > 0 {
            used_frame_area as f64 / sheet_area as f64
        } else {
            0.0
        };
        PackStats {
            num_frames: self.frames.len(),
            sheet_area,
            used_frame_area,
            occupancy,
        }
    }
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Frames: {}, Occupancy: {:.2}%, Sheet Area: {} px², Used Area: {} px²",
            self.num_frames,
            self.occupancy * 100.0,
            self.sheet_area,
            self.used_frame_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.sheet_area.saturating_sub(self.used_frame_area)
    }
}
