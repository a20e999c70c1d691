//! Sprite specification documents (the input describing what to generate).

use crate::error::{Result, SpriteForgeError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

pub const FRAME_SIZE_RANGE: RangeInclusive<u32> = 16..=256;
pub const FRAME_COUNT_RANGE: RangeInclusive<u32> = 1..=16;
pub const FPS_RANGE: RangeInclusive<u32> = 1..=60;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterSpec {
    pub description: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnimationSpec {
    pub frames: u32,
    pub fps: u32,
    #[serde(rename = "loop", default = "default_loop")]
    pub looping: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpriteSpec {
    pub name: String,
    pub character: CharacterSpec,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Kept in document order; the forge fetches and packs in this order.
    pub animations: IndexMap<String, AnimationSpec>,
}

impl SpriteSpec {
    /// Parse a JSON document and check it with [`SpriteSpec::validate`].
    pub fn from_json(text: &str) -> Result<Self> {
        let spec: SpriteSpec = serde_json::from_str(text)
            .map_err(|e| SpriteForgeError::InvalidSpec(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks names and the documented ranges for sizes, frame counts and fps.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SpriteForgeError::InvalidSpec("name must not be empty".into()));
        }
        if !is_file_safe(&self.name) {
            return Err(SpriteForgeError::InvalidSpec(format!(
                "name {:?} may only contain letters, digits, '-' and '_'",
                self.name
            )));
        }
        check_range("frameWidth", self.frame_width, &FRAME_SIZE_RANGE)?;
        check_range("frameHeight", self.frame_height, &FRAME_SIZE_RANGE)?;
        if self.animations.is_empty() {
            return Err(SpriteForgeError::InvalidSpec(
                "at least one animation is required".into(),
            ));
        }
        for (name, anim) in &self.animations {
            if !is_file_safe(name) {
                return Err(SpriteForgeError::InvalidSpec(format!(
                    "animation name {name:?} may only contain letters, digits, '-' and '_'"
                )));
            }
            check_range(&format!("animations.{name}.frames"), anim.frames, &FRAME_COUNT_RANGE)?;
            check_range(&format!("animations.{name}.fps"), anim.fps, &FPS_RANGE)?;
        }
        Ok(())
    }
}

fn check_range(field: &str, v: u32, range: &RangeInclusive<u32>) -> Result<()> {
    if range.contains(&v) {
        Ok(())
    } else {
        Err(SpriteForgeError::InvalidSpec(format!(
            "{field} = {v} is outside {}..={}",
            range.start(),
            range.end()
        )))
    }
}

fn is_file_safe(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn default_loop() -> bool {
    true
}
