use crate::model::{AnimationIndex, Atlas};
use crate::validate::ValidationReport;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Frames keyed by name plus sheet meta.
/// Shape: `{ frames: { name: { frame, rotated, trimmed, spriteSourceSize, sourceSize } }, meta }`.
/// Compatible with engine loaders expecting TexturePacker-like JSON hash.
pub fn to_atlas_json(atlas: &Atlas) -> Value {
    let mut frames = serde_json::Map::new();
    for (name, fr) in &atlas.frames {
        let frame = json!({"x": fr.x, "y": fr.y, "w": fr.w, "h": fr.h});
        let sprite_source_size = json!({"x": 0, "y": 0, "w": fr.w, "h": fr.h});
        let source_size = json!({"w": fr.source_size.0, "h": fr.source_size.1});
        frames.insert(
            name.clone(),
            json!({
                "frame": frame,
                "rotated": false,
                "trimmed": false,
                "spriteSourceSize": sprite_source_size,
                "sourceSize": source_size,
            }),
        );
    }
    let meta = json!({
        "app": "sprite-forge",
        "version": env!("CARGO_PKG_VERSION"),
        "image": atlas.sheet.image_file_name,
        "format": "RGBA8888",
        "size": {"w": atlas.sheet.width, "h": atlas.sheet.height},
        "scale": "1",
    });
    json!({ "frames": frames, "meta": meta })
}

/// Animations keyed by name: `{ name: { fps, loop, frames: [{key, frame}] } }`.
pub fn to_animation_json(animations: &AnimationIndex) -> Value {
    serde_json::to_value(animations).unwrap_or_else(|_| json!({}))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pass,
    Fail,
}

/// One validated file in a [`ValidationDocument`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpriteValidation {
    pub file: String,
    pub status: ValidationStatus,
    pub alpha_channel_present: bool,
    /// Transparent border samples in percent (0 when the border was not sampled).
    pub transparent_pixels: f64,
    pub issues: Vec<String>,
}

impl SpriteValidation {
    pub fn from_report(file: impl Into<String>, report: &ValidationReport) -> Self {
        Self {
            file: file.into(),
            status: if report.is_valid {
                ValidationStatus::Pass
            } else {
                ValidationStatus::Fail
            },
            alpha_channel_present: report.metadata.has_alpha,
            transparent_pixels: report
                .transparent_percent
                .map(|p| (p * 100.0).round() / 100.0)
                .unwrap_or(0.0),
            issues: report.errors.clone(),
        }
    }
}

/// Validation summary written next to the generated sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationDocument {
    /// RFC 3339 timestamp of when the document was built.
    pub validated: String,
    pub sprites: Vec<SpriteValidation>,
}

impl ValidationDocument {
    /// Build a document stamped with the current UTC time.
    pub fn new<'a, I>(reports: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a ValidationReport)>,
    {
        Self {
            validated: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            sprites: reports
                .into_iter()
                .map(|(file, r)| SpriteValidation::from_report(file, r))
                .collect(),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.sprites
            .iter()
            .all(|s| s.status == ValidationStatus::Pass)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({}))
    }
}
