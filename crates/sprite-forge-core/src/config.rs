use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Border transparency thresholds used by [`crate::validate::validate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidatorConfig {
    /// Side length of the square block sampled at each corner.
    #[serde(default = "default_corner_sample_size")]
    pub corner_sample_size: u32,
    /// Alpha values at or below this count as transparent (0..=255).
    #[serde(default = "default_alpha_threshold")]
    pub alpha_threshold: u8,
    /// Minimum share of transparent border samples, in percent.
    #[serde(default = "default_min_transparent_border_percent")]
    pub min_transparent_border_percent: f64,
    /// Raster format every validated image must declare.
    #[serde(default = "default_expected_format", with = "format_name")]
    pub expected_format: ImageFormat,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            corner_sample_size: default_corner_sample_size(),
            alpha_threshold: default_alpha_threshold(),
            min_transparent_border_percent: default_min_transparent_border_percent(),
            expected_format: default_expected_format(),
        }
    }
}

impl ValidatorConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpriteForgeError;

        if self.corner_sample_size == 0 {
            return Err(SpriteForgeError::InvalidConfig(
                "corner_sample_size must be at least 1".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_transparent_border_percent) {
            return Err(SpriteForgeError::InvalidConfig(format!(
                "min_transparent_border_percent ({}) must be within 0..=100",
                self.min_transparent_border_percent
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PackerConfig {
    /// Pixels kept free around every frame, including the sheet edges.
    pub padding: u32,
    /// Row width limit in pixels; a frame that would cross it starts a new row.
    pub max_width: u32,
    /// Round sheet width and height up to powers of two independently.
    pub power_of_two: bool,
    /// Draw red outlines around placed frames (debug).
    #[serde(default)]
    pub outlines: bool,
    /// File name recorded in the atlas metadata for the sheet image.
    #[serde(default = "default_image_file_name")]
    pub image_file_name: String,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            padding: 2,
            max_width: 2048,
            power_of_two: false,
            outlines: false,
            image_file_name: default_image_file_name(),
        }
    }
}

impl PackerConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if `max_width` is zero or the padding on both sides
    /// of a row leaves no usable width.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpriteForgeError;

        if self.max_width == 0 {
            return Err(SpriteForgeError::InvalidConfig(
                "max_width must be greater than zero".into(),
            ));
        }
        if self.padding.saturating_mul(2) >= self.max_width {
            return Err(SpriteForgeError::InvalidConfig(format!(
                "padding ({}) * 2 leaves no usable width within max_width ({})",
                self.padding, self.max_width
            )));
        }
        Ok(())
    }

    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn max_width(mut self, v: u32) -> Self {
        self.cfg.max_width = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.cfg.power_of_two = v;
        self
    }
    pub fn outlines(mut self, v: bool) -> Self {
        self.cfg.outlines = v;
        self
    }
    pub fn image_file_name(mut self, v: impl Into<String>) -> Self {
        self.cfg.image_file_name = v.into();
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}

/// Background repair applied by the forge when a strip fails validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FixConfig {
    /// Attempt repair (alpha channel + corner color removal) on invalid strips.
    pub auto_fix: bool,
    /// Per-channel RGB distance treated as background.
    pub tolerance: u8,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            auto_fix: true,
            tolerance: 24,
        }
    }
}

/// Bounded retry for strip generation. Wait before retry `n` is `base_delay * n`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Slicer leniency. When `strict` is set, a strip whose size differs from
/// `frame_width * frame_count` x `frame_height` is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SliceOptions {
    pub strict: bool,
}

/// Everything the forge needs for one sprite build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ForgeConfig {
    #[serde(default)]
    pub validator: ValidatorConfig,
    #[serde(default)]
    pub packer: PackerConfig,
    #[serde(default)]
    pub fix: FixConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub slice: SliceOptions,
    /// Resize strips whose size differs from the expected one before slicing.
    #[serde(default)]
    pub resize_strips: bool,
}

impl ForgeConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        self.validator.validate()?;
        self.packer.validate()?;
        if self.retry.max_attempts == 0 {
            return Err(crate::error::SpriteForgeError::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_corner_sample_size() -> u32 {
    5
}
fn default_alpha_threshold() -> u8 {
    10
}
fn default_min_transparent_border_percent() -> f64 {
    95.0
}
fn default_expected_format() -> ImageFormat {
    ImageFormat::Png
}
fn default_image_file_name() -> String {
    "sheet.png".into()
}

mod format_name {
    use image::ImageFormat;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(fmt: &ImageFormat, s: S) -> Result<S::Ok, S::Error> {
        let ext = fmt.extensions_str().first().copied().unwrap_or("png");
        s.serialize_str(ext)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ImageFormat, D::Error> {
        let s = String::deserialize(d)?;
        ImageFormat::from_extension(&s)
            .ok_or_else(|| D::Error::custom(format!("unknown image format: {s}")))
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
