use crate::error::{Result, SpriteForgeError};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Size/layout facts about a decoded image, as reported by validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub has_alpha: bool,
    pub byte_size: usize,
}

/// Immutable decoded image.
///
/// Pixels are row-major with 4 bytes per pixel when the source carried an
/// alpha-capable color type and 3 bytes otherwise. Every transform returns a
/// new `SpriteImage`; none mutate in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    format: ImageFormat,
    byte_size: usize,
}

impl SpriteImage {
    /// Decode an encoded buffer (format guessed from its magic bytes).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(SpriteForgeError::InvalidInput("empty image buffer".into()));
        }
        let format = image::guess_format(bytes)?;
        let dyn_img = image::load_from_memory_with_format(bytes, format)?;
        let mut out = Self::from_dynamic(dyn_img);
        out.format = format;
        out.byte_size = bytes.len();
        Ok(out)
    }

    /// Read and decode a file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    /// Wrap an in-memory RGBA buffer. Declared format is PNG.
    pub fn from_rgba(rgba: RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();
        let pixels = rgba.into_raw();
        Self {
            byte_size: pixels.len(),
            pixels,
            width,
            height,
            channels: 4,
            format: ImageFormat::Png,
        }
    }

    /// Wrap an in-memory RGB buffer (no alpha). Declared format is PNG.
    pub fn from_rgb(rgb: RgbImage) -> Self {
        let (width, height) = rgb.dimensions();
        let pixels = rgb.into_raw();
        Self {
            byte_size: pixels.len(),
            pixels,
            width,
            height,
            channels: 3,
            format: ImageFormat::Png,
        }
    }

    fn from_dynamic(img: DynamicImage) -> Self {
        if img.color().has_alpha() {
            Self::from_rgba(img.to_rgba8())
        } else {
            Self::from_rgb(img.to_rgb8())
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Format the image was decoded from (PNG for in-memory images).
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Raw row-major pixel bytes (`channels()` bytes per pixel).
    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn metadata(&self) -> ImageMetadata {
        ImageMetadata {
            width: self.width,
            height: self.height,
            channels: self.channels,
            has_alpha: self.has_alpha(),
            byte_size: self.byte_size,
        }
    }

    /// RGBA value at `(x, y)`; 3-channel images report alpha 255.
    /// Panics if the coordinate is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        let c = self.channels as usize;
        let i = (y as usize * self.width as usize + x as usize) * c;
        let p = &self.pixels[i..i + c];
        if c == 4 {
            [p[0], p[1], p[2], p[3]]
        } else {
            [p[0], p[1], p[2], 255]
        }
    }

    #[inline]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixel(x, y)[3]
    }

    /// Copy into an RGBA8 buffer (adds opaque alpha when missing).
    pub fn to_rgba(&self) -> RgbaImage {
        if self.channels == 4 {
            RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
                .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
        } else {
            let mut out = RgbaImage::new(self.width, self.height);
            for (dst, src) in out.pixels_mut().zip(self.pixels.chunks_exact(3)) {
                dst.0 = [src[0], src[1], src[2], 255];
            }
            out
        }
    }

    fn to_dynamic(&self) -> DynamicImage {
        if self.channels == 4 {
            DynamicImage::ImageRgba8(self.to_rgba())
        } else {
            let rgb = RgbImage::from_raw(self.width, self.height, self.pixels.clone())
                .unwrap_or_else(|| RgbImage::new(self.width, self.height));
            DynamicImage::ImageRgb8(rgb)
        }
    }

    /// Encode as PNG, keeping the channel layout.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.to_dynamic().write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Copy the `w`x`h` region at `(x, y)`. Returns `None` if the region does
    /// not lie fully inside the image.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Option<SpriteImage> {
        let right = x.checked_add(w)?;
        let bottom = y.checked_add(h)?;
        if right > self.width || bottom > self.height {
            return None;
        }
        let c = self.channels as usize;
        let stride = self.width as usize * c;
        let mut pixels = Vec::with_capacity(w as usize * h as usize * c);
        for row in y..bottom {
            let start = row as usize * stride + x as usize * c;
            pixels.extend_from_slice(&self.pixels[start..start + w as usize * c]);
        }
        Some(SpriteImage {
            byte_size: pixels.len(),
            pixels,
            width: w,
            height: h,
            channels: self.channels,
            format: ImageFormat::Png,
        })
    }

    /// Nearest-neighbour resize to exactly `w`x`h` (keeps pixel-art edges hard).
    pub fn resize_exact(&self, w: u32, h: u32) -> SpriteImage {
        if (w, h) == (self.width, self.height) {
            return self.clone();
        }
        match self.to_dynamic() {
            DynamicImage::ImageRgb8(rgb) => {
                Self::from_rgb(imageops::resize(&rgb, w, h, FilterType::Nearest))
            }
            other => Self::from_rgba(imageops::resize(
                &other.to_rgba8(),
                w,
                h,
                FilterType::Nearest,
            )),
        }
    }
}
