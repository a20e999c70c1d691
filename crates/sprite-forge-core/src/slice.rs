use crate::config::SliceOptions;
use crate::error::{Result, SpriteForgeError};
use crate::model::Frame;
use crate::sprite_image::SpriteImage;
use tracing::{debug, instrument, warn};

/// Frames cut from one strip or grid plus any non-fatal problems noticed.
#[derive(Debug, Clone)]
pub struct SliceOutput {
    pub frames: Vec<Frame>,
    pub warnings: Vec<String>,
}

/// Cut a horizontal strip into up to `frame_count` frames of
/// `frame_width`x`frame_height`, left to right.
///
/// A strip whose size differs from `frame_width * frame_count` x
/// `frame_height` is still sliced and a warning recorded. Extraction stops
/// at the first frame whose rectangle leaves the strip, so the result may be
/// shorter than `frame_count`.
#[instrument(skip(strip))]
pub fn slice_strip(
    strip: &SpriteImage,
    frame_width: u32,
    frame_height: u32,
    frame_count: u32,
) -> SliceOutput {
    let mut warnings = Vec::new();
    let expected_w = frame_width.saturating_mul(frame_count);
    let (w, h) = strip.dimensions();
    if (w, h) != (expected_w, frame_height) {
        let msg = format!(
            "strip is {w}x{h}, expected {expected_w}x{frame_height} for {frame_count} frame(s)"
        );
        warn!("{msg}");
        warnings.push(msg);
    }

    if frame_width == 0 || frame_height == 0 {
        let msg = format!("frame size {frame_width}x{frame_height} is empty; nothing sliced");
        warn!("{msg}");
        warnings.push(msg);
        return SliceOutput {
            frames: Vec::new(),
            warnings,
        };
    }

    let fits = frame_count.min(w / frame_width);
    let mut frames = Vec::with_capacity(fits as usize);
    for i in 0..frame_count {
        let x = i.saturating_mul(frame_width);
        match strip.crop(x, 0, frame_width, frame_height) {
            Some(img) => frames.push(Frame::new(i, img)),
            None => {
                let msg = format!(
                    "frame {i} at x={x} exceeds strip bounds {w}x{h}; kept {} of {frame_count} frame(s)",
                    frames.len()
                );
                warn!("{msg}");
                warnings.push(msg);
                break;
            }
        }
    }
    debug!(extracted = frames.len(), "strip sliced");
    SliceOutput { frames, warnings }
}

/// Like [`slice_strip`], but rejects a size mismatch when `opts.strict` is set.
pub fn slice_strip_with(
    strip: &SpriteImage,
    frame_width: u32,
    frame_height: u32,
    frame_count: u32,
    opts: &SliceOptions,
) -> Result<SliceOutput> {
    let expected_width = frame_width.saturating_mul(frame_count);
    if opts.strict && strip.dimensions() != (expected_width, frame_height) {
        return Err(SpriteForgeError::StripSize {
            expected_width,
            expected_height: frame_height,
            actual_width: strip.width(),
            actual_height: strip.height(),
        });
    }
    Ok(slice_strip(strip, frame_width, frame_height, frame_count))
}

/// Cut a `columns` x `rows` grid. Frame indices run row-major; cells outside
/// the sheet are skipped (their index is not reused) and counted in a single
/// warning.
#[instrument(skip(sheet))]
pub fn slice_grid(
    sheet: &SpriteImage,
    frame_width: u32,
    frame_height: u32,
    columns: u32,
    rows: u32,
) -> SliceOutput {
    let mut warnings = Vec::new();
    let (w, h) = sheet.dimensions();
    let expected = (
        frame_width.saturating_mul(columns),
        frame_height.saturating_mul(rows),
    );
    if (w, h) != expected {
        let msg = format!(
            "sheet is {w}x{h}, expected {}x{} for a {columns}x{rows} grid",
            expected.0, expected.1
        );
        warn!("{msg}");
        warnings.push(msg);
    }

    if frame_width == 0 || frame_height == 0 {
        let msg = format!("frame size {frame_width}x{frame_height} is empty; nothing sliced");
        warn!("{msg}");
        warnings.push(msg);
        return SliceOutput {
            frames: Vec::new(),
            warnings,
        };
    }

    let fit_columns = columns.min(w / frame_width);
    let fit_rows = rows.min(h / frame_height);
    let mut frames = Vec::with_capacity(fit_columns as usize * fit_rows as usize);
    'rows: for row in 0..fit_rows {
        for col in 0..fit_columns {
            let index = u64::from(row) * u64::from(columns) + u64::from(col);
            let Ok(index) = u32::try_from(index) else {
                let msg = format!("cell ({col}, {row}) has no u32 frame index; grid cut short");
                warn!("{msg}");
                warnings.push(msg);
                break 'rows;
            };
            let (x, y) = (col * frame_width, row * frame_height);
            if let Some(img) = sheet.crop(x, y, frame_width, frame_height) {
                frames.push(Frame::new(index, img));
            }
        }
    }

    let requested = u64::from(columns) * u64::from(rows);
    let skipped = requested - u64::from(fit_columns) * u64::from(fit_rows);
    if skipped > 0 {
        let msg = format!(
            "{skipped} of {requested} cell(s) exceed sheet bounds {w}x{h}; skipped"
        );
        warn!("{msg}");
        warnings.push(msg);
    }
    debug!(extracted = frames.len(), "grid sliced");
    SliceOutput { frames, warnings }
}
