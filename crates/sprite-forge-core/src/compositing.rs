use image::{Rgba, RgbaImage};

/// Blit `src` into `canvas` with its top-left corner at (dx, dy), clipping
/// anything that falls outside the canvas, then optionally draw a red 1px
/// outline on the frame bounds for debugging.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32, outlines: bool) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();

    for yy in 0..sh {
        if dy + yy >= ch {
            break;
        }
        for xx in 0..sw {
            if dx + xx >= cw {
                break;
            }
            canvas.put_pixel(dx + xx, dy + yy, *src.get_pixel(xx, yy));
        }
    }

    if outlines && sw > 0 && sh > 0 {
        let red = Rgba([255, 0, 0, 255]);
        let bx = dx + sw - 1;
        let by = dy + sh - 1;
        for xx in 0..sw {
            if dx + xx < cw && dy < ch {
                canvas.put_pixel(dx + xx, dy, red);
            }
            if dx + xx < cw && by < ch {
                canvas.put_pixel(dx + xx, by, red);
            }
        }
        for yy in 0..sh {
            if dx < cw && dy + yy < ch {
                canvas.put_pixel(dx, dy + yy, red);
            }
            if bx < cw && dy + yy < ch {
                canvas.put_pixel(bx, dy + yy, red);
            }
        }
    }
}
