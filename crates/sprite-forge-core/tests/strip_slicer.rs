use image::{Rgba, RgbaImage};
use sprite_forge_core::prelude::*;
use sprite_forge_core::slice_strip_with;

/// Strip of `count` frames, each filled with a color derived from its index.
fn colored_strip(frame_w: u32, frame_h: u32, count: u32, extra_w: u32) -> SpriteImage {
    let mut img = RgbaImage::new(frame_w * count + extra_w, frame_h);
    for (x, _y, px) in img.enumerate_pixels_mut() {
        let i = (x / frame_w) as u8;
        *px = Rgba([i * 40, 0, 0, 255]);
    }
    SpriteImage::from_rgba(img)
}

#[test]
fn four_frame_strip_yields_four_64px_frames() {
    let strip = colored_strip(64, 64, 4, 0);
    let out = slice_strip(&strip, 64, 64, 4);
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    assert_eq!(out.frames.len(), 4);
    for (i, f) in out.frames.iter().enumerate() {
        assert_eq!(f.frame_index, i as u32);
        assert_eq!((f.width, f.height), (64, 64));
        assert_eq!(f.image.dimensions(), (64, 64));
        assert_eq!(f.image.pixel(0, 0)[0], i as u8 * 40);
        assert_eq!(f.image.pixel(63, 63)[0], i as u8 * 40);
        assert!(f.animation.is_none());
    }
}

#[test]
fn wider_strip_warns_but_slices_all_frames() {
    let strip = colored_strip(32, 32, 3, 7);
    let out = slice_strip(&strip, 32, 32, 3);
    assert_eq!(out.frames.len(), 3);
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("103x32"), "{:?}", out.warnings);
}

#[test]
fn narrow_strip_stops_at_first_out_of_bounds_frame() {
    // room for two and a half frames
    let strip = SpriteImage::from_rgba(RgbaImage::new(80, 32));
    let out = slice_strip(&strip, 32, 32, 4);
    assert_eq!(out.frames.len(), 2);
    assert_eq!(out.warnings.len(), 2);
    assert!(out.warnings[1].contains("frame 2"));
}

#[test]
fn short_strip_yields_no_frames_without_error() {
    let strip = SpriteImage::from_rgba(RgbaImage::new(128, 20));
    let out = slice_strip(&strip, 32, 32, 4);
    assert!(out.frames.is_empty());
    assert!(!out.warnings.is_empty());
}

#[test]
fn strict_mode_rejects_mismatch() {
    let strip = SpriteImage::from_rgba(RgbaImage::new(100, 32));
    let err = slice_strip_with(&strip, 32, 32, 3, &SliceOptions { strict: true })
        .expect_err("strict");
    match err {
        SpriteForgeError::StripSize {
            expected_width,
            actual_width,
            ..
        } => {
            assert_eq!(expected_width, 96);
            assert_eq!(actual_width, 100);
        }
        other => panic!("unexpected error: {other}"),
    }
    let lenient = slice_strip_with(&strip, 32, 32, 3, &SliceOptions::default()).expect("lenient");
    assert_eq!(lenient.frames.len(), 3);
}

#[test]
fn frames_are_independent_of_the_strip_and_each_other() {
    let strip = colored_strip(16, 16, 3, 0);
    let a = slice_strip(&strip, 16, 16, 3);
    let b = slice_strip(&strip, 16, 16, 3);
    for (fa, fb) in a.frames.iter().zip(&b.frames) {
        assert_eq!(fa.image, fb.image);
    }
    let bytes = a.frames[1].image.encode_png().expect("encode");
    let decoded = SpriteImage::decode(&bytes).expect("decode");
    assert_eq!(decoded.dimensions(), (16, 16));
    assert_eq!(decoded.pixel(5, 5), [40, 0, 0, 255]);
}

#[test]
fn grid_slices_row_major_and_skips_missing_cells() {
    // 3 columns x 2 rows of 10x10, but the sheet lacks the last column of row 2
    let mut img = RgbaImage::new(30, 20);
    for (x, y, px) in img.enumerate_pixels_mut() {
        *px = Rgba([(x / 10) as u8, (y / 10) as u8, 0, 255]);
    }
    let sheet = SpriteImage::from_rgba(img);
    let out = slice_grid(&sheet, 10, 10, 3, 2);
    assert_eq!(out.frames.len(), 6);
    assert!(out.warnings.is_empty());
    assert_eq!(out.frames[4].frame_index, 4);
    assert_eq!(out.frames[4].image.pixel(0, 0), [1, 1, 0, 255]);

    let out = slice_grid(&sheet, 10, 10, 4, 3);
    // 3x2 cells fit; the other 6 are skipped
    assert_eq!(out.frames.len(), 6);
    let indices: Vec<u32> = out.frames.iter().map(|f| f.frame_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 4, 5, 6]);
    // one size warning plus one summary of the skipped cells
    assert_eq!(out.warnings.len(), 2);
    assert!(out.warnings[1].starts_with("6 of 12 cell(s)"), "{:?}", out.warnings);
}

#[test]
fn huge_frame_count_stops_at_strip_edge() {
    let strip = colored_strip(16, 16, 4, 0);
    let out = slice_strip(&strip, 16, 16, u32::MAX);
    assert_eq!(out.frames.len(), 4);
    assert_eq!(out.warnings.len(), 2);
    assert!(out.warnings[1].contains("frame 4"), "{:?}", out.warnings);
}

#[test]
fn huge_grid_only_visits_cells_on_the_sheet() {
    let sheet = colored_strip(16, 16, 1, 0);
    let out = slice_grid(&sheet, 16, 16, 70_000, 70_000);
    assert_eq!(out.frames.len(), 1);
    assert_eq!(out.frames[0].frame_index, 0);
    assert_eq!(out.warnings.len(), 2);
    assert!(
        out.warnings[1].starts_with("4899999999 of 4900000000 cell(s)"),
        "{:?}",
        out.warnings
    );

    let out = slice_grid(&sheet, 16, 16, 70_000, 2);
    assert_eq!(out.frames.len(), 1);
    assert_eq!(out.warnings.len(), 2);
}

#[test]
fn zero_sized_frames_produce_nothing() {
    let strip = colored_strip(16, 16, 4, 0);
    let out = slice_strip(&strip, 0, 16, u32::MAX);
    assert!(out.frames.is_empty());
    assert!(out.warnings.iter().any(|w| w.contains("is empty")));

    let out = slice_grid(&strip, 16, 0, 4, 4);
    assert!(out.frames.is_empty());
    assert!(out.warnings.iter().any(|w| w.contains("is empty")));
}

#[test]
fn attach_names_frames_by_animation() {
    let strip = colored_strip(8, 8, 2, 0);
    let frames: Vec<Frame> = slice_strip(&strip, 8, 8, 2)
        .frames
        .into_iter()
        .map(|f| f.attach("walk", 12, false))
        .collect();
    assert_eq!(frames[0].name, "walk_0");
    assert_eq!(frames[1].name, "walk_1");
    assert_eq!(frames[1].animation.as_deref(), Some("walk"));
    assert_eq!(frames[1].frame_rate, 12);
    assert!(!frames[1].looping);
}
