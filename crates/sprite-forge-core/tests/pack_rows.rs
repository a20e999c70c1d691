use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use sprite_forge_core::prelude::*;
use sprite_forge_core::{next_pow2, round_sheet_size};

fn solid_frame(anim: &str, index: u32, w: u32, h: u32, rgba: [u8; 4]) -> Frame {
    let img = SpriteImage::from_rgba(RgbaImage::from_pixel(w, h, Rgba(rgba)));
    Frame::new(index, img).attach(anim, 8, true)
}

fn is_pow2(v: u32) -> bool {
    v != 0 && (v & (v - 1)) == 0
}

/// Strip of four 64x64 frames with a 5px transparent margin around each.
fn scenario_frames() -> Vec<Frame> {
    let mut strip = RgbaImage::new(256, 64);
    for (x, y, px) in strip.enumerate_pixels_mut() {
        let (fx, fy) = (x % 64, y);
        if (5..59).contains(&fx) && (5..59).contains(&fy) {
            *px = Rgba([(x / 64) as u8 * 50 + 10, 100, 100, 255]);
        }
    }
    let strip = SpriteImage::from_rgba(strip);
    let report = validate(&strip, ExpectedSize::new(256, 64), &ValidatorConfig::default());
    assert!(report.is_valid, "{:?}", report.errors);
    let sliced = slice_strip(&strip, 64, 64, 4);
    assert_eq!(sliced.frames.len(), 4);
    sliced
        .frames
        .into_iter()
        .map(|f| f.attach("idle", 6, true))
        .collect()
}

#[test]
fn strip_scenario_positions() {
    let cfg = PackerConfig::builder().padding(2).max_width(2048).build();
    let frames = scenario_frames();
    let out = pack(&frames, &cfg).expect("pack");
    let pos = |name: &str| {
        let r = out.atlas.frames[name];
        (r.x, r.y)
    };
    assert_eq!(pos("idle_0"), (2, 2));
    assert_eq!(pos("idle_1"), (68, 2));
    assert_eq!(pos("idle_2"), (134, 2));
    assert_eq!(pos("idle_3"), (200, 2));
    // every frame lies inside the sheet, with the padding kept on the far edges
    assert_eq!((out.atlas.sheet.width, out.atlas.sheet.height), (266, 68));
    assert_eq!(out.atlas.image.dimensions(), (266, 68));

    // pixels landed where the metadata says
    let r = out.atlas.frames["idle_3"];
    assert_eq!(out.atlas.image.get_pixel(r.x + 10, r.y + 10).0, [160, 100, 100, 255]);
    assert_eq!(out.atlas.image.get_pixel(r.x, r.y).0[3], 0);
    assert_eq!(out.atlas.image.get_pixel(0, 0).0, [0, 0, 0, 0]);
}

#[test]
fn pow2_rounding_of_reference_sheet() {
    assert_eq!(round_sheet_size(202, 66), (256, 128));
    assert_eq!(round_sheet_size(256, 128), (256, 128));
    assert_eq!(next_pow2(1), 1);
    assert_eq!(next_pow2(0), 1);
    assert_eq!(next_pow2(1025), 2048);
}

#[test]
fn pow2_sheet_dimensions() {
    let cfg = PackerConfig::builder().padding(2).pow2(true).build();
    let out = pack(&scenario_frames(), &cfg).expect("pack");
    assert_eq!((out.atlas.sheet.width, out.atlas.sheet.height), (512, 128));
    assert!(is_pow2(out.atlas.image.width()));
    assert!(is_pow2(out.atlas.image.height()));
}

#[test]
fn empty_input_fails_with_no_frames() {
    let err = pack(&[], &PackerConfig::default()).expect_err("empty");
    assert!(matches!(err, SpriteForgeError::Empty));
    assert!(err.to_string().contains("No frames"));
    assert!(matches!(
        layout(&[], &PackerConfig::default()),
        Err(SpriteForgeError::Empty)
    ));
}

#[test]
fn duplicate_names_are_rejected() {
    let frames = vec![
        solid_frame("walk", 0, 8, 8, [1, 1, 1, 255]),
        solid_frame("walk", 0, 8, 8, [2, 2, 2, 255]),
    ];
    match pack(&frames, &PackerConfig::default()) {
        Err(SpriteForgeError::DuplicateFrame(name)) => assert_eq!(name, "walk_0"),
        other => panic!("expected duplicate error, got {:?}", other.map(|o| o.atlas.sheet)),
    }
}

#[test]
fn taller_frames_are_placed_first_but_keys_follow_callers() {
    let frames = vec![
        solid_frame("a", 0, 10, 10, [255, 0, 0, 255]),
        solid_frame("b", 0, 10, 30, [0, 255, 0, 255]),
        solid_frame("c", 0, 10, 20, [0, 0, 255, 255]),
    ];
    let cfg = PackerConfig::builder().padding(1).build();
    let out = pack(&frames, &cfg).expect("pack");
    let rect = |k: &str| out.atlas.frames[k];
    assert_eq!((rect("b_0").x, rect("b_0").y), (1, 1));
    assert_eq!((rect("c_0").x, rect("c_0").y), (12, 1));
    assert_eq!((rect("a_0").x, rect("a_0").y), (23, 1));
    assert_eq!(rect("b_0").h, 30);
    assert_eq!(out.atlas.image.get_pixel(24, 2).0, [255, 0, 0, 255]);
    assert_eq!(out.atlas.image.get_pixel(2, 2).0, [0, 255, 0, 255]);
}

#[test]
fn rows_wrap_at_max_width() {
    let sizes = vec![(40, 20); 5];
    let cfg = PackerConfig::builder().padding(2).max_width(100).build();
    let l = layout(&sizes, &cfg).expect("layout");
    // 2 + 40 + 2 + 40 + 2 = 86; a third frame would need 128
    assert_eq!(l.positions[0], (2, 2));
    assert_eq!(l.positions[1], (44, 2));
    assert_eq!(l.positions[2], (2, 24));
    assert_eq!(l.positions[3], (44, 24));
    assert_eq!(l.positions[4], (2, 46));
    assert_eq!((l.sheet_width, l.sheet_height), (86, 68));
}

#[test]
fn oversized_frame_is_still_placed() {
    let sizes = vec![(300, 10), (20, 10)];
    let cfg = PackerConfig::builder().padding(2).max_width(128).build();
    let l = layout(&sizes, &cfg).expect("layout");
    assert_eq!(l.positions[0], (2, 2));
    assert_eq!(l.positions[1], (2, 14));
    assert_eq!(l.sheet_width, 304);
}

#[test]
fn random_sets_are_disjoint_with_padding_gap() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(2024);
    for &pad in &[0u32, 1, 2, 5] {
        let sizes: Vec<(u32, u32)> = (0..200)
            .map(|_| (rng.gen_range(1..=64), rng.gen_range(1..=64)))
            .collect();
        let cfg = PackerConfig::builder().padding(pad).max_width(512).build();
        let l = layout(&sizes, &cfg).expect("layout");
        assert!(l.sheet_width <= cfg.max_width);

        let rects: Vec<Rect> = sizes
            .iter()
            .zip(&l.positions)
            .map(|(&(w, h), &(x, y))| Rect::new(x, y, w, h))
            .collect();
        for (i, a) in rects.iter().enumerate() {
            assert!(a.x >= pad && a.y >= pad);
            assert!(a.x + a.w + pad <= l.sheet_width);
            assert!(a.y + a.h + pad <= l.sheet_height);
            // grow by the padding: grown rect must still not touch any neighbour
            let grown = Rect::new(a.x - pad, a.y - pad, a.w + pad, a.h + pad);
            for b in rects.iter().skip(i + 1) {
                assert!(!a.intersects(b), "overlap: {a:?} vs {b:?}");
                let b_grown = Rect::new(b.x - pad, b.y - pad, b.w + pad, b.h + pad);
                assert!(!grown.intersects(b), "padding gap violated: {a:?} vs {b:?}");
                assert!(!b_grown.intersects(a), "padding gap violated: {b:?} vs {a:?}");
            }
        }
    }
}

#[test]
fn pow2_dimensions_cover_the_layout() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let sizes: Vec<(u32, u32)> = (0..60)
        .map(|_| (rng.gen_range(4..=90), rng.gen_range(4..=90)))
        .collect();
    let plain = layout(&sizes, &PackerConfig::builder().max_width(700).build()).expect("plain");
    let rounded = layout(&sizes, &PackerConfig::builder().max_width(700).pow2(true).build())
        .expect("rounded");
    assert_eq!(plain.positions, rounded.positions);
    assert!(is_pow2(rounded.sheet_width) && is_pow2(rounded.sheet_height));
    assert!(rounded.sheet_width >= plain.sheet_width);
    assert!(rounded.sheet_height >= plain.sheet_height);
    assert!(rounded.sheet_width < plain.sheet_width * 2);
}

#[test]
fn packing_is_deterministic() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let frames: Vec<Frame> = (0..40)
        .map(|i| {
            let c = rng.gen_range(0..=255u8);
            solid_frame("run", i, rng.gen_range(4..=32), rng.gen_range(4..=32), [c, c, c, 255])
        })
        .collect();
    let cfg = PackerConfig::builder().max_width(200).build();
    let a = pack(&frames, &cfg).expect("a");
    let b = pack(&frames, &cfg).expect("b");
    assert_eq!(a.atlas.frames, b.atlas.frames);
    assert_eq!(a.atlas.sheet, b.atlas.sheet);
    assert_eq!(a.atlas.image, b.atlas.image);
    assert_eq!(a.animations, b.animations);

    let sizes: Vec<(u32, u32)> = frames.iter().map(|f| (f.width, f.height)).collect();
    assert_eq!(layout(&sizes, &cfg).expect("l1"), layout(&sizes, &cfg).expect("l2"));
}

#[test]
fn outlines_mark_frame_bounds() {
    let frames = vec![solid_frame("x", 0, 6, 6, [0, 0, 0, 0])];
    let cfg = PackerConfig::builder().padding(1).outlines(true).build();
    let out = pack(&frames, &cfg).expect("pack");
    assert_eq!(out.atlas.image.get_pixel(1, 1).0, [255, 0, 0, 255]);
    assert_eq!(out.atlas.image.get_pixel(6, 6).0, [255, 0, 0, 255]);
    assert_eq!(out.atlas.image.get_pixel(3, 3).0, [0, 0, 0, 0]);
}

#[test]
fn stats_report_occupancy() {
    let out = pack(&scenario_frames(), &PackerConfig::default()).expect("pack");
    let stats = out.stats();
    assert_eq!(stats.num_frames, 4);
    assert_eq!(stats.used_frame_area, 4 * 64 * 64);
    assert_eq!(stats.sheet_area, 266 * 68);
    assert!(stats.occupancy > 0.9 && stats.occupancy < 1.0);
    assert!(stats.summary().contains("Frames: 4"));
}

#[test]
fn invalid_config_is_rejected() {
    let frames = vec![solid_frame("x", 0, 6, 6, [0, 0, 0, 255])];
    let zero = PackerConfig::builder().max_width(0).build();
    assert!(matches!(pack(&frames, &zero), Err(SpriteForgeError::InvalidConfig(_))));
    let fat = PackerConfig::builder().max_width(10).padding(5).build();
    match fat.validate() {
        Err(SpriteForgeError::InvalidConfig(msg)) => assert!(msg.contains("padding")),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}
