use std::{fs, path::PathBuf, thread};

use image::Rgb;
use smlib::{
    draw_grid, font::LabelFont, get_default_cfg, image_util::read_image,
    tracing_setup::init_tracing_for_tests, ErrorKind, GridPartitioner, ViewImage,
};

fn tmp_path(prefix: &str, ext: &str) -> PathBuf {
    let folder = std::env::temp_dir().join("shotmark-tests");
    fs::create_dir_all(&folder).unwrap();
    folder.join(format!("{prefix}-{}.{ext}", uuid::Uuid::new_v4()))
}

/// Glyph edges are anti-aliased, interiors carry the drawing color.
fn near(p: &Rgb<u8>, color: Rgb<u8>) -> bool {
    p.0.iter().zip(color.0).all(|(a, b)| a.abs_diff(b) <= 8)
}

fn write_plain(w: u32, h: u32, color: [u8; 3]) -> PathBuf {
    let path = tmp_path("src", "png");
    ViewImage::from_pixel(w, h, Rgb(color)).save(&path).unwrap();
    path
}

#[test]
fn test_grid_1200_800() {
    init_tracing_for_tests();
    let src = write_plain(1200, 800, [200, 200, 200]);
    smlib::defer_file_removal!(&src);
    let dst = tmp_path("grid", "png");
    smlib::defer_file_removal!(&dst);
    assert_eq!(draw_grid(&src, &dst).unwrap(), (5, 10));

    let accent = Rgb(get_default_cfg().grid.accent);
    let im = read_image(&dst).unwrap();
    assert_eq!(im.dimensions(), (1200, 800));
    // borders
    assert_eq!(*im.get_pixel(0, 60), accent);
    assert_eq!(*im.get_pixel(120, 60), accent);
    assert_eq!(*im.get_pixel(60, 160), accent);
    // inside of a cell, away from its label
    assert_eq!(*im.get_pixel(100, 140), Rgb([200, 200, 200]));
    // labels and their shadows are drawn in the upper left of each cell
    let label_region = |x0: u32, y0: u32| {
        (x0 + 4..x0 + 60).flat_map(move |x| (y0 + 20..y0 + 60).map(move |y| (x, y)))
    };
    assert!(label_region(0, 0).any(|(x, y)| near(im.get_pixel(x, y), Rgb([0, 0, 0]))));
    assert!(label_region(1080, 640).any(|(x, y)| near(im.get_pixel(x, y), accent)));
}

#[test]
fn test_grid_leaves_remainder_untouched() {
    let gray = Rgb([50, 50, 50]);
    let src = write_plain(1031, 130, gray.0);
    smlib::defer_file_removal!(&src);
    let dst = tmp_path("grid-remainder", "png");
    smlib::defer_file_removal!(&dst);
    let layout = GridPartitioner::default().draw_grid(&src, &dst).unwrap();
    assert_eq!((layout.unit_w, layout.unit_h), (120, 130));
    assert_eq!((layout.rows, layout.cols), (1, 8));
    let im = read_image(&dst).unwrap();
    for x in 962..1031 {
        for y in 0..130 {
            assert_eq!(*im.get_pixel(x, y), gray, "({x}, {y})");
        }
    }
}

#[test]
fn test_grid_repeatable_and_parallel() {
    let plain = write_plain(1080, 720, [0, 0, 0]);
    smlib::defer_file_removal!(&plain);
    // a first grid gives a non-uniform source
    let src = tmp_path("grid-pre", "png");
    smlib::defer_file_removal!(&src);
    assert_eq!(draw_grid(&plain, &src).unwrap(), (6, 9));

    let dst1 = tmp_path("grid-1", "png");
    smlib::defer_file_removal!(&dst1);
    let dst2 = tmp_path("grid-2", "png");
    smlib::defer_file_removal!(&dst2);
    let (r1, r2) = thread::scope(|s| {
        let h1 = s.spawn(|| draw_grid(&src, &dst1).unwrap());
        let h2 = s.spawn(|| draw_grid(&src, &dst2).unwrap());
        (h1.join().unwrap(), h2.join().unwrap())
    });
    assert_eq!(r1, r2);
    assert_eq!(read_image(&dst1).unwrap(), read_image(&dst2).unwrap());
}

#[test]
fn test_grid_on_tiny_image() {
    let mut im = ViewImage::new(100, 100);
    let layout = GridPartitioner::default()
        .with_font(LabelFont::Stroke)
        .draw_on_image(&mut im);
    assert_eq!((layout.rows, layout.cols), (0, 0));
    assert_eq!(layout.cells().count(), 0);
    assert!(im.pixels().all(|p| *p == Rgb([0, 0, 0])));
}

#[test]
fn test_grid_unreadable() {
    let dst = tmp_path("never", "png");
    let e = draw_grid(tmp_path("missing", "png"), &dst).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UnreadableImage);
    assert!(!dst.exists());
}

#[test]
fn test_grid_with_stroke_font() {
    let mut im = ViewImage::from_pixel(240, 240, Rgb([200, 200, 200]));
    let layout = GridPartitioner::default()
        .with_font(LabelFont::Stroke)
        .draw_on_image(&mut im);
    assert_eq!((layout.rows, layout.cols), (2, 2));
    let accent = Rgb(get_default_cfg().grid.accent);
    assert!((126..180).any(|x| (140..200).any(|y| *im.get_pixel(x, y) == accent)));
}

#[test]
fn test_grid_honors_font_path() {
    let mut cfg = get_default_cfg().grid;
    cfg.font_path = Some(PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/resources/DejaVu/DejaVuSans-Bold.ttf"
    )));
    let mut configured = ViewImage::new(360, 240);
    GridPartitioner::new(cfg.clone()).draw_on_image(&mut configured);
    let mut bundled = ViewImage::new(360, 240);
    GridPartitioner::default().draw_on_image(&mut bundled);
    assert_eq!(configured, bundled);
    // an unusable font file falls back to the bundled font
    cfg.font_path = Some(tmp_path("no-font", "ttf"));
    let mut fallback = ViewImage::new(360, 240);
    GridPartitioner::new(cfg).draw_on_image(&mut fallback);
    assert_eq!(fallback, bundled);
}
