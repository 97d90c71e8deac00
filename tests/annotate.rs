use std::{fs, path::PathBuf};

use image::Rgb;
use smlib::{
    annotate, image_util::read_image, tracing_setup::init_tracing_for_tests, Attrib, BoundingBox,
    ErrorKind, UiElement, ViewImage,
};

fn tmp_path(prefix: &str, ext: &str) -> PathBuf {
    let folder = std::env::temp_dir().join("shotmark-tests");
    fs::create_dir_all(&folder).unwrap();
    folder.join(format!("{prefix}-{}.{ext}", uuid::Uuid::new_v4()))
}

fn write_plain(w: u32, h: u32, color: [u8; 3]) -> PathBuf {
    let path = tmp_path("src", "png");
    ViewImage::from_pixel(w, h, Rgb(color)).save(&path).unwrap();
    path
}

fn elt(l: i32, t: i32, r: i32, b: i32, attrib: Attrib) -> UiElement {
    UiElement::new("e", BoundingBox::from_corners((l, t), (r, b)).unwrap(), attrib)
}

#[test]
fn test_annotate_record_mode() {
    init_tracing_for_tests();
    let src = write_plain(400, 300, [0, 0, 0]);
    smlib::defer_file_removal!(&src);
    let dst = tmp_path("annotated", "png");
    smlib::defer_file_removal!(&dst);
    let json = r#"[
        {"uid": "ok", "bbox": [[0, 0], [60, 40]], "attrib": "clickable"},
        {"uid": "inverted", "bbox": [[60, 40], [0, 0]], "attrib": "clickable"},
        {"uid": "edit", "bbox": [[100, 100], [200, 140]], "attrib": "focusable"},
        {"uid": "missing"},
        {"uid": "text", "bbox": [[200, 200], [300, 260]], "attrib": "selected"}
    ]"#;
    let elts = UiElement::list_from_json(json).unwrap();
    let res = annotate(&src, &dst, &elts, true, false).unwrap();

    let labels = res.outcomes.iter().map(|o| o.label).collect::<Vec<_>>();
    assert_eq!(labels, vec![1, 2, 3, 4, 5]);
    let failed = res.failed().map(|(l, e)| (l, e.kind())).collect::<Vec<_>>();
    assert_eq!(
        failed,
        vec![
            (2, ErrorKind::InvalidBoundingBox),
            (4, ErrorKind::InvalidBoundingBox)
        ]
    );
    assert_eq!(res.outcomes[0].position, Ok((40, 30)));
    assert_eq!(res.outcomes[2].position, Ok((160, 130)));
    assert_eq!(res.outcomes[4].position, Ok((260, 240)));

    // padding of the label backgrounds, half transparent on black
    assert_eq!(*res.image.get_pixel(32, 22), Rgb([125, 0, 0]));
    assert_eq!(*res.image.get_pixel(152, 122), Rgb([0, 0, 125]));
    assert_eq!(*res.image.get_pixel(252, 232), Rgb([0, 125, 0]));
    // untouched
    assert_eq!(*res.image.get_pixel(5, 290), Rgb([0, 0, 0]));

    let written = read_image(&dst).unwrap();
    assert_eq!(written, res.image);
}

#[test]
fn test_annotate_plain_modes() {
    init_tracing_for_tests();
    let src = write_plain(200, 200, [0, 0, 0]);
    smlib::defer_file_removal!(&src);
    let elts = vec![(
        BoundingBox::from_corners((10, 10), (50, 50)).unwrap(),
        Attrib::Clickable,
    )];

    let light = tmp_path("light", "png");
    smlib::defer_file_removal!(&light);
    let res = annotate(&src, &light, &elts, false, false).unwrap();
    // label text starts at (40, 40), the background 10 px before
    let p = res.image.get_pixel(32, 32);
    assert_eq!(*p, Rgb([128, 125, 125]));

    let dark = tmp_path("dark", "png");
    smlib::defer_file_removal!(&dark);
    let res = annotate(&src, &dark, &elts, false, true).unwrap();
    let p = res.image.get_pixel(32, 32);
    assert_eq!(*p, Rgb([5, 5, 5]));
    // text pixels exist in near white
    assert!((40..80)
        .flat_map(|x| (40..80).map(move |y| (x, y)))
        .any(|(x, y)| res.image.get_pixel(x, y).0.iter().all(|c| *c > 240)));
}

#[test]
fn test_annotate_nothing() {
    let src = write_plain(50, 40, [7, 8, 9]);
    smlib::defer_file_removal!(&src);
    let dst = tmp_path("nothing", "png");
    smlib::defer_file_removal!(&dst);
    let res = annotate::<_, _, UiElement>(&src, &dst, &[], true, true).unwrap();
    assert!(res.outcomes.is_empty());
    assert_eq!(res.image, read_image(&src).unwrap());
    assert!(dst.exists());
}

#[test]
fn test_annotate_unreadable() {
    init_tracing_for_tests();
    let elts = vec![elt(0, 0, 10, 10, Attrib::Other)];
    let dst = tmp_path("never", "png");
    let e = annotate(tmp_path("missing", "png"), &dst, &elts, false, false).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UnreadableImage);
    assert!(!dst.exists());

    let garbage = tmp_path("garbage", "png");
    fs::write(&garbage, b"certainly not a png").unwrap();
    smlib::defer_file_removal!(&garbage);
    let e = annotate(&garbage, &dst, &elts, false, false).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UnreadableImage);
    assert!(!dst.exists());
}
