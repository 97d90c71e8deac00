use std::{
    fs,
    path::{Path, PathBuf},
};

use image::Rgb;
use rand::{rngs::StdRng, Rng, SeedableRng};
use smlib::{
    compress_to_budget, encode_base64, file_size_megabytes, image_util::read_image,
    tracing_setup::init_tracing_for_tests, AdaptiveCompressor, ErrorKind, ViewImage,
};

fn tmp_folder() -> PathBuf {
    let folder = std::env::temp_dir()
        .join("shotmark-tests")
        .join(uuid::Uuid::new_v4().to_string());
    fs::create_dir_all(&folder).unwrap();
    folder
}

/// Noise compresses badly, so every quality step changes the file size.
fn write_noise(folder: &Path, w: u32, h: u32) -> PathBuf {
    let mut rng = StdRng::seed_from_u64(42);
    let im = ViewImage::from_fn(w, h, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]));
    let path = folder.join("1_before_labeled.png");
    im.save(&path).unwrap();
    path
}

#[test]
fn test_generous_budget() {
    init_tracing_for_tests();
    let folder = tmp_folder();
    smlib::defer!(|| smlib::file_util::checked_remove(&folder, fs::remove_dir_all));
    let src = write_noise(&folder, 300, 200);
    let res = compress_to_budget(&src, 100.0).unwrap();
    assert!(res.met_budget);
    assert_eq!(res.quality, 95);
    assert_eq!(res.attempts.len(), 1);
    assert_eq!(res.path, folder.join("1_before_labeled_compression.jpg"));
    assert_eq!(res.megabytes, file_size_megabytes(&res.path).unwrap());
    assert_eq!(read_image(&res.path).unwrap().dimensions(), (300, 200));
    // JPEG magic bytes
    assert!(encode_base64(&res.path).unwrap().starts_with("/9j/"));
}

#[test]
fn test_unreachable_budget_is_best_effort() {
    init_tracing_for_tests();
    let folder = tmp_folder();
    smlib::defer!(|| smlib::file_util::checked_remove(&folder, fs::remove_dir_all));
    let src = write_noise(&folder, 300, 200);
    let res = compress_to_budget(&src, 1e-9).unwrap();
    assert!(!res.met_budget);
    assert_eq!(res.quality, 15);
    assert_eq!(res.attempts.len(), 17);
    assert!(res.attempts.windows(2).all(|w| w[0].quality == w[1].quality + 5));
    assert!(res.path.exists());
    assert_eq!(res.megabytes, file_size_megabytes(&res.path).unwrap());
    assert!(res.megabytes < res.attempts[0].megabytes);
}

#[test]
fn test_budget_in_between() {
    let folder = tmp_folder();
    smlib::defer!(|| smlib::file_util::checked_remove(&folder, fs::remove_dir_all));
    let src = write_noise(&folder, 300, 200);
    let compressor = AdaptiveCompressor::default();
    let all = compressor.compress_to_budget(&src, 0.0).unwrap().attempts;
    let target = all[6].megabytes;
    let res = compressor.compress_to_budget(&src, target).unwrap();
    assert!(res.met_budget);
    assert!(res.megabytes <= target);
    assert!(res.quality >= all[6].quality);
    assert_eq!(res.attempts[..], all[..res.attempts.len()]);
    assert_eq!(file_size_megabytes(&res.path).unwrap(), res.megabytes);
}

#[test]
fn test_compress_unreadable() {
    let folder = tmp_folder();
    smlib::defer!(|| smlib::file_util::checked_remove(&folder, fs::remove_dir_all));
    let e = compress_to_budget(folder.join("missing.png"), 1.0).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::UnreadableImage);
    assert!(!folder.join("missing_compression.jpg").exists());
}
