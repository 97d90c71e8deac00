use std::{
    fmt::Debug,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use image::{codecs::jpeg::JpegEncoder, ColorType};

use crate::{
    cfg::{get_default_cfg, CompressCfg},
    console::{log_with_color, LogColor},
    file_util::{file_size_megabytes, with_suffix_and_extension},
    image_util::read_image,
    result::{to_sm_kind, ErrorKind, SmResult},
    smerr,
    types::ViewImage,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressionAttempt {
    pub quality: u8,
    pub megabytes: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Compressed {
    pub path: PathBuf,
    /// quality of the encoding that remains on disk
    pub quality: u8,
    pub megabytes: f64,
    /// `false` if even the lowest attempted quality exceeds the target
    pub met_budget: bool,
    pub attempts: Vec<CompressionAttempt>,
}

/// Quality of the next attempt after an encoding of `megabytes` at `quality` was too large.
pub fn next_quality(quality: u8, megabytes: f64, cfg: &CompressCfg) -> u8 {
    let step = if megabytes >= cfg.coarse_above_mb {
        cfg.coarse_step
    } else {
        cfg.fine_step
    };
    quality.saturating_sub(step.max(1))
}

/// Linear search over decreasing qualities. `encode` writes an encoding at the given quality
/// and returns its size in megabytes. Stops at the first attempt within `target_megabytes` or
/// once the quality is not above the minimum. Returns all attempts, the last one is what
/// `encode` wrote last.
pub fn search_quality<F>(
    cfg: &CompressCfg,
    target_megabytes: f64,
    mut encode: F,
) -> SmResult<Vec<CompressionAttempt>>
where
    F: FnMut(u8) -> SmResult<f64>,
{
    let mut attempts = vec![];
    let mut quality = cfg.start_quality;
    while quality > cfg.min_quality {
        let megabytes = encode(quality)?;
        attempts.push(CompressionAttempt { quality, megabytes });
        log_with_color(
            format!("compressed image to {megabytes} MB at quality {quality}"),
            LogColor::Default,
        );
        if megabytes <= target_megabytes {
            break;
        }
        quality = next_quality(quality, megabytes, cfg);
    }
    Ok(attempts)
}

fn encode_jpeg<P>(im: &ViewImage, path: P, quality: u8) -> SmResult<()>
where
    P: AsRef<Path> + Debug,
{
    let file = File::create(&path)
        .map_err(|e| smerr!(ErrorKind::Io; "could not create {:?} due to {:?}", path, e))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode(im.as_raw(), im.width(), im.height(), ColorType::Rgb8)
        .map_err(to_sm_kind(ErrorKind::Encode))?;
    writer.flush().map_err(to_sm_kind(ErrorKind::Io))
}

#[derive(Debug)]
pub struct AdaptiveCompressor {
    cfg: CompressCfg,
}

impl Default for AdaptiveCompressor {
    fn default() -> Self {
        AdaptiveCompressor::new(get_default_cfg().compress)
    }
}

impl AdaptiveCompressor {
    pub fn new(cfg: CompressCfg) -> Self {
        AdaptiveCompressor { cfg }
    }

    /// Where the compressed copy of `image_path` is written.
    pub fn output_path(&self, image_path: &Path) -> SmResult<PathBuf> {
        with_suffix_and_extension(image_path, &self.cfg.suffix, "jpg")
    }

    pub fn compress_to_budget<P>(&self, image_path: P, target_megabytes: f64) -> SmResult<Compressed>
    where
        P: AsRef<Path> + Debug,
    {
        let im = read_image(&image_path)?;
        let path = self.output_path(image_path.as_ref())?;
        let attempts = search_quality(&self.cfg, target_megabytes, |quality| {
            encode_jpeg(&im, &path, quality)?;
            file_size_megabytes(&path)
        })?;
        let last = attempts.last().copied().ok_or_else(|| {
            smerr!(
                ErrorKind::Other;
                "no quality in ({}, {}] to try",
                self.cfg.min_quality,
                self.cfg.start_quality
            )
        })?;
        File::open(&path)
            .map_err(|e| smerr!(ErrorKind::Io; "could not open {:?} due to {:?}", path, e))?;
        let met_budget = last.megabytes <= target_megabytes;
        if !met_budget {
            log_with_color(
                format!(
                    "{:?} is still {} MB at quality {}, target was {} MB",
                    path, last.megabytes, last.quality, target_megabytes
                ),
                LogColor::Yellow,
            );
        }
        Ok(Compressed {
            path,
            quality: last.quality,
            megabytes: last.megabytes,
            met_budget,
            attempts,
        })
    }
}

/// Re-encodes the image as JPEG with decreasing quality until it fits into `target_megabytes`,
/// using the default configuration. Not meeting the target is not an error, see
/// [`Compressed::met_budget`].
pub fn compress_to_budget<P>(image_path: P, target_megabytes: f64) -> SmResult<Compressed>
where
    P: AsRef<Path> + Debug,
{
    AdaptiveCompressor::default().compress_to_budget(image_path, target_megabytes)
}

#[test]
fn test_next_quality() {
    let cfg = get_default_cfg().compress;
    assert_eq!(next_quality(95, 7.0, &cfg), 85);
    assert_eq!(next_quality(95, 6.5, &cfg), 85);
    assert_eq!(next_quality(95, 6.49, &cfg), 90);
    assert_eq!(next_quality(15, 1.0, &cfg), 10);
    assert_eq!(next_quality(3, 100.0, &cfg), 0);
}

#[test]
fn test_search_unreachable_target() {
    let cfg = get_default_cfg().compress;
    let attempts = search_quality(&cfg, 0.0, |q| Ok(q as f64 / 100.0)).unwrap();
    let qualities = attempts.iter().map(|a| a.quality).collect::<Vec<_>>();
    assert_eq!(qualities, (3..=19).rev().map(|i| i * 5).collect::<Vec<u8>>());
    assert_eq!(attempts.len(), 17);
}

#[test]
fn test_search_ten_mb_to_two() {
    // sizes shrink by 0.1 MB per quality step below 95, starting at 10 MB
    let cfg = get_default_cfg().compress;
    let size = |q: u8| 10.0 - (95 - q) as f64 * 0.1;
    let attempts = search_quality(&cfg, 2.0, |q| Ok(size(q))).unwrap();
    let qualities = attempts.iter().map(|a| a.quality).collect::<Vec<_>>();
    // coarse steps while >= 6.5 MB, then fine steps; size(15) = 2.0
    assert_eq!(
        qualities,
        vec![95, 85, 75, 65, 55, 50, 45, 40, 35, 30, 25, 20, 15]
    );
    assert!(attempts.last().unwrap().megabytes <= 2.0 + 1e-9);
}

#[test]
fn test_search_stops_at_first_fit() {
    let cfg = get_default_cfg().compress;
    let attempts = search_quality(&cfg, 100.0, |_| Ok(3.0)).unwrap();
    assert_eq!(attempts, vec![CompressionAttempt { quality: 95, megabytes: 3.0 }]);
    let e = search_quality(&cfg, 1.0, |_| Err(smerr!(ErrorKind::Encode; "broken"))).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Encode);
}
