use crate::{
    result::{to_sm_kind, ErrorKind, SmResult},
    smerr,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use lazy_static::lazy_static;
use std::{
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{error, info};

lazy_static! {
    pub static ref DEFAULT_TMPDIR: PathBuf = std::env::temp_dir().join("shotmark");
}
lazy_static! {
    pub static ref DEFAULT_HOMEDIR: PathBuf = match dirs::home_dir() {
        Some(p) => p.join(".shotmark"),
        _ => std::env::temp_dir().join("shotmark"),
    };
}

pub const BYTES_PER_MEGABYTE: f64 = 1000.0 * 1000.0;

pub fn read_to_string<P>(p: P) -> SmResult<String>
where
    P: AsRef<Path> + Debug,
{
    fs::read_to_string(&p).map_err(|e| smerr!(ErrorKind::Io; "could not read {:?} due to {:?}", p, e))
}

pub fn write<P, C>(path: P, contents: C) -> SmResult<()>
where
    P: AsRef<Path> + Debug,
    C: AsRef<[u8]>,
{
    fs::write(&path, contents)
        .map_err(|e| smerr!(ErrorKind::Io; "could not write to {:?} since {:?}", path, e))
}

/// Size of the file in decimal megabytes.
pub fn file_size_megabytes<P>(path: P) -> SmResult<f64>
where
    P: AsRef<Path> + Debug,
{
    let meta = fs::metadata(&path)
        .map_err(|e| smerr!(ErrorKind::Io; "could not stat {:?} due to {:?}", path, e))?;
    Ok(meta.len() as f64 / BYTES_PER_MEGABYTE)
}

/// `a/b/shot.png` becomes `a/b/shot{suffix}.{extension}`.
pub fn with_suffix_and_extension(path: &Path, suffix: &str, extension: &str) -> SmResult<PathBuf> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| smerr!(ErrorKind::Io; "{:?} has no file stem", path))?;
    Ok(path.with_file_name(format!("{stem}{suffix}.{extension}")))
}

/// Reads the whole file and encodes it with the standard base64 alphabet, e.g., to embed a
/// screenshot in a request to an inference service.
pub fn encode_base64<P>(path: P) -> SmResult<String>
where
    P: AsRef<Path> + Debug,
{
    let bytes = fs::read(&path).map_err(to_sm_kind(ErrorKind::Io))?;
    Ok(STANDARD.encode(bytes))
}

pub struct Defer<F: FnMut()> {
    pub func: F,
}
impl<F: FnMut()> Drop for Defer<F> {
    fn drop(&mut self) {
        (self.func)();
    }
}
#[macro_export]
macro_rules! defer {
    ($f:expr) => {
        let _dfr = $crate::file_util::Defer { func: $f };
    };
}
pub fn checked_remove<'a, P: AsRef<Path> + Debug>(
    path: &'a P,
    func: fn(p: &'a P) -> io::Result<()>,
) {
    match func(path) {
        Ok(_) => info!("removed {path:?}"),
        Err(e) => error!("could not remove {path:?} due to {e:?}"),
    }
}
#[macro_export]
macro_rules! defer_file_removal {
    ($path:expr) => {
        let func = || $crate::file_util::checked_remove($path, std::fs::remove_file);
        $crate::defer!(func);
    };
}

#[test]
fn test_with_suffix_and_extension() -> SmResult<()> {
    let p = with_suffix_and_extension(Path::new("a/b/1_before_labeled.png"), "_compression", "jpg")?;
    assert_eq!(p, PathBuf::from("a/b/1_before_labeled_compression.jpg"));
    let p = with_suffix_and_extension(Path::new("shot"), "_x", "jpg")?;
    assert_eq!(p, PathBuf::from("shot_x.jpg"));
    Ok(())
}

#[test]
fn test_size_and_base64() -> SmResult<()> {
    fs::create_dir_all(DEFAULT_TMPDIR.as_path()).map_err(to_sm_kind(ErrorKind::Io))?;
    let p = DEFAULT_TMPDIR.join("file_util_test_size_and_base64.bin");
    write(&p, [0u8; 2500])?;
    defer_file_removal!(&p);
    assert!((file_size_megabytes(&p)? - 0.0025).abs() < 1e-12);
    write(&p, b"Man")?;
    assert_eq!(encode_base64(&p)?, "TWFu");
    assert_eq!(
        file_size_megabytes(DEFAULT_TMPDIR.join("does-not-exist.bin"))
            .unwrap_err()
            .kind(),
        ErrorKind::Io
    );
    Ok(())
}
