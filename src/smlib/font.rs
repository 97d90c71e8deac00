//! Rendering of label text. Labels are drawn with `rusttype` using a bundled TrueType font or a
//! configured one. Built-in stroke digits remain if no TrueType font can be loaded.
use std::{fmt::Debug, fs, path::Path};

use image::Rgb;
use rusttype::{Font, Scale};

use crate::{
    image_util::draw_thick_line,
    result::{to_sm_kind, trace_ok_warn, ErrorKind, SmResult},
    smerr,
    types::{PtI, ViewImage},
};

const EMBEDDED_FONT: &[u8] = include_bytes!("../../resources/DejaVu/DejaVuSans-Bold.ttf");
/// Pixel height of TrueType glyphs at scale 1.
const TRUETYPE_HEIGHT: f32 = 28.0;

/// Glyph height in pixels at scale 1.
const STROKE_HEIGHT: f32 = 22.0;
const STROKE_WIDTH: f32 = 12.0;
const STROKE_ADVANCE: f32 = 18.0;

type Stroke = &'static [(f32, f32)];

/// Polylines in a unit box, y pointing down, y = 1 is the baseline.
fn digit_strokes(c: char) -> Option<&'static [Stroke]> {
    const ZERO: &[Stroke] = &[&[
        (0.5, 0.0),
        (0.15, 0.1),
        (0.0, 0.35),
        (0.0, 0.65),
        (0.15, 0.9),
        (0.5, 1.0),
        (0.85, 0.9),
        (1.0, 0.65),
        (1.0, 0.35),
        (0.85, 0.1),
        (0.5, 0.0),
    ]];
    const ONE: &[Stroke] = &[&[(0.2, 0.2), (0.55, 0.0), (0.55, 1.0)]];
    const TWO: &[Stroke] = &[&[
        (0.0, 0.25),
        (0.1, 0.08),
        (0.35, 0.0),
        (0.65, 0.0),
        (0.9, 0.08),
        (1.0, 0.25),
        (0.95, 0.42),
        (0.0, 1.0),
        (1.0, 1.0),
    ]];
    const THREE: &[Stroke] = &[&[
        (0.0, 0.0),
        (1.0, 0.0),
        (0.45, 0.4),
        (0.7, 0.4),
        (0.95, 0.55),
        (1.0, 0.75),
        (0.9, 0.92),
        (0.6, 1.0),
        (0.3, 1.0),
        (0.0, 0.9),
    ]];
    const FOUR: &[Stroke] = &[&[(0.75, 1.0), (0.75, 0.0), (0.0, 0.7), (1.0, 0.7)]];
    const FIVE: &[Stroke] = &[&[
        (0.95, 0.0),
        (0.1, 0.0),
        (0.05, 0.42),
        (0.35, 0.35),
        (0.7, 0.38),
        (0.95, 0.55),
        (1.0, 0.75),
        (0.9, 0.92),
        (0.6, 1.0),
        (0.3, 1.0),
        (0.0, 0.9),
    ]];
    const SIX: &[Stroke] = &[&[
        (0.9, 0.1),
        (0.6, 0.0),
        (0.35, 0.0),
        (0.1, 0.15),
        (0.0, 0.45),
        (0.0, 0.7),
        (0.1, 0.92),
        (0.4, 1.0),
        (0.65, 1.0),
        (0.9, 0.9),
        (1.0, 0.68),
        (0.9, 0.48),
        (0.6, 0.4),
        (0.4, 0.4),
        (0.12, 0.5),
        (0.0, 0.7),
    ]];
    const SEVEN: &[Stroke] = &[&[(0.0, 0.0), (1.0, 0.0), (0.35, 1.0)]];
    const EIGHT: &[Stroke] = &[&[
        (0.5, 0.0),
        (0.1, 0.08),
        (0.05, 0.25),
        (0.2, 0.42),
        (0.5, 0.47),
        (0.8, 0.52),
        (1.0, 0.72),
        (0.9, 0.93),
        (0.5, 1.0),
        (0.1, 0.93),
        (0.0, 0.72),
        (0.2, 0.52),
        (0.5, 0.47),
        (0.8, 0.42),
        (0.95, 0.25),
        (0.9, 0.08),
        (0.5, 0.0),
    ]];
    const NINE: &[Stroke] = &[&[
        (1.0, 0.3),
        (0.9, 0.5),
        (0.6, 0.6),
        (0.35, 0.6),
        (0.1, 0.5),
        (0.0, 0.3),
        (0.1, 0.08),
        (0.35, 0.0),
        (0.6, 0.0),
        (0.9, 0.1),
        (1.0, 0.3),
        (1.0, 0.55),
        (0.9, 0.85),
        (0.6, 1.0),
        (0.35, 1.0),
        (0.1, 0.9),
    ]];
    const MINUS: &[Stroke] = &[&[(0.1, 0.55), (0.9, 0.55)]];
    match c {
        '0' => Some(ZERO),
        '1' => Some(ONE),
        '2' => Some(TWO),
        '3' => Some(THREE),
        '4' => Some(FOUR),
        '5' => Some(FIVE),
        '6' => Some(SIX),
        '7' => Some(SEVEN),
        '8' => Some(EIGHT),
        '9' => Some(NINE),
        '-' => Some(MINUS),
        _ => None,
    }
}

pub enum LabelFont {
    TrueType(Font<'static>),
    /// Built-in digits, other characters are rendered as blanks. Thickness only applies here.
    Stroke,
}

impl Default for LabelFont {
    fn default() -> Self {
        trace_ok_warn(Self::embedded()).unwrap_or(Self::Stroke)
    }
}

impl Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stroke => write!(f, "Stroke"),
            Self::TrueType(_) => write!(f, "TrueType"),
        }
    }
}

impl LabelFont {
    pub fn embedded() -> SmResult<Self> {
        Font::try_from_bytes(EMBEDDED_FONT)
            .map(Self::TrueType)
            .ok_or_else(|| smerr!(ErrorKind::Font; "bundled font cannot be parsed"))
    }

    /// The font at `font_path` if there is one that loads, the bundled font otherwise.
    pub fn from_cfg(font_path: Option<&Path>) -> Self {
        font_path
            .and_then(|p| trace_ok_warn(Self::from_file(p)))
            .unwrap_or_default()
    }

    pub fn from_file<P>(path: P) -> SmResult<Self>
    where
        P: AsRef<Path> + Debug,
    {
        let bytes = fs::read(&path).map_err(to_sm_kind(ErrorKind::Font))?;
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| smerr!(ErrorKind::Font; "{:?} is not a TrueType font", path))?;
        Ok(Self::TrueType(font))
    }

    fn truetype_scale(scale: f32) -> Scale {
        Scale::uniform(TRUETYPE_HEIGHT * scale)
    }

    /// Width and height of the rendered text in pixels.
    pub fn text_size(&self, text: &str, scale: f32, thickness: u32) -> (u32, u32) {
        match self {
            Self::Stroke => {
                let n = text.chars().count() as f32;
                if n == 0.0 {
                    return (0, 0);
                }
                let w = ((n - 1.0) * STROKE_ADVANCE + STROKE_WIDTH) * scale;
                let h = STROKE_HEIGHT * scale;
                (w.round() as u32 + thickness, h.round() as u32 + thickness)
            }
            Self::TrueType(font) => {
                let (w, h) =
                    imageproc::drawing::text_size(Self::truetype_scale(scale), font, text);
                (w.max(0) as u32, h.max(0) as u32)
            }
        }
    }

    /// Draws `text` such that its bounding box has the top-left corner `(x, y)`.
    pub fn draw_text(
        &self,
        im: &mut ViewImage,
        text: &str,
        (x, y): PtI,
        scale: f32,
        thickness: u32,
        color: Rgb<u8>,
    ) {
        match self {
            Self::Stroke => {
                let half_thick = (thickness / 2) as f32;
                let w = STROKE_WIDTH * scale;
                let h = STROKE_HEIGHT * scale;
                let to_px = |x0: f32, (u, v): (f32, f32)| -> PtI {
                    (
                        (x0 + u * w).round() as i32,
                        (y as f32 + half_thick + v * h).round() as i32,
                    )
                };
                for (i, c) in text.chars().enumerate() {
                    let x0 = x as f32 + half_thick + i as f32 * STROKE_ADVANCE * scale;
                    for stroke in digit_strokes(c).unwrap_or(&[]) {
                        for seg in stroke.windows(2) {
                            draw_thick_line(im, to_px(x0, seg[0]), to_px(x0, seg[1]), color, thickness);
                        }
                    }
                }
            }
            Self::TrueType(font) => {
                imageproc::drawing::draw_text_mut(
                    im,
                    color,
                    x,
                    y,
                    Self::truetype_scale(scale),
                    font,
                    text,
                );
            }
        }
    }

    /// Draws `text` with `origin` at the left end of its baseline.
    pub fn draw_text_baseline(
        &self,
        im: &mut ViewImage,
        text: &str,
        origin: PtI,
        scale: f32,
        thickness: u32,
        color: Rgb<u8>,
    ) {
        let (_, h) = self.text_size(text, scale, thickness);
        self.draw_text(im, text, (origin.0, origin.1 - h as i32), scale, thickness, color);
    }
}

#[cfg(test)]
fn count_colored(im: &ViewImage, color: Rgb<u8>) -> usize {
    im.pixels().filter(|p| **p == color).count()
}

#[test]
fn test_stroke_text_size() {
    let f = LabelFont::Stroke;
    assert_eq!(f.text_size("", 1.0, 2), (0, 0));
    assert_eq!(f.text_size("7", 1.0, 2), (14, 24));
    assert_eq!(f.text_size("12", 1.0, 2), (32, 24));
    assert_eq!(f.text_size("12", 2.0, 4), (64, 48));
}

#[test]
fn test_stroke_text_stays_in_box() {
    let white = Rgb([255, 255, 255]);
    for text in ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "-42"] {
        let mut im = ViewImage::new(100, 60);
        let f = LabelFont::Stroke;
        let (w, h) = f.text_size(text, 1.0, 2);
        f.draw_text(&mut im, text, (20, 15), 1.0, 2, white);
        assert!(count_colored(&im, white) > 0, "{text} left no trace");
        for (x, y, p) in im.enumerate_pixels() {
            if *p == white {
                assert!(x + 1 >= 20 && x <= 20 + w, "{text} at x={x}");
                assert!(y + 1 >= 15 && y <= 15 + h, "{text} at y={y}");
            }
        }
    }
}

#[test]
fn test_unknown_chars_are_blank() {
    let white = Rgb([255, 255, 255]);
    let mut im = ViewImage::new(100, 60);
    LabelFont::Stroke.draw_text(&mut im, "ab", (10, 10), 1.0, 2, white);
    assert_eq!(count_colored(&im, white), 0);
}

#[test]
fn test_font_from_missing_file() {
    let e = LabelFont::from_file("/definitely/not/here.ttf").unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Font);
}

#[test]
fn test_truetype_text_size() -> SmResult<()> {
    let f = LabelFont::embedded()?;
    assert!(matches!(f, LabelFont::TrueType(_)));
    let (w1, h1) = f.text_size("7", 1.0, 2);
    assert!(w1 > 0 && h1 > 0);
    let (w2, h2) = f.text_size("77", 2.0, 2);
    assert!(w2 > 2 * w1, "{w2} vs {w1}");
    assert!(h2 > h1);
    // thickness is a stroke font setting
    assert_eq!(f.text_size("7", 1.0, 9), (w1, h1));
    Ok(())
}

#[test]
fn test_truetype_text_stays_in_box() -> SmResult<()> {
    let f = LabelFont::embedded()?;
    let black = Rgb([0, 0, 0]);
    for text in ["1", "42", "128", "-7"] {
        let mut im = ViewImage::new(150, 80);
        let (w, h) = f.text_size(text, 1.0, 2);
        f.draw_text(&mut im, text, (20, 15), 1.0, 2, Rgb([255, 255, 255]));
        assert!(im.pixels().any(|p| *p != black), "{text} left no trace");
        for (x, y, p) in im.enumerate_pixels() {
            if *p != black {
                assert!((20..20 + w).contains(&x), "{text} at x={x}");
                assert!((15..15 + h).contains(&y), "{text} at y={y}");
            }
        }
    }
    Ok(())
}

#[test]
fn test_truetype_baseline() -> SmResult<()> {
    let f = LabelFont::embedded()?;
    let mut im = ViewImage::new(100, 100);
    f.draw_text_baseline(&mut im, "5", (10, 60), 1.0, 1, Rgb([255, 255, 255]));
    let ys = im
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 0)
        .map(|(_, y, _)| y)
        .collect::<Vec<_>>();
    assert!(!ys.is_empty());
    assert!(ys.iter().all(|y| *y < 60));
    Ok(())
}

#[test]
fn test_font_from_cfg() {
    let bundled = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/DejaVu/DejaVuSans-Bold.ttf");
    assert!(matches!(
        LabelFont::from_file(bundled),
        Ok(LabelFont::TrueType(_))
    ));
    assert!(matches!(LabelFont::from_cfg(None), LabelFont::TrueType(_)));
    let missing = Path::new("/definitely/not/here.ttf");
    assert!(matches!(
        LabelFont::from_cfg(Some(missing)),
        LabelFont::TrueType(_)
    ));
}
