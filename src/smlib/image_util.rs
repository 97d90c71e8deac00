use std::{fmt::Debug, path::Path};

use image::Rgb;
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, BresenhamLineIter};

use crate::{
    result::{ErrorKind, SmResult},
    smerr,
    types::{PtI, ResultImage, ViewImage},
};

/// Decodes the image at `path` into 8-bit RGB. Missing files and undecodable content are both
/// reported as [`ErrorKind::UnreadableImage`].
pub fn read_image<P>(path: P) -> ResultImage
where
    P: AsRef<Path> + Debug,
{
    let im = image::io::Reader::open(&path)
        .map_err(|e| smerr!(ErrorKind::UnreadableImage; "could not open image {:?}. {:?}", path, e))?
        .with_guessed_format()
        .map_err(|e| smerr!(ErrorKind::UnreadableImage; "could not read image {:?}. {:?}", path, e))?
        .decode()
        .map_err(|e| smerr!(ErrorKind::UnreadableImage; "could not decode image {:?}. {:?}", path, e))?;
    Ok(im.to_rgb8())
}

/// The format follows from the extension of `path`.
pub fn write_image<P>(im: &ViewImage, path: P) -> SmResult<()>
where
    P: AsRef<Path> + Debug,
{
    im.save(&path)
        .map_err(|e| smerr!(ErrorKind::Encode; "could not write image to {:?}. {:?}", path, e))
}

pub fn to_01(x: u8) -> f32 {
    x as f32 / 255.0
}

/// `alpha` is the opacity of `color` on top of `pixel_rgb`.
pub fn apply_alpha(pixel_rgb: &[u8; 3], color: &[u8; 3], alpha: f32) -> Rgb<u8> {
    let alpha = alpha.clamp(0.0, 1.0);
    let blend = |x_pixel: u8, x_clr: u8| {
        ((to_01(x_clr) * alpha + (1.0 - alpha) * to_01(x_pixel)) * 255.0).round() as u8
    };
    let [r_pixel, g_pixel, b_pixel] = *pixel_rgb;
    let [r_clr, g_clr, b_clr] = *color;
    Rgb([
        blend(r_pixel, r_clr),
        blend(g_pixel, g_clr),
        blend(b_pixel, b_clr),
    ])
}

/// Blends `color` into the rectangle with top-left corner `(x, y)`. Parts outside of the image
/// are skipped.
pub fn blend_rect(im: &mut ViewImage, (x, y): PtI, w: u32, h: u32, color: &[u8; 3], alpha: f32) {
    let x_start = x.max(0) as i64;
    let y_start = y.max(0) as i64;
    let x_end = (x as i64 + w as i64).min(im.width() as i64);
    let y_end = (y as i64 + h as i64).min(im.height() as i64);
    for y in y_start..y_end {
        for x in x_start..x_end {
            let p = im.get_pixel_mut(x as u32, y as u32);
            *p = apply_alpha(&p.0, color, alpha);
        }
    }
}

/// Line of the given thickness with round caps. Thickness `0` draws nothing.
pub fn draw_thick_line(im: &mut ViewImage, start: PtI, end: PtI, color: Rgb<u8>, thickness: u32) {
    let start_f = (start.0 as f32, start.1 as f32);
    let end_f = (end.0 as f32, end.1 as f32);
    match thickness {
        0 => (),
        1 => draw_line_segment_mut(im, start_f, end_f, color),
        _ => {
            let radius = (thickness / 2) as i32;
            for center in BresenhamLineIter::new(start_f, end_f) {
                draw_filled_circle_mut(im, center, radius, color);
            }
        }
    }
}

/// Outline of the rectangle spanned by the two corners, both inclusive.
pub fn draw_thick_rect(
    im: &mut ViewImage,
    (left, top): PtI,
    (right, bottom): PtI,
    color: Rgb<u8>,
    thickness: u32,
) {
    draw_thick_line(im, (left, top), (right, top), color, thickness);
    draw_thick_line(im, (right, top), (right, bottom), color, thickness);
    draw_thick_line(im, (right, bottom), (left, bottom), color, thickness);
    draw_thick_line(im, (left, bottom), (left, top), color, thickness);
}

#[test]
fn test_apply_alpha() {
    assert_eq!(apply_alpha(&[0, 0, 0], &[250, 0, 0], 0.5), Rgb([125, 0, 0]));
    assert_eq!(apply_alpha(&[10, 20, 30], &[250, 0, 0], 0.0), Rgb([10, 20, 30]));
    assert_eq!(apply_alpha(&[10, 20, 30], &[250, 0, 0], 1.0), Rgb([250, 0, 0]));
    assert_eq!(apply_alpha(&[10, 20, 30], &[250, 0, 0], 7.0), Rgb([250, 0, 0]));
}

#[test]
fn test_blend_rect_clips() {
    let mut im = ViewImage::new(10, 10);
    blend_rect(&mut im, (-5, 8), 8, 8, &[200, 100, 50], 0.5);
    assert_eq!(*im.get_pixel(0, 9), Rgb([100, 50, 25]));
    assert_eq!(*im.get_pixel(2, 8), Rgb([100, 50, 25]));
    assert_eq!(*im.get_pixel(3, 8), Rgb([0, 0, 0]));
    assert_eq!(*im.get_pixel(0, 7), Rgb([0, 0, 0]));
}

#[test]
fn test_thick_rect() {
    let red = Rgb([255, 0, 0]);
    let mut im = ViewImage::new(40, 40);
    draw_thick_rect(&mut im, (5, 5), (30, 30), red, 1);
    assert_eq!(*im.get_pixel(5, 17), red);
    assert_eq!(*im.get_pixel(30, 17), red);
    assert_eq!(*im.get_pixel(17, 17), Rgb([0, 0, 0]));
    let mut im = ViewImage::new(40, 40);
    draw_thick_rect(&mut im, (5, 5), (30, 30), red, 4);
    assert_eq!(*im.get_pixel(7, 17), red);
    assert_eq!(*im.get_pixel(9, 17), Rgb([0, 0, 0]));
    // out of bounds corners must not panic
    draw_thick_rect(&mut im, (-10, -10), (100, 100), red, 3);
}
