use std::{fmt::Debug, path::Path, str::FromStr};

use image::Rgb;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    cfg::{get_default_cfg, GridCfg},
    domain::BoundingBox,
    font::LabelFont,
    image_util::{draw_thick_rect, read_image, write_image},
    result::{ErrorKind, SmResult},
    smerr,
    types::{PtI, ViewImage},
};

/// Smallest divisor of `n` in `[min, max]` or `fallback` if there is none.
pub fn unit_len(n: u32, min: u32, max: u32, fallback: u32) -> u32 {
    (1..=n.min(max))
        .find(|i| n % i == 0 && (min..=max).contains(i))
        .unwrap_or(fallback)
}

/// Region of a cell an action should target.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Subarea {
    TopLeft,
    Top,
    TopRight,
    Left,
    #[default]
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl FromStr for Subarea {
    type Err = crate::result::SmError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "top-left" => Self::TopLeft,
            "top" => Self::Top,
            "top-right" => Self::TopRight,
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            "bottom-left" => Self::BottomLeft,
            "bottom" => Self::Bottom,
            "bottom-right" => Self::BottomRight,
            _ => return Err(smerr!(ErrorKind::UnknownCell; "unknown subarea '{}'", s)),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
    /// `row * cols + col + 1`
    pub label: u32,
    pub rect: BoundingBox,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub unit_w: u32,
    pub unit_h: u32,
    pub rows: u32,
    pub cols: u32,
}

impl GridLayout {
    pub fn new(w: u32, h: u32, cfg: &GridCfg) -> Self {
        let unit = |n| unit_len(n, cfg.min_unit, cfg.max_unit, cfg.fallback_unit);
        let unit_w = unit(w);
        let unit_h = unit(h);
        GridLayout {
            unit_w,
            unit_h,
            rows: h / unit_h,
            cols: w / unit_w,
        }
    }

    pub fn n_cells(&self) -> u32 {
        self.rows * self.cols
    }

    fn cell(&self, row: u32, col: u32) -> GridCell {
        let (uw, uh) = (self.unit_w as i32, self.unit_h as i32);
        let (r, c) = (row as i32, col as i32);
        GridCell {
            row,
            col,
            label: row * self.cols + col + 1,
            rect: BoundingBox {
                left: c * uw,
                top: r * uh,
                right: (c + 1) * uw,
                bottom: (r + 1) * uh,
            },
        }
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| self.cell(row, col)))
    }

    pub fn cell_rect(&self, label: u32) -> SmResult<BoundingBox> {
        if label == 0 || label > self.n_cells() {
            return Err(smerr!(
                ErrorKind::UnknownCell;
                "cell {} is not in 1..={}",
                label,
                self.n_cells()
            ));
        }
        let idx = label - 1;
        Ok(self.cell(idx / self.cols, idx % self.cols).rect)
    }

    /// Pixel coordinates inside cell `label`.
    pub fn cell_point(&self, label: u32, subarea: Subarea) -> SmResult<PtI> {
        let rect = self.cell_rect(label)?;
        let (x0, y0) = (rect.left, rect.top);
        let (qw, hw, tw) = (
            self.unit_w as i32 / 4,
            self.unit_w as i32 / 2,
            self.unit_w as i32 * 3 / 4,
        );
        let (qh, hh, th) = (
            self.unit_h as i32 / 4,
            self.unit_h as i32 / 2,
            self.unit_h as i32 * 3 / 4,
        );
        let (dx, dy) = match subarea {
            Subarea::TopLeft => (qw, qh),
            Subarea::Top => (hw, qh),
            Subarea::TopRight => (tw, qh),
            Subarea::Left => (qw, hh),
            Subarea::Center => (hw, hh),
            Subarea::Right => (tw, hh),
            Subarea::BottomLeft => (qw, th),
            Subarea::Bottom => (hw, th),
            Subarea::BottomRight => (tw, th),
        };
        Ok((x0 + dx, y0 + dy))
    }
}

#[derive(Debug)]
pub struct GridPartitioner {
    cfg: GridCfg,
    font: LabelFont,
}

impl Default for GridPartitioner {
    fn default() -> Self {
        GridPartitioner::new(get_default_cfg().grid)
    }
}

impl GridPartitioner {
    /// Uses the bundled font if the configured one cannot be loaded.
    pub fn new(cfg: GridCfg) -> Self {
        let font = LabelFont::from_cfg(cfg.font_path.as_deref());
        GridPartitioner { cfg, font }
    }

    pub fn with_font(mut self, font: LabelFont) -> Self {
        self.font = font;
        self
    }

    /// Draws the labeled grid onto `im`. Pixels right of the last column and below the last
    /// row are left untouched.
    pub fn draw_on_image(&self, im: &mut ViewImage) -> GridLayout {
        let layout = GridLayout::new(im.width(), im.height(), &self.cfg);
        let thick = layout.unit_w / 50;
        let border = (thick / 2).max(1);
        let font_scale = (layout.unit_w / 100).max(1) as f32;
        let accent = Rgb(self.cfg.accent);
        let shadow = Rgb([0, 0, 0]);
        let offset = self.cfg.shadow_offset;
        let label_dx = (layout.unit_w * 5 / 100) as i32;
        let label_dy = (layout.unit_h * 30 / 100) as i32;
        for cell in layout.cells() {
            let rect = cell.rect;
            draw_thick_rect(
                im,
                (rect.left, rect.top),
                (rect.right, rect.bottom),
                accent,
                border,
            );
            let text = cell.label.to_string();
            let origin = (rect.left + label_dx, rect.top + label_dy);
            self.font.draw_text_baseline(
                im,
                &text,
                (origin.0 + offset, origin.1 + offset),
                font_scale,
                thick,
                shadow,
            );
            self.font
                .draw_text_baseline(im, &text, origin, font_scale, thick, accent);
        }
        layout
    }

    pub fn draw_grid<P, Q>(&self, image_path: P, output_path: Q) -> SmResult<GridLayout>
    where
        P: AsRef<Path> + Debug,
        Q: AsRef<Path> + Debug,
    {
        let mut im = read_image(&image_path)?;
        let layout = self.draw_on_image(&mut im);
        write_image(&im, &output_path)?;
        info!(
            "drew {}x{} grid with {}x{} cells on {:?} into {:?}",
            layout.rows, layout.cols, layout.unit_w, layout.unit_h, image_path, output_path
        );
        Ok(layout)
    }
}

/// Overlays the labeled grid with the default configuration and returns `(rows, cols)`.
pub fn draw_grid<P, Q>(image_path: P, output_path: Q) -> SmResult<(u32, u32)>
where
    P: AsRef<Path> + Debug,
    Q: AsRef<Path> + Debug,
{
    let layout = GridPartitioner::default().draw_grid(image_path, output_path)?;
    Ok((layout.rows, layout.cols))
}

#[test]
fn test_unit_len() {
    let ul = |n| unit_len(n, 120, 180, 120);
    assert_eq!(ul(1200), 120);
    assert_eq!(ul(800), 160);
    assert_eq!(ul(1080), 120);
    assert_eq!(ul(2400), 120);
    assert_eq!(ul(1170), 130);
    assert_eq!(ul(2532), 120);
    assert_eq!(ul(1031), 120);
    assert_eq!(ul(150), 150);
    assert_eq!(ul(100), 120);
    assert_eq!(ul(0), 120);
}

#[test]
fn test_unit_len_divides_or_falls_back() {
    for n in 1..3000 {
        let u = unit_len(n, 120, 180, 120);
        let has_divisor = (120..=180).any(|i| n % i == 0);
        if has_divisor {
            assert_eq!(n % u, 0, "n={n}");
            assert!((120..=180).contains(&u));
            assert!((120..u).all(|i| n % i != 0), "n={n} has a smaller divisor than {u}");
        } else {
            assert_eq!(u, 120);
        }
    }
}

#[test]
fn test_layout() {
    let cfg = get_default_cfg().grid;
    let layout = GridLayout::new(1200, 800, &cfg);
    assert_eq!((layout.unit_w, layout.unit_h), (120, 160));
    assert_eq!((layout.rows, layout.cols), (5, 10));
    let labels = layout.cells().map(|c| c.label).collect::<Vec<_>>();
    assert_eq!(labels, (1..=50).collect::<Vec<_>>());
    let c = layout.cells().nth(12).unwrap();
    assert_eq!((c.row, c.col, c.label), (1, 2, 13));
    assert_eq!(
        c.rect,
        BoundingBox {
            left: 240,
            top: 160,
            right: 360,
            bottom: 320
        }
    );
    // remainder pixels stay uncovered
    let layout = GridLayout::new(1031, 130, &cfg);
    assert_eq!((layout.rows, layout.cols), (1, 8));
    assert!(layout.cells().all(|c| c.rect.right <= 1031));
}

#[test]
fn test_cell_point() -> SmResult<()> {
    let layout = GridLayout::new(1200, 800, &get_default_cfg().grid);
    assert_eq!(layout.cell_point(1, Subarea::Center)?, (60, 80));
    assert_eq!(layout.cell_point(13, Subarea::TopLeft)?, (270, 200));
    assert_eq!(layout.cell_point(13, Subarea::BottomRight)?, (330, 280));
    assert_eq!(layout.cell_point(50, Subarea::Bottom)?, (1140, 760));
    assert_eq!(
        layout.cell_point(51, Subarea::Center).unwrap_err().kind(),
        ErrorKind::UnknownCell
    );
    assert!(layout.cell_rect(0).is_err());
    assert_eq!("top-right".parse::<Subarea>()?, Subarea::TopRight);
    assert!("middle".parse::<Subarea>().is_err());
    Ok(())
}
