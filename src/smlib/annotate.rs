use std::{fmt::Debug, path::Path};

use image::Rgb;
use tracing::info;

use crate::{
    cfg::{get_default_cfg, AnnotateCfg},
    console::{log_with_color, LogColor},
    domain::{Attrib, ElementLike},
    font::LabelFont,
    image_util::{blend_rect, read_image, write_image},
    result::{SmError, SmResult},
    types::{PtI, ViewImage},
};

const NEAR_WHITE: [u8; 3] = [255, 250, 250];
const NEAR_BLACK: [u8; 3] = [10, 10, 10];
const WARM: [u8; 3] = [250, 0, 0];
const COOL: [u8; 3] = [0, 0, 250];
const NEUTRAL: [u8; 3] = [0, 250, 0];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelStyle {
    pub background: [u8; 3],
    pub text: [u8; 3],
}

/// How labels are colored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleMode {
    /// Color by element attribute, used while recording demonstrations.
    Record,
    Plain { dark: bool },
}

impl StyleMode {
    pub fn from_flags(record_mode: bool, dark_mode: bool) -> Self {
        if record_mode {
            Self::Record
        } else {
            Self::Plain { dark: dark_mode }
        }
    }

    pub fn style(self, attrib: Attrib) -> LabelStyle {
        match (self, attrib) {
            (Self::Record, Attrib::Clickable) => LabelStyle {
                background: WARM,
                text: NEAR_WHITE,
            },
            (Self::Record, Attrib::Focusable) => LabelStyle {
                background: COOL,
                text: NEAR_WHITE,
            },
            (Self::Record, Attrib::Other) => LabelStyle {
                background: NEUTRAL,
                text: NEAR_WHITE,
            },
            (Self::Plain { dark: false }, _) => LabelStyle {
                background: NEAR_WHITE,
                text: NEAR_BLACK,
            },
            (Self::Plain { dark: true }, _) => LabelStyle {
                background: NEAR_BLACK,
                text: NEAR_WHITE,
            },
        }
    }
}

#[derive(Debug)]
pub struct ElementOutcome {
    /// 1-based position of the element in the input
    pub label: usize,
    /// top-left corner of the label text or why the element could not be labeled
    pub position: SmResult<PtI>,
}

#[derive(Debug)]
pub struct Annotated {
    pub image: ViewImage,
    pub outcomes: Vec<ElementOutcome>,
}

impl Annotated {
    pub fn failed(&self) -> impl Iterator<Item = (usize, &SmError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.position.as_ref().err().map(|e| (o.label, e)))
    }
}

#[derive(Debug)]
pub struct Annotator {
    cfg: AnnotateCfg,
    font: LabelFont,
}

impl Default for Annotator {
    fn default() -> Self {
        Annotator::new(get_default_cfg().annotate)
    }
}

impl Annotator {
    /// Uses the bundled font if the configured one cannot be loaded.
    pub fn new(cfg: AnnotateCfg) -> Self {
        let font = LabelFont::from_cfg(cfg.font_path.as_deref());
        Annotator { cfg, font }
    }

    /// Labels entirely outside of the image are skipped.
    fn draw_label(&self, im: &mut ViewImage, label: &str, (x, y): PtI, style: LabelStyle) {
        let cfg = &self.cfg;
        let (w, h) = self.font.text_size(label, cfg.font_scale, cfg.thickness);
        let (pad_x, pad_y) = (cfg.padding_x.max(0), cfg.padding_y.max(0));
        let bg_pos = (x.saturating_sub(pad_x), y.saturating_sub(pad_y));
        let bg_w = w + 2 * pad_x as u32;
        let bg_h = h + 2 * pad_y as u32;
        let visible = (bg_pos.0 as i64) < im.width() as i64
            && (bg_pos.1 as i64) < im.height() as i64
            && bg_pos.0 as i64 + bg_w as i64 > 0
            && bg_pos.1 as i64 + bg_h as i64 > 0;
        if !visible {
            return;
        }
        blend_rect(im, bg_pos, bg_w, bg_h, &style.background, cfg.alpha);
        self.font.draw_text(
            im,
            label,
            (x, y),
            cfg.font_scale,
            cfg.thickness,
            Rgb(style.text),
        );
    }

    /// Labels the elements in place with `1..=elements.len()`. Elements without a valid
    /// bounding box are skipped but still consume their label.
    pub fn annotate_image<E: ElementLike>(
        &self,
        im: &mut ViewImage,
        elements: &[E],
        mode: StyleMode,
    ) -> Vec<ElementOutcome> {
        elements
            .iter()
            .enumerate()
            .map(|(i, elt)| {
                let label = i + 1;
                let position = elt.bbox().map(|bb| {
                    let (cx, cy) = bb.center();
                    let pos = (
                        cx.saturating_add(self.cfg.margin),
                        cy.saturating_add(self.cfg.margin),
                    );
                    self.draw_label(im, &label.to_string(), pos, mode.style(elt.attrib()));
                    pos
                });
                if let Err(e) = &position {
                    log_with_color(format!("could not place label {label}. {e}"), LogColor::Red);
                }
                ElementOutcome { label, position }
            })
            .collect()
    }

    pub fn annotate<P, Q, E>(
        &self,
        image_path: P,
        output_path: Q,
        elements: &[E],
        record_mode: bool,
        dark_mode: bool,
    ) -> SmResult<Annotated>
    where
        P: AsRef<Path> + Debug,
        Q: AsRef<Path> + Debug,
        E: ElementLike,
    {
        let mut image = read_image(&image_path)?;
        let mode = StyleMode::from_flags(record_mode, dark_mode);
        let outcomes = self.annotate_image(&mut image, elements, mode);
        write_image(&image, &output_path)?;
        info!(
            "labeled {} of {} elements of {:?} into {:?}",
            outcomes.iter().filter(|o| o.position.is_ok()).count(),
            outcomes.len(),
            image_path,
            output_path
        );
        Ok(Annotated { image, outcomes })
    }
}

/// Marks every element with its 1-based index at the center of its bounding box and writes the
/// result to `output_path`, using the default configuration.
pub fn annotate<P, Q, E>(
    image_path: P,
    output_path: Q,
    elements: &[E],
    record_mode: bool,
    dark_mode: bool,
) -> SmResult<Annotated>
where
    P: AsRef<Path> + Debug,
    Q: AsRef<Path> + Debug,
    E: ElementLike,
{
    Annotator::default().annotate(image_path, output_path, elements, record_mode, dark_mode)
}

#[cfg(test)]
use crate::domain::{BoundingBox, UiElement};

#[test]
fn test_record_styles_are_distinct() {
    let m = StyleMode::Record;
    let c = m.style(Attrib::Clickable).background;
    let f = m.style(Attrib::Focusable).background;
    let o = m.style(Attrib::Other).background;
    assert_ne!(c, f);
    assert_ne!(c, o);
    assert_ne!(f, o);
    for a in [Attrib::Clickable, Attrib::Focusable, Attrib::Other] {
        assert_eq!(m.style(a).text, NEAR_WHITE);
    }
}

#[test]
fn test_plain_styles_ignore_attrib() {
    let light = StyleMode::from_flags(false, false);
    let dark = StyleMode::from_flags(false, true);
    assert_eq!(StyleMode::from_flags(true, true), StyleMode::Record);
    for a in [Attrib::Clickable, Attrib::Focusable, Attrib::Other] {
        assert_eq!(
            light.style(a),
            LabelStyle {
                background: NEAR_WHITE,
                text: NEAR_BLACK
            }
        );
        assert_eq!(
            dark.style(a),
            LabelStyle {
                background: NEAR_BLACK,
                text: NEAR_WHITE
            }
        );
    }
}

#[test]
fn test_annotate_image_keeps_labels_aligned() {
    let mut im = ViewImage::new(300, 300);
    let ok = |l, t, r, b| {
        UiElement::new(
            "ok",
            BoundingBox::from_corners((l, t), (r, b)).unwrap(),
            Attrib::Clickable,
        )
    };
    let broken = UiElement {
        uid: "broken".to_string(),
        bbox: vec![(50, 50), (10, 10)],
        attrib: Attrib::Focusable,
    };
    let elts = vec![ok(0, 0, 40, 40), broken, ok(100, 100, 200, 140)];
    let outcomes = Annotator::default().annotate_image(&mut im, &elts, StyleMode::Record);
    let labels = outcomes.iter().map(|o| o.label).collect::<Vec<_>>();
    assert_eq!(labels, vec![1, 2, 3]);
    assert_eq!(outcomes[0].position, Ok((30, 30)));
    assert!(outcomes[1].position.is_err());
    assert_eq!(outcomes[2].position, Ok((160, 130)));
    // padding pixel of the third label's background
    let p = im.get_pixel(152, 122);
    assert_eq!(*p, Rgb([125, 0, 0]));
}

#[test]
fn test_huge_box_does_not_abort_batch() {
    let mut im = ViewImage::new(300, 300);
    let elts = vec![
        UiElement {
            uid: "far".to_string(),
            bbox: vec![(2_000_000_000, 0), (2_000_000_000, 10)],
            attrib: Attrib::Clickable,
        },
        UiElement {
            uid: "edge".to_string(),
            bbox: vec![(i32::MAX - 1, i32::MAX - 1), (i32::MAX, i32::MAX)],
            attrib: Attrib::Other,
        },
        UiElement {
            uid: "behind".to_string(),
            bbox: vec![(i32::MIN, i32::MIN), (i32::MIN + 2, i32::MIN + 2)],
            attrib: Attrib::Other,
        },
        UiElement::new(
            "ok",
            BoundingBox::from_corners((100, 100), (200, 140)).unwrap(),
            Attrib::Focusable,
        ),
    ];
    let outcomes = Annotator::default().annotate_image(&mut im, &elts, StyleMode::Record);
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes[0].position, Ok((2_000_000_010, 15)));
    assert_eq!(outcomes[1].position, Ok((i32::MAX, i32::MAX)));
    assert_eq!(outcomes[2].position, Ok((i32::MIN + 11, i32::MIN + 11)));
    assert_eq!(outcomes[3].position, Ok((160, 130)));
    assert_eq!(*im.get_pixel(152, 122), Rgb([0, 0, 125]));
    // nothing but the last label was drawn
    assert_eq!(*im.get_pixel(5, 5), Rgb([0, 0, 0]));
    assert_eq!(*im.get_pixel(295, 295), Rgb([0, 0, 0]));
}
