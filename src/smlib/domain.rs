use serde::{Deserialize, Serialize};

use crate::{
    result::{to_sm_kind, ErrorKind, SmResult},
    smerr,
    types::PtI,
};

/// Axis aligned box given by its top-left and bottom-right corners.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn from_corners((left, top): PtI, (right, bottom): PtI) -> SmResult<Self> {
        if left > right || top > bottom {
            Err(smerr!(
                ErrorKind::InvalidBoundingBox;
                "corners ({}, {}) and ({}, {}) are not top-left and bottom-right",
                left,
                top,
                right,
                bottom
            ))
        } else {
            Ok(BoundingBox {
                left,
                top,
                right,
                bottom,
            })
        }
    }
    /// Expects exactly the two corners top-left and bottom-right.
    pub fn from_slice(corners: &[PtI]) -> SmResult<Self> {
        match corners {
            [tl, br] => Self::from_corners(*tl, *br),
            _ => Err(smerr!(
                ErrorKind::InvalidBoundingBox;
                "expected 2 corners, got {}",
                corners.len()
            )),
        }
    }
    /// Rounds down, the floored mean of two `i32` always fits into an `i32`.
    pub fn center(&self) -> PtI {
        let mid = |a: i32, b: i32| (a as i64 + b as i64).div_euclid(2) as i32;
        (mid(self.left, self.right), mid(self.top, self.bottom))
    }
    pub fn w(&self) -> i32 {
        self.right - self.left
    }
    pub fn h(&self) -> i32 {
        self.bottom - self.top
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Attrib {
    Clickable,
    Focusable,
    #[default]
    Other,
}
impl From<&str> for Attrib {
    fn from(s: &str) -> Self {
        match s {
            "clickable" => Attrib::Clickable,
            "focusable" => Attrib::Focusable,
            _ => Attrib::Other,
        }
    }
}
impl From<String> for Attrib {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}
impl From<Attrib> for String {
    fn from(a: Attrib) -> Self {
        match a {
            Attrib::Clickable => "clickable",
            Attrib::Focusable => "focusable",
            Attrib::Other => "other",
        }
        .to_string()
    }
}

/// What the annotator needs to know about an element.
pub trait ElementLike {
    fn bbox(&self) -> SmResult<BoundingBox>;
    fn attrib(&self) -> Attrib;
}

/// A UI element as extracted from a view hierarchy dump. The corners are kept raw and are only
/// validated when the bounding box is requested.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UiElement {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub bbox: Vec<PtI>,
    #[serde(default)]
    pub attrib: Attrib,
}

impl UiElement {
    pub fn new(uid: &str, bbox: BoundingBox, attrib: Attrib) -> Self {
        UiElement {
            uid: uid.to_string(),
            bbox: vec![(bbox.left, bbox.top), (bbox.right, bbox.bottom)],
            attrib,
        }
    }
    pub fn list_from_json(json: &str) -> SmResult<Vec<Self>> {
        serde_json::from_str(json).map_err(to_sm_kind(ErrorKind::Other))
    }
}

impl ElementLike for UiElement {
    fn bbox(&self) -> SmResult<BoundingBox> {
        BoundingBox::from_slice(&self.bbox)
            .map_err(|e| smerr!(ErrorKind::InvalidBoundingBox; "element '{}': {}", self.uid, e.msg()))
    }
    fn attrib(&self) -> Attrib {
        self.attrib
    }
}

impl ElementLike for (BoundingBox, Attrib) {
    fn bbox(&self) -> SmResult<BoundingBox> {
        Ok(self.0)
    }
    fn attrib(&self) -> Attrib {
        self.1
    }
}

#[test]
fn test_bbox() {
    let bb = BoundingBox::from_corners((10, 20), (30, 60)).unwrap();
    assert_eq!(bb.center(), (20, 40));
    assert_eq!((bb.w(), bb.h()), (20, 40));
    let bb = BoundingBox::from_corners((10, 20), (13, 23)).unwrap();
    assert_eq!(bb.center(), (11, 21));
    assert!(BoundingBox::from_corners((5, 5), (5, 5)).is_ok());
    let e = BoundingBox::from_corners((6, 5), (5, 9)).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidBoundingBox);
    assert!(BoundingBox::from_corners((0, 9), (5, 5)).is_err());
    assert!(BoundingBox::from_slice(&[(0, 0)]).is_err());
    assert!(BoundingBox::from_slice(&[(0, 0), (1, 1), (2, 2)]).is_err());
    assert!(BoundingBox::from_slice(&[]).is_err());
}

#[test]
fn test_center_rounds_down_without_overflow() {
    let bb = BoundingBox::from_corners((-31, -31), (0, 0)).unwrap();
    assert_eq!(bb.center(), (-16, -16));
    let bb = BoundingBox::from_corners((2_000_000_000, 0), (2_000_000_000, 10)).unwrap();
    assert_eq!(bb.center(), (2_000_000_000, 5));
    let bb = BoundingBox::from_corners((i32::MIN, i32::MAX - 1), (i32::MAX, i32::MAX)).unwrap();
    assert_eq!(bb.center(), (-1, i32::MAX - 1));
}

#[test]
fn test_elements_from_json() {
    let json = r#"[
        {"uid": "btn_ok", "bbox": [[0, 0], [100, 50]], "attrib": "clickable"},
        {"uid": "edit", "bbox": [[0, 60], [100, 90]], "attrib": "focusable"},
        {"uid": "broken", "bbox": [[5, 5]], "attrib": "scrollable"},
        {"uid": "no_box"}
    ]"#;
    let elts = UiElement::list_from_json(json).unwrap();
    assert_eq!(elts.len(), 4);
    assert_eq!(elts[0].attrib(), Attrib::Clickable);
    assert_eq!(elts[1].attrib(), Attrib::Focusable);
    assert_eq!(elts[2].attrib(), Attrib::Other);
    assert_eq!(elts[3].attrib(), Attrib::Other);
    assert_eq!(elts[0].bbox().unwrap().center(), (50, 25));
    let e = elts[2].bbox().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidBoundingBox);
    assert!(e.msg().contains("broken"));
    assert!(elts[3].bbox().is_err());
    let s = serde_json::to_string(&elts[0]).unwrap();
    assert!(s.contains(r#""attrib":"clickable""#));
}
