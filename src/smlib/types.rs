use image::{ImageBuffer, Rgb};

use crate::result::SmResult;

pub type ViewImage = ImageBuffer<Rgb<u8>, Vec<u8>>;
pub type ResultImage = SmResult<ViewImage>;
pub type PtI = (i32, i32);
