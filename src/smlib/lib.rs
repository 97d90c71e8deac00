//! Visual debugging and payload preparation for screenshot driven automation. Numbered markers
//! on UI elements, labeled grids and compression of screenshots below a size budget.
pub mod annotate;
pub mod cfg;
pub mod compress;
pub mod console;
pub mod domain;
pub mod file_util;
pub mod font;
pub mod grid;
pub mod image_util;
pub mod result;
pub mod tracing_setup;
pub mod types;
pub use annotate::{annotate, Annotated, Annotator, ElementOutcome, LabelStyle, StyleMode};
pub use cfg::{get_cfg, get_default_cfg, Cfg};
pub use compress::{compress_to_budget, AdaptiveCompressor, Compressed, CompressionAttempt};
pub use console::{log_with_color, LogColor};
pub use domain::{Attrib, BoundingBox, ElementLike, UiElement};
pub use file_util::{encode_base64, file_size_megabytes};
pub use grid::{draw_grid, GridCell, GridLayout, GridPartitioner, Subarea};
pub use result::{ErrorKind, SmError, SmResult};
pub use types::ViewImage;
