use crate::{
    file_util::{self, DEFAULT_HOMEDIR},
    result::{to_sm_kind, ErrorKind, SmError, SmResult},
    smerr,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::Level;

const CFG_DEFAULT: &str = r#"
    log_level = "info"
    [annotate]
    margin = 10
    padding_x = 10
    padding_y = 10
    font_scale = 1.0
    thickness = 2
    alpha = 0.5
    # font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"
    [grid]
    # font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"
    min_unit = 120
    max_unit = 180
    fallback_unit = 120
    shadow_offset = 3
    accent = [113, 116, 255]
    [compress]
    start_quality = 95
    min_quality = 10
    coarse_step = 10
    fine_step = 5
    coarse_above_mb = 6.5
    suffix = "_compression"
    "#;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AnnotateCfg {
    /// offset of the label from the center of its bounding box, both axes
    pub margin: i32,
    pub padding_x: i32,
    pub padding_y: i32,
    pub font_scale: f32,
    pub thickness: u32,
    /// opacity of the label background in `[0, 1]`
    pub alpha: f32,
    pub font_path: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GridCfg {
    pub min_unit: u32,
    pub max_unit: u32,
    pub fallback_unit: u32,
    pub shadow_offset: i32,
    pub accent: [u8; 3],
    pub font_path: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CompressCfg {
    pub start_quality: u8,
    /// the search stops once the quality is not above this value
    pub min_quality: u8,
    pub coarse_step: u8,
    pub fine_step: u8,
    /// attempts at or above this size use the coarse step
    pub coarse_above_mb: f64,
    pub suffix: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Cfg {
    log_folder: Option<PathBuf>,
    /// one of `trace`, `debug`, `info`, `warn`, `error`
    log_level: Option<String>,
    pub annotate: AnnotateCfg,
    pub grid: GridCfg,
    pub compress: CompressCfg,
}

impl Cfg {
    pub fn log_folder(&self) -> PathBuf {
        match &self.log_folder {
            Some(lf) => lf.clone(),
            None => DEFAULT_HOMEDIR.join("logs"),
        }
    }
    pub fn set_log_folder(&mut self, log_folder: PathBuf) {
        self.log_folder = Some(log_folder);
    }
    /// Defaults to `INFO` if not set.
    pub fn log_level(&self) -> SmResult<Level> {
        match &self.log_level {
            Some(lvl) => lvl
                .parse::<Level>()
                .map_err(|_| smerr!(ErrorKind::Cfg; "unknown log level '{}'", lvl)),
            None => Ok(Level::INFO),
        }
    }
    pub fn set_log_level(&mut self, log_level: Level) {
        self.log_level = Some(log_level.to_string().to_lowercase());
    }
}

impl Default for Cfg {
    fn default() -> Self {
        get_default_cfg()
    }
}

pub fn get_default_cfg() -> Cfg {
    toml::from_str(CFG_DEFAULT).expect("default config broken")
}

pub fn get_cfg_path() -> SmResult<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| SmError::with_kind(ErrorKind::Cfg, "where is your home? cannot load config"))?
        .join(".shotmark")
        .join("sm_cfg.toml"))
}

pub fn parse_cfg(toml_str: &str) -> SmResult<Cfg> {
    toml::from_str(toml_str).map_err(to_sm_kind(ErrorKind::Cfg))
}

pub fn get_cfg() -> SmResult<Cfg> {
    let cfg_toml_path = get_cfg_path()?;
    if cfg_toml_path.exists() {
        let toml_str = file_util::read_to_string(cfg_toml_path)?;
        parse_cfg(&toml_str)
    } else {
        Ok(get_default_cfg())
    }
}

pub fn write_cfg(cfg: &Cfg) -> SmResult<()> {
    let cfg_path = get_cfg_path()?;
    if let Some(cfg_parent) = cfg_path.parent() {
        fs::create_dir_all(cfg_parent).map_err(to_sm_kind(ErrorKind::Io))?;
    }
    let cfg_str = toml::to_string_pretty(cfg).map_err(to_sm_kind(ErrorKind::Cfg))?;
    file_util::write(cfg_path, cfg_str)
}

#[test]
fn test_default_cfg() {
    let cfg = get_default_cfg();
    assert_eq!(cfg.grid.min_unit, 120);
    assert_eq!(cfg.grid.max_unit, 180);
    assert_eq!(cfg.compress.start_quality, 95);
    assert_eq!(cfg.annotate.font_path, None);
    assert_eq!(cfg.grid.font_path, None);
    assert_eq!(cfg.log_level(), Ok(Level::INFO));
    assert!(cfg.log_folder().ends_with("logs"));
}

#[test]
fn test_toml_roundtrip_keeps_overrides() -> SmResult<()> {
    let mut cfg = get_default_cfg();
    cfg.grid.accent = [1, 2, 3];
    cfg.compress.suffix = "_small".to_string();
    let s = toml::to_string_pretty(&cfg).map_err(to_sm_kind(ErrorKind::Cfg))?;
    let parsed = parse_cfg(&s)?;
    assert_eq!(parsed, cfg);
    assert_eq!(parse_cfg("grid = 5").unwrap_err().kind(), ErrorKind::Cfg);
    Ok(())
}

#[test]
fn test_log_level() -> SmResult<()> {
    let mut cfg = parse_cfg(&CFG_DEFAULT.replace(r#"log_level = "info""#, ""))?;
    assert_eq!(cfg.log_level()?, Level::INFO);
    cfg.set_log_level(Level::WARN);
    let cfg = parse_cfg(&toml::to_string_pretty(&cfg).map_err(to_sm_kind(ErrorKind::Cfg))?)?;
    assert_eq!(cfg.log_level()?, Level::WARN);
    let cfg = parse_cfg(&CFG_DEFAULT.replace(r#""info""#, r#""chatty""#))?;
    assert_eq!(cfg.log_level().unwrap_err().kind(), ErrorKind::Cfg);
    Ok(())
}
