use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use tracing::{error, info, warn};

/// The closed set of colors diagnostic messages can be tagged with. The color is presentation
/// only. Red messages are logged as errors and yellow ones as warnings, everything else on info
/// level, so the subscriber's level coloring applies.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LogColor {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Black,
    #[default]
    Default,
}

impl LogColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::White => "white",
            Self::Black => "black",
            Self::Default => "default",
        }
    }
}

impl FromStr for LogColor {
    type Err = ();
    /// Unknown names fall back to [`LogColor::Default`] instead of failing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "red" => Self::Red,
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "blue" => Self::Blue,
            "magenta" => Self::Magenta,
            "cyan" => Self::Cyan,
            "white" => Self::White,
            "black" => Self::Black,
            _ => Self::Default,
        })
    }
}

pub fn log_with_color(msg: impl Display, color: LogColor) {
    match color {
        LogColor::Red => error!(color = color.as_str(), "{msg}"),
        LogColor::Yellow => warn!(color = color.as_str(), "{msg}"),
        _ => info!(color = color.as_str(), "{msg}"),
    }
}

#[test]
fn test_color_names() {
    for c in [
        LogColor::Red,
        LogColor::Green,
        LogColor::Yellow,
        LogColor::Blue,
        LogColor::Magenta,
        LogColor::Cyan,
        LogColor::White,
        LogColor::Black,
        LogColor::Default,
    ] {
        assert_eq!(c.as_str().parse::<LogColor>(), Ok(c));
        log_with_color(format!("{c:?}"), c);
    }
    assert_eq!("purple".parse::<LogColor>(), Ok(LogColor::Default));
    assert_eq!("".parse::<LogColor>(), Ok(LogColor::Default));
}
