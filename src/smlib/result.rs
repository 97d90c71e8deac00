use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
};
use tracing::warn;

#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ErrorKind {
    /// The source does not exist or does not decode to an image.
    UnreadableImage,
    /// An element's corners do not form a valid bounding box.
    InvalidBoundingBox,
    /// A grid label outside of `1..=rows*cols`.
    UnknownCell,
    Io,
    Encode,
    Font,
    Cfg,
    Other,
}

/// Everything that can go wrong in shotmark. Per-element annotation failures are reported
/// with this type as well, but they never abort an annotation run.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct SmError {
    kind: ErrorKind,
    msg: String,
}
impl SmError {
    pub fn new(msg: &str) -> SmError {
        SmError::with_kind(ErrorKind::Other, msg)
    }
    pub fn with_kind(kind: ErrorKind, msg: &str) -> SmError {
        SmError {
            kind,
            msg: msg.to_string(),
        }
    }
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
    pub fn msg(&self) -> &str {
        &self.msg
    }
}
impl Display for SmError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.msg)
    }
}
impl Error for SmError {}
impl From<&str> for SmError {
    fn from(value: &str) -> Self {
        SmError::new(value)
    }
}
/// shotmark's result type with [`SmError`](SmError) as error type.
pub type SmResult<U> = Result<U, SmError>;

pub fn trace_ok_warn<T, E>(x: Result<T, E>) -> Option<T>
where
    E: Debug,
{
    match x {
        Ok(x) => Some(x),
        Err(e) => {
            warn!("{e:?}");
            None
        }
    }
}

/// Creates an [`SmError`](SmError) of kind `Other` or of a given kind with a formatted message.
/// ```rust
/// use smlib::{smerr, result::{ErrorKind, SmError}};
/// assert_eq!(smerr!("some error {}", 1), SmError::new(format!("some error {}", 1).as_str()));
/// assert_eq!(smerr!(ErrorKind::Io; "no {}", "disk").kind(), ErrorKind::Io);
/// ```
#[macro_export]
macro_rules! smerr {
    ($s:literal) => {
        $crate::result::SmError::new(format!($s).as_str())
    };
    ($s:literal, $( $exps:expr ),*) => {
        $crate::result::SmError::new(format!($s, $($exps,)*).as_str())
    };
    ($kind:expr; $s:literal) => {
        $crate::result::SmError::with_kind($kind, format!($s).as_str())
    };
    ($kind:expr; $s:literal, $( $exps:expr ),*) => {
        $crate::result::SmError::with_kind($kind, format!($s, $($exps,)*).as_str())
    }
}

pub fn to_sm<E: Debug>(e: E) -> SmError {
    smerr!(
        "original error type is '{:?}', error message is '{:?}'",
        std::any::type_name::<E>(),
        e
    )
}

/// Like [`to_sm`] but keeps the error kind.
pub fn to_sm_kind<E: Debug>(kind: ErrorKind) -> impl Fn(E) -> SmError {
    move |e| SmError::with_kind(kind, to_sm(e).msg())
}

#[test]
fn test_smerr() {
    let e = smerr!(ErrorKind::InvalidBoundingBox; "left {} > right {}", 5, 3);
    assert_eq!(e.kind(), ErrorKind::InvalidBoundingBox);
    assert_eq!(e.msg(), "left 5 > right 3");
    assert_eq!(SmError::from("x").kind(), ErrorKind::Other);
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let e = to_sm_kind::<std::io::Error>(ErrorKind::Io)(io);
    assert_eq!(e.kind(), ErrorKind::Io);
    assert!(e.msg().contains("gone"));
    assert_eq!(trace_ok_warn::<u8, _>(Err(e)), None);
}
