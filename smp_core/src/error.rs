use crate::GenTag;

use std::{
    fmt,
    sync::Arc,
};

/// Tags classifying the circumstances of an error. A single error carries a
/// small slice of these rather than one tag, since most failures are best
/// described by more than one facet (e.g. `Decrypt` + `Auth`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrTag {
    IO,
    Network,
    Timeout,
    Decode,
    Encode,
    Parse,
    Syntax,
    Encrypt,
    Decrypt,
    Sign,
    Verify,
    Key,
    Size,
    Version,
    Auth,
    Missing,
    Mismatch,
    Invalid,
    Input,
    Output,
    Unexpected,
    Bug,
    Closed,
    Overflow,
    Unknown,
}

impl fmt::Display for ErrTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Default for ErrTag {
    fn default() -> Self { Self::Unknown }
}

impl GenTag for ErrTag {}

#[derive(Clone, Debug)]
pub struct ErrMsg<T: GenTag> {
    pub tags: &'static [T],
    pub msg: String,
}

impl<T: GenTag> fmt::Display for ErrMsg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{}", tag)?;
        }
        write!(f, "] {}", self.msg)
    }
}

/// The error currency used by every fallible function in this workspace.
///
/// `Local` is raised directly by this crate family. `Upstream` wraps a
/// lower-level error (`io::Error`, an `rsa` crate error, ...) while keeping
/// its source available via `source()`. `Collection` carries more than one
/// error at once, used only when tearing down a connection rejects every
/// request pending on it.
#[derive(Clone, Debug)]
pub enum Error<T: GenTag> {
    Local(ErrMsg<T>),
    Upstream(Arc<dyn std::error::Error + Send + Sync>, ErrMsg<T>),
    Collection(Vec<Box<Error<T>>>),
}

impl<T: GenTag> Error<T> {
    pub fn tags(&self) -> &'static [T] {
        match self {
            Self::Local(m) => m.tags,
            Self::Upstream(_, m) => m.tags,
            Self::Collection(_) => &[],
        }
    }

    pub fn has_tag(&self, tag: T) -> bool
    where
        T: PartialEq,
    {
        self.tags().iter().any(|t| *t == tag)
    }
}

impl<T: GenTag> fmt::Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(m) => write!(f, "{}", m),
            Self::Upstream(e, m) => write!(f, "{} caused by: {}", m, e),
            Self::Collection(errs) => {
                write!(f, "{} errors:", errs.len())?;
                for e in errs {
                    write!(f, "\n  - {}", e)?;
                }
                Ok(())
            },
        }
    }
}

impl<T: GenTag> std::error::Error for Error<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Upstream(e, _) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl<T: GenTag> From<std::io::Error> for Error<T> {
    fn from(e: std::io::Error) -> Self {
        Error::Upstream(Arc::new(e), ErrMsg { tags: &[], msg: String::new() })
    }
}

impl<T: GenTag> From<std::string::FromUtf8Error> for Error<T> {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Error::Upstream(Arc::new(e), ErrMsg { tags: &[], msg: String::new() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_err_tags_roundtrip() {
        let n = 41;
        let e1 = err!(errmsg!("The meaning of life is not {}", n); Invalid, Input);
        assert!(e1.has_tag(ErrTag::Invalid));
        assert!(e1.has_tag(ErrTag::Input));
        assert!(!e1.has_tag(ErrTag::Auth));
    }

    #[test]
    fn test_err_display_includes_tags_and_message() {
        let e = err!("boom"; Decrypt);
        let s = format!("{}", e);
        assert!(s.contains("Decrypt"));
        assert!(s.contains("boom"));
    }
}
