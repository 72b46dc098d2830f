#[macro_export]
/// Build the contextual message string for an error: the call site's
/// `file:line`, plus an optional formatted message.
///
/// ```
/// use smp_core::prelude::*;
///
/// let n = 41;
/// let msg = errmsg!("The meaning of life is not {}", n);
/// assert!(msg.contains("41"));
/// ```
macro_rules! errmsg {
    () => (
        format!("{}:{}", file!(), line!())
    );
    ($($arg:tt)*) => (
        format!("{}:{}: {}", file!(), line!(), format!($($arg)*))
    )
}

#[macro_export]
/// Construct an [`Error`] value directly, tags trailing a semicolon so a
/// format string and its arguments can precede them unambiguously.
///
/// ```
/// use smp_core::prelude::*;
///
/// let e = err!("missing session key"; Missing, Key);
/// assert!(e.has_tag(ErrTag::Missing));
/// ```
macro_rules! err {
    // Local error, message only (already built, e.g. via errmsg!).
    ($m:expr; $($etvars:ident),* $(,)?) => {
        Error::Local(ErrMsg {
            tags: &[ $(ErrTag::$etvars),* ],
            msg: format!("{}", $m),
        })
    };
    // Local error, format string plus arguments.
    ($m:expr, $($arg:expr),+; $($etvars:ident),* $(,)?) => {
        Error::Local(ErrMsg {
            tags: &[ $(ErrTag::$etvars),* ],
            msg: errmsg!($m, $($arg),+),
        })
    };
    // Upstream error wrapping a lower-level cause, message only.
    ($e:expr, $m:expr; $($etvars:ident),* $(,)?) => {
        Error::Upstream(std::sync::Arc::new($e), ErrMsg {
            tags: &[ $(ErrTag::$etvars),* ],
            msg: format!("{}", $m),
        })
    };
    // Upstream error wrapping a lower-level cause, format string plus arguments.
    ($e:expr, $m:expr, $($arg:expr),+; $($etvars:ident),* $(,)?) => {
        Error::Upstream(std::sync::Arc::new($e), ErrMsg {
            tags: &[ $(ErrTag::$etvars),* ],
            msg: errmsg!($m, $($arg),+),
        })
    };
}

#[macro_export]
/// Propagate a `Result`, converting `Err` into an upstream [`Error`] tagged
/// with the given tags and call-site context.
///
/// ```
/// use smp_core::prelude::*;
///
/// fn parse_it(s: &str) -> Outcome<u32> {
///     Ok(res!(s.parse::<u32>(); Decode, Input))
/// }
/// assert_eq!(parse_it("7").unwrap(), 7);
/// assert!(parse_it("x").is_err());
/// ```
macro_rules! res {
    ($res:expr; $($etvars:ident),* $(,)?) => {
        match $res {
            Ok(v) => v,
            Err(e) => return Err(Error::Upstream(std::sync::Arc::new(e), ErrMsg {
                tags: &[ $(ErrTag::$etvars),* ],
                msg: errmsg!(),
            })),
        }
    };
    ($res:expr) => {
        match $res {
            Ok(v) => v,
            Err(e) => return Err(Error::Upstream(std::sync::Arc::new(e), ErrMsg {
                tags: &[],
                msg: errmsg!(),
            })),
        }
    };
}

#[macro_export]
/// A prefix alternative to `?`, for hot paths where no extra tagging or
/// context is warranted (the error's `From` impl does the conversion).
macro_rules! ok {
    ($expr:expr) => {
        ($expr)?
    };
}
