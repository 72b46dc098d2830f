pub use crate::{
    Outcome,
    GenTag,
    err,
    errmsg,
    ok,
    res,
};
pub use crate::error::{
    Error,
    ErrMsg,
    ErrTag,
};
pub use crate::log::{
    trace,
    debug,
    info,
    warn,
    error,
    LogLevel,
    set_log_level,
};
pub use crate::config::Config;
