//! The wire-facing `SMPError` (spec.md §3), distinct from
//! `smp_core::error::Error<ErrTag>` (the Rust-facing error currency): this
//! type is *data* carried inside a `BrokerTransmission`, not something a
//! function returns.
use smp_core::prelude::*;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CmdSub {
    Prohibited,
    KeySize,
    Syntax,
    NoAuth,
    HasAuth,
    NoQueue,
}

impl CmdSub {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prohibited => "PROHIBITED",
            Self::KeySize => "KEY_SIZE",
            Self::Syntax => "SYNTAX",
            Self::NoAuth => "NO_AUTH",
            Self::HasAuth => "HAS_AUTH",
            Self::NoQueue => "NO_QUEUE",
        }
    }

    pub fn from_str(s: &str) -> Outcome<Self> {
        Ok(match s {
            "PROHIBITED" => Self::Prohibited,
            "KEY_SIZE" => Self::KeySize,
            "SYNTAX" => Self::Syntax,
            "NO_AUTH" => Self::NoAuth,
            "HAS_AUTH" => Self::HasAuth,
            "NO_QUEUE" => Self::NoQueue,
            _ => return Err(err!("Unrecognised CMD sub-error '{}'.", s; Parse, Syntax, Invalid)),
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SMPError {
    Block,
    Auth,
    NoMsg,
    Internal,
    Cmd(CmdSub),
}

impl SMPError {
    /// The leading tag of the serialized form (`ERR <tag>` or `ERR CMD
    /// <sub>`), per spec.md §4.2's table.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Block => "BLOCK",
            Self::Auth => "AUTH",
            Self::NoMsg => "NO_MSG",
            Self::Internal => "INTERNAL",
            Self::Cmd(_) => "CMD",
        }
    }
}

impl From<SMPError> for Error<ErrTag> {
    fn from(e: SMPError) -> Self {
        match e {
            SMPError::Block => err!("Broker reported a malformed block."; Decode, Unexpected),
            SMPError::Auth => err!("Broker reported an authentication failure."; Auth),
            SMPError::NoMsg => err!("Broker reported no message available."; Missing),
            SMPError::Internal => err!("Broker reported an internal error."; Unexpected),
            SMPError::Cmd(sub) => err!("Broker rejected the command: {}.", sub.as_str(); Syntax, Invalid),
        }
    }
}
