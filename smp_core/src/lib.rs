//! Core error handling, logging, configuration and byte-level primitives
//! shared by every crate in this workspace.
#![forbid(unsafe_code)]

#[macro_use]
pub mod macros {
    #[macro_use]
    pub mod error;
}

pub mod byte;
pub mod config;
pub mod error;
pub mod log;
pub mod parse;
pub mod prelude;
pub mod rand;

use error::Error;

pub type Outcome<V> = std::result::Result<V, Error<error::ErrTag>>;

pub trait GenTag:
    Clone
    + std::fmt::Debug
    + Default
    + std::fmt::Display
    + Send
    + Sync
    + 'static
{}
