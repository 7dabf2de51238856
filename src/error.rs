// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::ffi::NulError;
use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("{0}")]
    IoError(#[from] io::Error),
    #[error("{}", errno_desc(.0))]
    NixError(#[from] nix::Error),
    #[error("argument contains a nul byte: {0}")]
    NulError(#[from] NulError),
    #[error("{0}")]
    Usage(String),
    #[error("an error occured: {0}")]
    ErrorMsg(String),
    #[error("an error occured: {0}")]
    ErrorStr(&'static str),
}

/// Only the errno description, the context is supplied by the caller
fn errno_desc(err: &nix::Error) -> String {
    match err.as_errno() {
        Some(errno) => errno.desc().to_string(),
        None => err.to_string(),
    }
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self(kind)
    }

    pub fn usage<S: Into<String>>(msg: S) -> Self {
        Self::from_kind(ErrorKind::Usage(msg.into()))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Usage errors are reported with the help text, everything else is fatal
    pub fn is_usage(&self) -> bool {
        matches!(self.0, ErrorKind::Usage(_))
    }
}

impl<E> From<E> for Error
where
    E: Into<ErrorKind>,
{
    fn from(err: E) -> Self {
        Self::from_kind(err.into())
    }
}

impl From<&'static str> for Error {
    fn from(err: &'static str) -> Self {
        Self::from_kind(ErrorKind::ErrorStr(err))
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::from_kind(ErrorKind::ErrorMsg(err))
    }
}
