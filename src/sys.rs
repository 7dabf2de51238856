// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Fail-fast wrappers around the OS primitives used by the launcher.
//!
//! Every wrapper either returns the successful value or prints
//! `<context>: <description>` to stderr and exits the calling process with a
//! failure status. Nothing here is retried. After a `fork` the "calling
//! process" may be a child, in which case only that child goes away.

use std::ffi::CStr;
use std::os::unix::io::RawFd;
use std::process;

use nix::fcntl::{self, OFlag};
use nix::sys::signal::{self, Signal};
use nix::sys::stat::{self, FileStat, Mode};
use nix::unistd::{self, ForkResult, Pid};

use crate::Error;

/// Exit status used for every fatal error
pub const EXIT_FAILURE: i32 = 1;

/// Print the diagnostic and terminate the current process.
pub fn unix_error(context: &str, err: &Error) -> ! {
    eprintln!("{}: {}", context, err);
    process::exit(EXIT_FAILURE)
}

/// Unwraps a result, or terminates the process with a `context: error` line.
pub trait OrExit<T> {
    fn or_exit(self, context: &str) -> T;
}

impl<T, E> OrExit<T> for Result<T, E>
where
    E: Into<Error>,
{
    fn or_exit(self, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => unix_error(context, &err.into()),
        }
    }
}

/// `fork`, the parent dies if no process could be created.
pub fn fork() -> ForkResult {
    unistd::fork().or_exit("Fork error")
}

pub fn open(path: &CStr, flags: OFlag, mode: Mode) -> RawFd {
    fcntl::open(path, flags, mode).or_exit("Open error")
}

pub fn close(fd: RawFd) {
    unistd::close(fd).or_exit("Close error")
}

/// Copies `old_fd` onto `new_fd`, closing `new_fd` first if it was open.
pub fn dup2(old_fd: RawFd, new_fd: RawFd) -> RawFd {
    unistd::dup2(old_fd, new_fd).or_exit("Dup2 error")
}

/// A return of 0 is EOF
pub fn read(fd: RawFd, buf: &mut [u8]) -> usize {
    unistd::read(fd, buf).or_exit("Read error")
}

pub fn write(fd: RawFd, buf: &[u8]) -> usize {
    unistd::write(fd, buf).or_exit("Write error")
}

/// Loops over `write` until every byte has been handed to the kernel.
pub fn write_all(fd: RawFd, mut buf: &[u8]) {
    while !buf.is_empty() {
        let written = write(fd, buf);
        buf = &buf[written..];
    }
}

pub fn stat(path: &CStr) -> FileStat {
    stat::stat(path).or_exit("Stat error")
}

pub fn fstat(fd: RawFd) -> FileStat {
    stat::fstat(fd).or_exit("Stat error")
}

/// Sends `sig` to `pid`, `None` only probes that the process exists.
pub fn kill<S: Into<Option<Signal>>>(pid: Pid, sig: S) {
    signal::kill(pid, sig).or_exit("Kill error")
}
