// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::ffi::CStr;
use std::os::unix::io::{AsRawFd, RawFd};

use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use nix::unistd::close;

use crate::sys;

pub const NULL: RawFd = -1;
pub const STDOUT: RawFd = libc::STDOUT_FILENO;

/// An open worker log file, destined to become a process' stdout
#[derive(Debug)]
pub struct LogFile {
    raw_fd: RawFd,
}

impl LogFile {
    /// Opens (creating or truncating) the log file, readable and writable by the owner only.
    ///
    /// Fatal to the calling process on failure.
    pub fn open(path: &CStr) -> Self {
        let raw_fd = sys::open(
            path,
            OFlag::O_RDWR | OFlag::O_CREAT | OFlag::O_TRUNC,
            Mode::S_IRUSR | Mode::S_IWUSR,
        );

        Self { raw_fd }
    }

    /// Forget the fd so that drop does not close it
    fn forget(&mut self) {
        self.raw_fd = NULL;
    }

    /// Moves the file onto `target_fd`
    ///
    /// `target_fd` now refers to the log file and the original descriptor is closed.
    pub fn replace(mut self, target_fd: RawFd) {
        // nothing to do if these are the same file descriptors
        if self.raw_fd == target_fd {
            self.forget();
            return;
        }

        sys::dup2(self.raw_fd, target_fd);
        sys::close(self.raw_fd);
        self.forget();
    }
}

impl AsRawFd for LogFile {
    fn as_raw_fd(&self) -> RawFd {
        self.raw_fd
    }
}

impl Drop for LogFile {
    fn drop(&mut self) {
        match self.raw_fd {
            // don't implicitly close any of the std io
            0..=2 => return,
            // don't close -1, NULL
            i if i < 0 => return,
            _ => (),
        }

        close(self.raw_fd)
            .map_err(|e| tracing::warn!("error closing log file ({}): {}", self.raw_fd, e))
            .ok();
    }
}
