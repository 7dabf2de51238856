// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Small files written before launch and read by the workers at their own startup.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use tracing::debug;

use crate::config::{LaunchRequest, PRIMARY_BROKER_FILE, SECONDARY_BROKER_FILE};
use crate::sys::{self, OrExit};

/// Replaces the contents of `file_name` with exactly `content`.
///
/// Any failure to open, write or close terminates the process.
pub fn write<P: AsRef<Path>>(file_name: P, content: &[u8]) {
    let file_name = file_name.as_ref();
    let path = CString::new(file_name.as_os_str().as_bytes()).or_exit("Open error");

    let fd = sys::open(
        &path,
        OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
        Mode::from_bits_truncate(0o666),
    );
    sys::write_all(fd, content);
    sys::close(fd);

    debug!("wrote {} bytes to {}", content.len(), file_name.display());
}

/// Writes the broker address files the request carries, relative to `dir`.
///
/// Files for addresses that were not given are left alone.
pub fn write_brokers(request: &LaunchRequest, dir: &Path) {
    let brokers = [
        (PRIMARY_BROKER_FILE, request.primary_broker()),
        (SECONDARY_BROKER_FILE, request.secondary_broker()),
    ];

    for (file_name, address) in brokers.iter() {
        if let Some(address) = address {
            write(dir.join(file_name), address.as_bytes());
        }
    }
}
