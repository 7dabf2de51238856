// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Launch one script on many interpreter processes.
//!
//! Every worker gets its stdout bound to `logs/<script><index>.log` before the
//! interpreter starts. Workers are never waited on, the launcher exits as soon as
//! the last one has been forked and they outlive it.

pub mod cli;
pub mod config;
mod error;
pub mod fork;
pub mod redirect;
pub mod sidecar;
pub mod sys;

use std::path::Path;

pub use config::{LaunchRequest, LauncherConfig, MAX_WORKERS};
pub use error::{Error, ErrorKind};

/// Write the broker files, then start every worker.
///
/// System errors along the way terminate the process, the only errors returned
/// here come from preparing the workers' arguments.
pub fn launch(request: &LaunchRequest, config: &LauncherConfig) -> Result<(), Error> {
    sidecar::write_brokers(request, Path::new("."));
    fork::spawn(request, config)
}
