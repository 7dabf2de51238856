// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use crate::Error;

/// Upper bound on the number of workers a single launch may request
pub const MAX_WORKERS: u32 = 16;

pub const DEFAULT_INTERPRETER: &str = "/usr/bin/php";
pub const DEFAULT_LOGS_DIR: &str = "logs";

/// Receives the first optional broker address
pub const PRIMARY_BROKER_FILE: &str = "broker.txt";
/// Receives the second optional broker address
pub const SECONDARY_BROKER_FILE: &str = "broker2.txt";

/// Where the workers come from and where their output goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LauncherConfig {
    pub interpreter: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
        }
    }
}

/// A validated request to run `script_path` on `worker_count` processes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchRequest {
    script_path: OsString,
    worker_count: u32,
    primary_broker: Option<OsString>,
    secondary_broker: Option<OsString>,
}

impl LaunchRequest {
    /// Validates the raw command line values.
    ///
    /// The worker count must parse to an integer in `1..=MAX_WORKERS`, anything that
    /// doesn't parse is treated as `0` and so fails the same range check.
    pub fn new(
        script_path: &OsStr,
        worker_count: &OsStr,
        primary_broker: Option<&OsStr>,
        secondary_broker: Option<&OsStr>,
    ) -> Result<Self, Error> {
        if script_path.is_empty() {
            return Err(Error::usage("SCRIPT must not be empty"));
        }

        let count = parse_worker_count(worker_count);
        if count < 1 || count > i64::from(MAX_WORKERS) {
            return Err(Error::usage(format!(
                "N must be between 1 and {}, got {:?}",
                MAX_WORKERS, worker_count
            )));
        }

        Ok(Self {
            script_path: script_path.to_os_string(),
            worker_count: count as u32,
            primary_broker: primary_broker.map(OsStr::to_os_string),
            secondary_broker: secondary_broker.map(OsStr::to_os_string),
        })
    }

    pub fn script_path(&self) -> &OsStr {
        &self.script_path
    }

    pub fn worker_count(&self) -> u32 {
        self.worker_count
    }

    pub fn primary_broker(&self) -> Option<&OsStr> {
        self.primary_broker.as_deref()
    }

    pub fn secondary_broker(&self) -> Option<&OsStr> {
        self.secondary_broker.as_deref()
    }
}

fn parse_worker_count(raw: &OsStr) -> i64 {
    raw.to_str()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0)
}
