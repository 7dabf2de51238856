// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::ffi::{CStr, CString, OsStr};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::process;

use nix::unistd::{execve, ForkResult};
use tracing::{debug, warn};

use crate::config::{LaunchRequest, LauncherConfig};
use crate::redirect::{LogFile, STDOUT};
use crate::sys::{self, OrExit};
use crate::Error;

/// Status a child exits with when the interpreter could not be exec'd
pub const EXEC_FAILED_STATUS: i32 = 0;

/// One worker about to be created
#[derive(Debug)]
pub struct WorkerSlot {
    index: u32,
    log_path: CString,
}

impl WorkerSlot {
    /// `<logs_dir>/<script_path><index>.log`, the script path is used as given
    pub fn new(logs_dir: &Path, script_path: &OsStr, index: u32) -> Result<Self, Error> {
        let mut log_path = logs_dir.as_os_str().as_bytes().to_vec();
        log_path.push(b'/');
        log_path.extend_from_slice(script_path.as_bytes());
        log_path.extend_from_slice(index.to_string().as_bytes());
        log_path.extend_from_slice(b".log");

        Ok(Self {
            index,
            log_path: CString::new(log_path)?,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn log_path(&self) -> &CStr {
        &self.log_path
    }
}

/// Starts every worker of a request, and forgets about them
#[derive(Debug)]
pub struct FanOut {
    script_path: CString,
    interpreter: CString,
    argv: Vec<CString>,
    envp: Vec<CString>,
    slots: Vec<WorkerSlot>,
}

impl FanOut {
    /// Prepares everything the children need before any of them exist.
    ///
    /// The children only open, duplicate and close their log file before `execve`.
    pub fn new(request: &LaunchRequest, config: &LauncherConfig) -> Result<Self, Error> {
        let script_path = CString::new(request.script_path().as_bytes())?;
        let interpreter = CString::new(config.interpreter.as_os_str().as_bytes())?;

        let slots = (0..request.worker_count())
            .map(|index| WorkerSlot::new(&config.logs_dir, request.script_path(), index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            argv: vec![interpreter.clone(), script_path.clone()],
            script_path,
            interpreter,
            envp: Vec::new(),
            slots,
        })
    }

    pub fn slots(&self) -> &[WorkerSlot] {
        &self.slots
    }

    /// Fork one child per slot, in index order.
    ///
    /// A failed fork ends the launcher; workers that were already started keep running.
    pub fn spawn(&self) {
        for slot in &self.slots {
            // anything buffered would otherwise be duplicated into the child
            io::stdout().flush().or_exit("Write error");

            match sys::fork() {
                ForkResult::Child => self.exec_worker(slot),
                ForkResult::Parent { child } => {
                    debug!(
                        "worker {} is pid {}, logging to {:?}",
                        slot.index(),
                        child,
                        slot.log_path()
                    );
                    println!(
                        "Executing script '{}' in process {}.",
                        self.script_path.to_string_lossy(),
                        slot.index()
                    );
                }
            }
        }
    }

    /// Runs in the child, never returns.
    fn exec_worker(&self, slot: &WorkerSlot) -> ! {
        LogFile::open(slot.log_path()).replace(STDOUT);

        let argv: Vec<&CStr> = self.argv.iter().map(CString::as_c_str).collect();
        let envp: Vec<&CStr> = self.envp.iter().map(CString::as_c_str).collect();
        if let Err(e) = execve(&self.interpreter, &argv[..], &envp[..]) {
            warn!(
                "worker {} could not exec {:?}: {}",
                slot.index(),
                self.interpreter,
                e
            );
        }

        process::exit(EXEC_FAILED_STATUS)
    }
}

/// Fan `request` out over its workers.
pub fn spawn(request: &LaunchRequest, config: &LauncherConfig) -> Result<(), Error> {
    FanOut::new(request, config)?.spawn();
    Ok(())
}
