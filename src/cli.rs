// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use clap::{App, AppSettings, Arg, ArgMatches};

use crate::config::{LaunchRequest, LauncherConfig, DEFAULT_INTERPRETER, DEFAULT_LOGS_DIR};
use crate::Error;

pub const SCRIPT: &str = "SCRIPT";
pub const WORKERS: &str = "N";
pub const PRIMARY_BROKER: &str = "IP";
pub const SECONDARY_BROKER: &str = "IP2";
pub const INTERPRETER: &str = "interpreter";
pub const LOGS_DIR: &str = "logs-dir";

/// The command line surface of the launcher
pub fn app() -> App<'static, 'static> {
    App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Launch a script on multiple processes.")
        .setting(AppSettings::AllowNegativeNumbers)
        .arg(
            Arg::with_name(SCRIPT)
                .required(true)
                .index(1)
                .help("Path to the script to run"),
        )
        .arg(
            Arg::with_name(WORKERS)
                .required(true)
                .index(2)
                .help("Number of processes to run the script on. Max = 16 processes."),
        )
        .arg(
            Arg::with_name(PRIMARY_BROKER)
                .index(3)
                .help("IP address of a broker to connect to, written to 'broker.txt'"),
        )
        .arg(
            Arg::with_name(SECONDARY_BROKER)
                .index(4)
                .help("IP address of a second broker to connect to, written to 'broker2.txt'"),
        )
        .arg(
            Arg::with_name(INTERPRETER)
                .long(INTERPRETER)
                .value_name("PATH")
                .env("FANOUT_INTERPRETER")
                .default_value(DEFAULT_INTERPRETER)
                .takes_value(true)
                .help("Interpreter each worker runs the script with"),
        )
        .arg(
            Arg::with_name(LOGS_DIR)
                .long(LOGS_DIR)
                .value_name("DIR")
                .env("FANOUT_LOGS_DIR")
                .default_value(DEFAULT_LOGS_DIR)
                .takes_value(true)
                .help("Directory receiving one stdout log per worker"),
        )
}

/// Parses and validates a full argument list, including the program name.
///
/// `--help` and `--version` are printed and exit immediately, every other problem is a
/// usage error.
pub fn parse_from<I, T>(args: I) -> Result<(LaunchRequest, LauncherConfig), Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match app().get_matches_from_safe(args) {
        Ok(matches) => matches,
        Err(e) => match e.kind {
            clap::ErrorKind::HelpDisplayed | clap::ErrorKind::VersionDisplayed => e.exit(),
            // the full help is printed by the caller, keep only the reason
            _ => {
                let reason = e.message.lines().next().unwrap_or_default();
                return Err(Error::usage(reason.trim_start_matches("error: ")));
            }
        },
    };

    from_matches(&matches)
}

fn from_matches(matches: &ArgMatches<'_>) -> Result<(LaunchRequest, LauncherConfig), Error> {
    let script = matches
        .value_of_os(SCRIPT)
        .ok_or_else(|| Error::usage("SCRIPT is required"))?;
    let workers = matches
        .value_of_os(WORKERS)
        .ok_or_else(|| Error::usage("N is required"))?;

    let request = LaunchRequest::new(
        script,
        workers,
        matches.value_of_os(PRIMARY_BROKER),
        matches.value_of_os(SECONDARY_BROKER),
    )?;

    let mut config = LauncherConfig::default();
    if let Some(interpreter) = matches.value_of_os(INTERPRETER) {
        config.interpreter = PathBuf::from(interpreter);
    }
    if let Some(logs_dir) = matches.value_of_os(LOGS_DIR) {
        config.logs_dir = PathBuf::from(logs_dir);
    }

    Ok((request, config))
}

/// Writes the full multi-line help, used whenever the arguments are rejected.
pub fn write_usage<W: Write>(out: &mut W) -> Result<(), Error> {
    app()
        .write_long_help(out)
        .map_err(|e| Error::from(e.message))?;
    writeln!(out)?;
    Ok(())
}
