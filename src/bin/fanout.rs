// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::io;
use std::process;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fanout::sys::{unix_error, EXIT_FAILURE};
use fanout::{cli, launch};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let (request, config) = match cli::parse_from(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) if e.is_usage() => {
            eprintln!("error: {}", e);
            cli::write_usage(&mut io::stderr()).ok();
            process::exit(EXIT_FAILURE);
        }
        Err(e) => unix_error("Argument error", &e),
    };

    if let Err(e) = launch(&request, &config) {
        unix_error("Launch error", &e);
    }
}
