// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const SCRIPT: &str = "job.sh";
const SCRIPT_BODY: &str = "echo hello from a worker\n";

/// A scratch working directory with a script and an empty `logs/`
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(SCRIPT), SCRIPT_BODY).unwrap();
    fs::create_dir(dir.path().join("logs")).unwrap();
    dir
}

fn fanout(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fanout");
    cmd.current_dir(dir)
        .env_remove("FANOUT_INTERPRETER")
        .env_remove("FANOUT_LOGS_DIR")
        .arg("--interpreter")
        .arg("/bin/cat");
    cmd
}

fn log_path(dir: &Path, index: u32) -> std::path::PathBuf {
    dir.join("logs").join(format!("{}{}.log", SCRIPT, index))
}

/// Workers run detached, give them a moment to write their output
fn wait_for_contents(path: &Path, expected: &str) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let contents = fs::read_to_string(path).unwrap_or_default();
        if contents == expected {
            return;
        }

        assert!(
            Instant::now() < deadline,
            "{} never contained {:?}, last saw {:?}",
            path.display(),
            expected,
            contents
        );
        thread::sleep(Duration::from_millis(20));
    }
}

fn log_count(dir: &Path) -> usize {
    fs::read_dir(dir.join("logs")).unwrap().count()
}

#[test]
fn three_workers() {
    let dir = workspace();

    fanout(dir.path())
        .arg(SCRIPT)
        .arg("3")
        .assert()
        .success()
        .stdout(
            "Executing script 'job.sh' in process 0.\n\
             Executing script 'job.sh' in process 1.\n\
             Executing script 'job.sh' in process 2.\n",
        );

    for index in 0..3 {
        let path = log_path(dir.path(), index);
        wait_for_contents(&path, SCRIPT_BODY);

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600, "{}", path.display());
    }

    assert_eq!(log_count(dir.path()), 3);
    assert!(!dir.path().join("broker.txt").exists());
    assert!(!dir.path().join("broker2.txt").exists());
}

#[test]
fn max_workers() {
    let dir = workspace();

    fanout(dir.path()).arg(SCRIPT).arg("16").assert().success();

    for index in 0..16 {
        wait_for_contents(&log_path(dir.path(), index), SCRIPT_BODY);
    }
    assert_eq!(log_count(dir.path()), 16);
}

#[test]
fn too_many_workers() {
    let dir = workspace();

    fanout(dir.path())
        .arg(SCRIPT)
        .arg("20")
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("USAGE"))
        .stderr(predicate::str::contains("Max = 16 processes"));

    assert_eq!(log_count(dir.path()), 0);
}

#[test]
fn invalid_worker_counts() {
    let dir = workspace();

    for count in &["0", "-1", "abc", "", "2.5"] {
        fanout(dir.path())
            .arg(SCRIPT)
            .arg(count)
            .arg("10.0.0.1")
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("USAGE"));
    }

    assert_eq!(log_count(dir.path()), 0);
    assert!(!dir.path().join("broker.txt").exists());
}

#[test]
fn missing_worker_count() {
    let dir = workspace();

    fanout(dir.path())
        .arg(SCRIPT)
        .assert()
        .failure()
        .stderr(predicate::str::contains("USAGE"));

    assert_eq!(log_count(dir.path()), 0);
}

#[test]
fn primary_broker_only() {
    let dir = workspace();

    fanout(dir.path())
        .arg(SCRIPT)
        .arg("2")
        .arg("10.0.0.1")
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(dir.path().join("broker.txt")).unwrap(),
        "10.0.0.1"
    );
    assert!(!dir.path().join("broker2.txt").exists());

    wait_for_contents(&log_path(dir.path(), 0), SCRIPT_BODY);
    wait_for_contents(&log_path(dir.path(), 1), SCRIPT_BODY);
}

#[test]
fn reruns_overwrite_sidecars_and_logs() {
    let dir = workspace();
    fs::write(dir.path().join("broker.txt"), "108.80.210.36 from last week").unwrap();
    fs::write(dir.path().join("broker2.txt"), "108.80.210.37 from last week").unwrap();

    for _ in 0..2 {
        fanout(dir.path())
            .arg(SCRIPT)
            .arg("1")
            .arg("10.0.0.1")
            .arg("10.0.0.2")
            .assert()
            .success();

        wait_for_contents(&log_path(dir.path(), 0), SCRIPT_BODY);
    }

    assert_eq!(
        fs::read_to_string(dir.path().join("broker.txt")).unwrap(),
        "10.0.0.1"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("broker2.txt")).unwrap(),
        "10.0.0.2"
    );
}

#[test]
fn stale_log_is_truncated() {
    let dir = workspace();
    let stale = "a much longer line left over from a previous run of the launcher\n";
    fs::write(log_path(dir.path(), 0), stale).unwrap();

    fanout(dir.path()).arg(SCRIPT).arg("1").assert().success();

    wait_for_contents(&log_path(dir.path(), 0), SCRIPT_BODY);
}

#[test]
fn failed_exec_is_not_escalated() {
    let dir = workspace();

    cargo_bin_cmd!("fanout")
        .current_dir(dir.path())
        .arg("--interpreter")
        .arg("/nonexistent/interpreter")
        .arg(SCRIPT)
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("in process 1."));

    // the log files were opened before the exec was attempted
    for index in 0..2 {
        let path = log_path(dir.path(), index);
        assert!(path.exists(), "{}", path.display());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}

#[test]
fn missing_logs_dir_only_fails_the_workers() {
    let dir = workspace();
    fs::remove_dir(dir.path().join("logs")).unwrap();

    fanout(dir.path())
        .arg(SCRIPT)
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("in process 0."))
        .stdout(predicate::str::contains("in process 1."))
        .stderr(predicate::str::contains(
            "Open error: No such file or directory",
        ));
}

#[test]
fn unwritable_sidecar_is_fatal() {
    let dir = workspace();
    fs::create_dir(dir.path().join("broker.txt")).unwrap();

    fanout(dir.path())
        .arg(SCRIPT)
        .arg("2")
        .arg("10.0.0.1")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Open error: Is a directory"));

    assert_eq!(log_count(dir.path()), 0);
}

#[test]
fn logs_dir_override() {
    let dir = workspace();
    fs::create_dir(dir.path().join("out")).unwrap();

    fanout(dir.path())
        .arg("--logs-dir")
        .arg("out")
        .arg(SCRIPT)
        .arg("1")
        .assert()
        .success();

    wait_for_contents(&dir.path().join("out").join("job.sh0.log"), SCRIPT_BODY);
    assert_eq!(log_count(dir.path()), 0);
}

#[test]
fn help_goes_to_stdout() {
    cargo_bin_cmd!("fanout")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("broker2.txt"));
}
