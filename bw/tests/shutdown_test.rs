//! End-to-end tests for the `bw` binary
//!
//! These spawn the real binary, wait for it to report that it is running,
//! and deliver termination signals with nix.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::prelude::*;
use buildwatch::SHUTDOWN_NOTICE;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use predicates::prelude::*;
use tempfile::TempDir;

const READY_LINE: &str = "Watcher running";

fn write_config(dir: &Path) -> std::path::PathBuf {
    // The repo path is not a checkout, so every check fails and is logged
    let path = dir.join("buildwatch.yml");
    let yaml = format!(
        "watcher:\n  repo-path: {}\n  poll-interval-secs: 1\n  detection: pull-output\n",
        dir.display()
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

fn spawn_watcher(dir: &Path) -> (Child, mpsc::Receiver<String>) {
    let config = write_config(dir);
    let mut child = Command::new(env!("CARGO_BIN_EXE_bw"))
        .arg("--config")
        .arg(&config)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn bw");

    let stdout = child.stdout.take().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    (child, rx)
}

fn wait_for_line(rx: &mpsc::Receiver<String>, needle: &str, lines: &mut Vec<String>) {
    let deadline = Instant::now() + Duration::from_secs(20);
    while Instant::now() < deadline {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => {
                let found = line.contains(needle);
                lines.push(line);
                if found {
                    return;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    panic!("Did not see {:?} in output:\n{}", needle, lines.join("\n"));
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> ExitStatus {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("bw did not exit within {:?}", timeout);
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn assert_graceful_stop(signal: Signal) {
    let temp = TempDir::new().unwrap();
    let (mut child, rx) = spawn_watcher(temp.path());
    let mut lines = Vec::new();

    wait_for_line(&rx, READY_LINE, &mut lines);

    kill(Pid::from_raw(child.id() as i32), signal).expect("Failed to send signal");
    let status = wait_for_exit(&mut child, Duration::from_secs(5));

    lines.extend(rx.iter());
    let output = lines.join("\n");

    assert!(status.success(), "bw exited with {:?}:\n{}", status, output);
    assert!(
        predicate::str::contains(SHUTDOWN_NOTICE).eval(&output),
        "missing shutdown notice:\n{}",
        output
    );
}

#[test]
fn test_sigterm_stops_gracefully() {
    assert_graceful_stop(Signal::SIGTERM);
}

#[test]
fn test_sigint_stops_gracefully() {
    assert_graceful_stop(Signal::SIGINT);
}

#[test]
fn test_failed_checks_keep_loop_alive() {
    let temp = TempDir::new().unwrap();
    let (mut child, rx) = spawn_watcher(temp.path());
    let mut lines = Vec::new();

    wait_for_line(&rx, READY_LINE, &mut lines);
    // Two failing cycles, one second apart
    wait_for_line(&rx, "Failed to check for updates", &mut lines);
    wait_for_line(&rx, "Failed to check for updates", &mut lines);
    assert!(child.try_wait().unwrap().is_none(), "bw exited after a failed check");

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();
    assert!(wait_for_exit(&mut child, Duration::from_secs(5)).success());
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("bw")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("bw "));
}

#[test]
fn test_missing_config_file_fails() {
    Command::cargo_bin("bw")
        .unwrap()
        .args(["--config", "/nonexistent/buildwatch.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_malformed_local_config_fails() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(".buildwatch.yml"), "watcher:\n  poll-interval-secs: [bad]\n").unwrap();

    Command::cargo_bin("bw")
        .unwrap()
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config from .buildwatch.yml"));
}

#[test]
fn test_unexpected_argument_fails() {
    Command::cargo_bin("bw").unwrap().arg("build").assert().failure();
}
