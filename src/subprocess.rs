//! Timed subprocess runner (spec.md §4.1): spawn `/bin/sh -c <cmd>`, bound
//! the wait by a wall-clock timeout, and guarantee no zombie survives.
//!
//! Grounded on `worktrunk::shell_exec::run`'s instrumentation style (timed,
//! logged, `[lp-trace]`-tagged) but built on `std::process::Command` +
//! `wait-timeout` instead of a raw `fork`/`pipe`/`exec` — this crate forbids
//! `unsafe_code`, and `wait-timeout` gives the same "wait up to N, then
//! escalate" shape without it. Escalation (`SIGTERM` → 100ms grace →
//! `SIGKILL` → blocking reap) uses `nix::sys::signal` against the child's
//! pid, matching spec.md §4.1 step 4 exactly.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use wait_timeout::ChildExt;

/// Result of a single timed run. `exit_status == -1` covers every failure
/// path (spawn failure, timeout); `timed_out` disambiguates the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_status: i32,
    pub timed_out: bool,
    pub stdout: String,
}

const GRACE_PERIOD: Duration = Duration::from_millis(100);

/// Run `sh -c cmd`, capturing stdout and discarding stderr, bounded by
/// `timeout_ms`. Never blocks past `timeout_ms + ~100ms`.
pub fn run(cmd: &str, timeout_ms: u64) -> RunOutcome {
    run_command(Command::new("/bin/sh").arg("-c").arg(cmd), cmd, timeout_ms)
}

/// Convenience form composing `git -C '<dir>' <args> 2>/dev/null`, per
/// spec.md §4.1's "Convenience form".
pub fn run_in_dir(dir: &std::path::Path, args: &[&str], timeout_ms: u64) -> RunOutcome {
    let quoted_dir = shell_quote(&dir.to_string_lossy());
    let joined_args = args.join(" ");
    let cmd = format!("git -C {quoted_dir} {joined_args} 2>/dev/null");
    run(&cmd, timeout_ms)
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn run_command(command: &mut Command, cmd_str: &str, timeout_ms: u64) -> RunOutcome {
    command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::null());

    let t0 = Instant::now();
    let mut child = match command.spawn() {
        Ok(c) => c,
        Err(e) => {
            log::debug!("[lp-trace] cmd=\"{cmd_str}\" spawn_err=\"{e}\"");
            return RunOutcome { exit_status: -1, timed_out: false, stdout: String::new() };
        }
    };

    let outcome = match child.wait_timeout(Duration::from_millis(timeout_ms)) {
        Ok(Some(status)) => {
            let mut stdout = String::new();
            if let Some(mut out) = child.stdout.take() {
                let _ = out.read_to_string(&mut stdout);
            }
            let trimmed = stdout.trim_end_matches(['\n', '\r']).to_string();
            RunOutcome {
                exit_status: status.code().unwrap_or(-1),
                timed_out: false,
                stdout: trimmed,
            }
        }
        Ok(None) => {
            escalate(&mut child);
            RunOutcome { exit_status: -1, timed_out: true, stdout: String::new() }
        }
        Err(e) => {
            log::debug!("[lp-trace] cmd=\"{cmd_str}\" wait_err=\"{e}\"");
            escalate(&mut child);
            RunOutcome { exit_status: -1, timed_out: false, stdout: String::new() }
        }
    };

    let dur_ms = t0.elapsed().as_secs_f64() * 1000.0;
    log::debug!(
        "[lp-trace] cmd=\"{cmd_str}\" dur={dur_ms:.1}ms exit={} timed_out={}",
        outcome.exit_status,
        outcome.timed_out
    );
    outcome
}

/// `SIGTERM` → 100ms grace → `SIGKILL` → blocking reap. Swallows signal-send
/// errors (the child may have exited between the timeout and here) but
/// always reaps, so no zombie survives.
fn escalate(child: &mut std::process::Child) {
    let pid = Pid::from_raw(child.id() as i32);
    let _ = signal::kill(pid, Signal::SIGTERM);
    if child.wait_timeout(GRACE_PERIOD).ok().flatten().is_some() {
        return;
    }
    let _ = signal::kill(pid, Signal::SIGKILL);
    let _ = child.wait();
}
