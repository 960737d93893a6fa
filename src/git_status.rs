//! Git-status probe dispatch (spec.md §4.5 "Dispatch — git-status"), used
//! by the async worker. Grounded on `worktrunk::git::Repository`'s
//! porcelain-parsing style, but built on [`crate::subprocess::run_in_dir`]
//! so every probe is wall-clock bounded instead of a bare `Command::output`.

use std::path::Path;

use crate::context::GitStatus;

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Outcome of a full probe sweep: the folded status plus whether any
/// individual subprocess call hit its wall-clock bound. The worker uses
/// `timed_out` to pick [`crate::worker::ResultCode::SystemCall`] over
/// `Success` even though every field still gets a best-effort value.
pub struct ProbeOutcome {
    pub status: GitStatus,
    pub timed_out: bool,
}

/// Run every probe spec.md §4.5 lists and fold the results into a
/// [`GitStatus`]. Never fails outward — a probe that errors or times out
/// just leaves its fields at the default, per spec.md §7's "subprocess
/// failures are absorbed into the async response" rule.
pub fn probe(cwd: &Path, timeout_ms: Option<u64>) -> ProbeOutcome {
    let timeout_ms = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    let mut status = GitStatus::default();
    let mut timed_out = false;
    macro_rules! run {
        ($args:expr) => {{
            let outcome = crate::subprocess::run_in_dir(cwd, $args, timeout_ms);
            timed_out |= outcome.timed_out;
            outcome
        }};
    }

    let git_dir = run!(&["rev-parse", "--git-dir"]);
    if git_dir.exit_status != 0 {
        return ProbeOutcome { status, timed_out };
    }
    status.is_repo = true;

    let branch = run!(&["branch", "--show-current"]);
    if branch.exit_status == 0 && !branch.stdout.is_empty() {
        status.branch = Some(branch.stdout.clone());
    } else {
        status.is_detached = true;
        let commit = run!(&["rev-parse", "--short", "HEAD"]);
        if commit.exit_status == 0 {
            status.commit = Some(commit.stdout);
        }
    }

    // symbolic-ref HEAD is authoritative: it fails exactly when HEAD is
    // detached, overriding the branch-name-based guess above.
    let symbolic = run!(&["symbolic-ref", "HEAD"]);
    status.is_detached = symbolic.exit_status != 0;

    let porcelain = run!(&["status", "--porcelain"]);
    if porcelain.exit_status == 0 {
        for line in porcelain.stdout.lines() {
            let mut chars = line.chars();
            let Some(index_status) = chars.next() else { continue };
            let worktree_status = chars.next().unwrap_or(' ');
            if index_status == '?' {
                status.untracked_count += 1;
                continue;
            }
            if index_status != ' ' {
                status.staged_count += 1;
            }
            if worktree_status != ' ' && worktree_status != '?' {
                status.unstaged_count += 1;
            }
        }
    }

    let ahead_behind = run!(&["rev-list", "--left-right", "--count", "HEAD...@{upstream}"]);
    if ahead_behind.exit_status == 0 {
        let mut parts = ahead_behind.stdout.split_whitespace();
        if let (Some(ahead), Some(behind)) = (parts.next(), parts.next()) {
            status.ahead = ahead.parse().unwrap_or(0);
            status.behind = behind.parse().unwrap_or(0);
        }
    }

    let git_dir_path = resolve_git_dir(cwd, &git_dir.stdout);
    status.is_merging = git_dir_path.join("MERGE_HEAD").exists();
    status.is_rebasing =
        git_dir_path.join("rebase-merge").exists() || git_dir_path.join("rebase-apply").exists();

    ProbeOutcome { status, timed_out }
}

fn resolve_git_dir(cwd: &Path, git_dir_stdout: &str) -> std::path::PathBuf {
    let git_dir = Path::new(git_dir_stdout);
    if git_dir.is_absolute() { git_dir.to_path_buf() } else { cwd.join(git_dir) }
}
