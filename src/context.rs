//! The runtime snapshot that drives a single render (spec.md §3).

use crate::color::ColorCapability;
use std::path::PathBuf;

/// Repository status payload carried by an async git-status response
/// (spec.md §3 "Async response").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GitStatus {
    pub is_repo: bool,
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub is_detached: bool,
    pub is_merging: bool,
    pub is_rebasing: bool,
    pub ahead: usize,
    pub behind: usize,
    pub staged_count: usize,
    pub unstaged_count: usize,
    pub untracked_count: usize,
}

/// The runtime snapshot driving a single render. Owned by the composer,
/// mutated by shell events between renders (spec.md §3, §4.4).
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub username: String,
    pub hostname: String,
    pub cwd: PathBuf,
    /// Home-relative display form of `cwd` (`~` substitution applied).
    pub cwd_display: String,
    pub last_exit_code: i32,
    pub background_job_count: u32,
    pub history_number: u64,
    pub command_number: u64,
    pub color: ColorCapability,
    /// Most recent git-status response for `cwd`, if the async worker has
    /// completed one. `None` until the first probe lands.
    pub git_status: Option<GitStatus>,
    /// Shell name / version, injected by the hosting shell (spec.md §4.2
    /// `\s`/`\v`/`\V` — this core does not know its own host's identity).
    pub shell_name: String,
    pub shell_version_major_minor: String,
    pub shell_version_full: String,
}

impl PromptContext {
    /// Build a context from the current process environment. Username and
    /// hostname come from the POSIX user database / `gethostname`, not
    /// `$USER`/`$HOSTNAME`, matching bash's own `\u`/`\h` semantics.
    pub fn from_environment() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let cwd_display = crate::path::format_path_for_display(&cwd);
        Self {
            username: crate::posix::effective_username(),
            hostname: crate::posix::hostname(),
            cwd,
            cwd_display,
            last_exit_code: 0,
            background_job_count: 0,
            history_number: 0,
            command_number: 0,
            color: ColorCapability::default(),
            git_status: None,
            shell_name: "lush".to_string(),
            shell_version_major_minor: String::new(),
            shell_version_full: String::new(),
        }
    }

    /// Refresh `cwd`/`cwd_display` from the process environment. Called on
    /// the `chpwd` shell event (spec.md §4.4).
    pub fn refresh_directory(&mut self) {
        if let Ok(cwd) = std::env::current_dir() {
            self.cwd_display = crate::path::format_path_for_display(&cwd);
            self.cwd = cwd;
        }
    }
}
