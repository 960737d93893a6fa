//! POSIX user-database, hostname, and tty lookups backing the bash escape
//! table (spec.md §4.2: `\u`, `\h`/`\H`, `~`-substitution in `\w`, `\l`).
//!
//! These are the "near-instant POSIX calls" spec.md §5 says the render
//! path may treat as synchronous. Implemented on `nix` rather than shelling
//! out, the same way `worktrunk::shell_exec` prefers direct syscalls over
//! spawning `whoami`/`hostname` subprocesses wherever the libc wrapper is
//! available.

#[cfg(unix)]
pub fn effective_uid_is_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}

#[cfg(not(unix))]
pub fn effective_uid_is_root() -> bool {
    false
}

/// Effective user's login name, via `getpwuid(geteuid())`. Falls back to
/// `$USER` if the user-database lookup fails (e.g. no matching passwd
/// entry, common in minimal containers).
#[cfg(unix)]
pub fn effective_username() -> String {
    let uid = nix::unistd::Uid::effective();
    nix::unistd::User::from_uid(uid)
        .ok()
        .flatten()
        .map(|u| u.name)
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_default()
}

#[cfg(not(unix))]
pub fn effective_username() -> String {
    std::env::var("USER").unwrap_or_default()
}

/// The effective user's home directory from the user database, used for
/// `\w`/`\W`'s `$HOME`-prefix substitution (distinct from [`crate::path::home_dir`],
/// which trusts `$HOME` — spec.md §4.2 specifies the *user-database* home).
#[cfg(unix)]
pub fn effective_home_dir() -> Option<std::path::PathBuf> {
    let uid = nix::unistd::Uid::effective();
    nix::unistd::User::from_uid(uid).ok().flatten().map(|u| u.dir)
}

#[cfg(not(unix))]
pub fn effective_home_dir() -> Option<std::path::PathBuf> {
    crate::path::home_dir()
}

/// Host name via `gethostname(2)`.
#[cfg(unix)]
pub fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|s| s.into_string().ok())
        .unwrap_or_default()
}

#[cfg(not(unix))]
pub fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_default()
}

/// `ttyname(stdin)`'s path component after `/dev/`, or `None` if stdin
/// isn't a tty (spec.md §4.2 `\l`: emit `?` in that case).
#[cfg(unix)]
pub fn tty_name() -> Option<String> {
    use std::os::fd::AsFd;
    let stdin = std::io::stdin();
    let path = nix::unistd::ttyname(stdin.as_fd()).ok()?;
    let s = path.to_string_lossy();
    Some(s.strip_prefix("/dev/").unwrap_or(&s).to_string())
}

#[cfg(not(unix))]
pub fn tty_name() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_is_non_empty_on_unix() {
        #[cfg(unix)]
        assert!(!hostname().is_empty());
    }

    #[test]
    fn effective_username_is_non_empty_on_unix() {
        #[cfg(unix)]
        assert!(!effective_username().is_empty());
    }
}
