//! Filesystem path helpers shared by the escape/template expansion paths.

use std::path::{Path, PathBuf};

/// Get the user's home directory.
///
/// Uses the `home` crate, which reads `$HOME` on Unix. Kept as a thin
/// wrapper rather than calling the crate directly at every use site so the
/// lookup can be swapped or cached in one place later.
pub fn home_dir() -> Option<PathBuf> {
    home::home_dir()
}

/// Format a filesystem path for user-facing output.
///
/// Replaces a home-directory prefix with `~` (e.g. `/home/alex/src/wt` ->
/// `~/src/wt`). Paths outside home are returned unchanged. This is the
/// `cwd_display` value in [`crate::context::PromptContext`] and backs the
/// bash `\w` escape's home-substitution rule.
pub fn format_path_for_display(path: &Path) -> String {
    if let Some(home) = home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        if stripped.as_os_str().is_empty() {
            return "~".to_string();
        }

        let mut display_path = PathBuf::from("~");
        display_path.push(stripped);
        return display_path.display().to_string();
    }

    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortens_path_under_home() {
        let Some(home) = home_dir() else {
            return;
        };

        let path = home.join("projects").join("lush");
        let formatted = format_path_for_display(&path);

        assert!(formatted.starts_with("~"), "expected tilde prefix, got {formatted}");
        assert!(formatted.ends_with("lush"), "expected leaf component, got {formatted}");
    }

    #[test]
    fn shows_home_as_tilde() {
        let Some(home) = home_dir() else {
            return;
        };
        assert_eq!(format_path_for_display(&home), "~");
    }

    #[test]
    fn leaves_non_home_paths_unchanged() {
        let path = PathBuf::from("/tmp/lush-non-home-path");
        assert_eq!(format_path_for_display(&path), path.display().to_string());
    }

    #[test]
    fn path_sharing_home_string_prefix_is_not_shortened() {
        let Some(home) = home_dir() else {
            return;
        };
        let mut raw = home.into_os_string();
        raw.push("ed-suffix");
        let path = PathBuf::from(raw);
        let formatted = format_path_for_display(&path);
        assert!(!formatted.starts_with('~'), "got {formatted}");
    }
}
