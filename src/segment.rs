//! Segment registry & built-ins (spec.md §2, §3 "Segment descriptor"): a
//! table of function records rather than an inheritance hierarchy, per
//! spec.md §9's "Dynamic dispatch over segments" design note.

use indexmap::IndexMap;

use crate::context::PromptContext;
use crate::theme::Theme;

/// What a segment's render function produces. `is_empty` is tracked
/// explicitly (rather than inferred from `content.is_empty()`) so a
/// segment can render a deliberately-empty-but-visible separator if it
/// ever needs to — none of the built-ins below do, but the registry
/// contract allows it.
#[derive(Debug, Clone, Default)]
pub struct SegmentOutput {
    pub content: String,
    pub is_empty: bool,
}

impl SegmentOutput {
    fn text(content: impl Into<String>) -> Self {
        let content = content.into();
        let is_empty = content.is_empty();
        Self { content, is_empty }
    }

    fn empty() -> Self {
        Self { content: String::new(), is_empty: true }
    }
}

pub type RenderFn = fn(&PromptContext, &Theme) -> SegmentOutput;
pub type VisibilityFn = fn(&PromptContext) -> bool;

#[derive(Clone, Copy)]
pub struct SegmentDescriptor {
    pub name: &'static str,
    pub render: RenderFn,
    pub visible: Option<VisibilityFn>,
}

/// Named segments with render + visibility predicates (spec.md §2). No
/// state beyond the registry row — segments are stateless functions over
/// `PromptContext`.
pub struct SegmentRegistry {
    segments: IndexMap<&'static str, SegmentDescriptor>,
}

impl SegmentRegistry {
    pub fn new() -> Self {
        Self { segments: IndexMap::new() }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in BUILTIN_SEGMENTS {
            registry.register(*descriptor);
        }
        registry
    }

    pub fn register(&mut self, descriptor: SegmentDescriptor) {
        self.segments.insert(descriptor.name, descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&SegmentDescriptor> {
        self.segments.get(name)
    }
}

impl Default for SegmentRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn render_user(ctx: &PromptContext, _theme: &Theme) -> SegmentOutput {
    SegmentOutput::text(ctx.username.clone())
}

fn render_directory(ctx: &PromptContext, _theme: &Theme) -> SegmentOutput {
    SegmentOutput::text(ctx.cwd_display.clone())
}

fn render_git(ctx: &PromptContext, theme: &Theme) -> SegmentOutput {
    let Some(status) = &ctx.git_status else { return SegmentOutput::empty() };
    if !status.is_repo {
        return SegmentOutput::empty();
    }
    let name = match (&status.branch, &status.commit) {
        (Some(branch), _) => branch.clone(),
        (None, Some(commit)) => format!(":{commit}"),
        (None, None) => return SegmentOutput::empty(),
    };
    let icon = &theme.symbols.branch_icon;
    let content = if icon.is_empty() { name } else { format!("{icon} {name}") };
    SegmentOutput::text(content)
}

fn git_is_visible(ctx: &PromptContext) -> bool {
    ctx.git_status.as_ref().is_some_and(|s| s.is_repo)
}

fn render_status(ctx: &PromptContext, theme: &Theme) -> SegmentOutput {
    let mut parts = Vec::new();
    if let Some(status) = &ctx.git_status {
        let dirty = status.staged_count + status.unstaged_count + status.untracked_count > 0;
        if dirty {
            parts.push(theme.symbols.dirty_icon.clone());
        }
        if status.ahead > 0 {
            parts.push(format!("{}{}", theme.symbols.ahead_icon, status.ahead));
        }
        if status.behind > 0 {
            parts.push(format!("{}{}", theme.symbols.behind_icon, status.behind));
        }
    }
    if ctx.last_exit_code != 0 {
        parts.push(ctx.last_exit_code.to_string());
    }
    if parts.is_empty() { SegmentOutput::empty() } else { SegmentOutput::text(parts.join(" ")) }
}

fn render_jobs(ctx: &PromptContext, _theme: &Theme) -> SegmentOutput {
    if ctx.background_job_count == 0 {
        SegmentOutput::empty()
    } else {
        SegmentOutput::text(ctx.background_job_count.to_string())
    }
}

fn jobs_is_visible(ctx: &PromptContext) -> bool {
    ctx.background_job_count > 0
}

const BUILTIN_SEGMENTS: &[SegmentDescriptor] = &[
    SegmentDescriptor { name: "user", render: render_user, visible: None },
    SegmentDescriptor { name: "directory", render: render_directory, visible: None },
    SegmentDescriptor { name: "git", render: render_git, visible: Some(git_is_visible) },
    SegmentDescriptor { name: "status", render: render_status, visible: None },
    SegmentDescriptor { name: "jobs", render: render_jobs, visible: Some(jobs_is_visible) },
];
