//! Powerline renderer (spec.md §4.3): colored block segments joined by
//! arrow glyphs, with per-boundary fg/bg color transitions. Replaces the
//! plain expansion path entirely when `theme.layout.style == powerline`.

use crate::color::{Color, ColorCapability};
use crate::context::PromptContext;
use crate::line::strip_ansi;
use crate::segment::{SegmentOutput, SegmentRegistry};
use crate::theme::Theme;

struct ResolvedSegment {
    content: String,
    fg: Color,
    bg: Color,
}

/// Per-name default block background (spec.md §4.3 "Color resolution per
/// segment"), approximated in hex then parsed through the same color path
/// used everywhere else so downgrade behavior stays consistent.
fn default_bg_hex(name: &str) -> &'static str {
    match name {
        "directory" => "#005FAF",
        "git" => "#875FAF",
        "status" => "#AF0000",
        _ => "#444444",
    }
}

fn resolve_color(spec: &str, cap: ColorCapability) -> Color {
    // Parse at full capability first so the hex path always yields a
    // truecolor value, then downgrade separately — parsing directly at
    // `cap` would invoke `%F{#rrggbb}`'s basic-depth silent-drop rule,
    // which is wrong here: a block background must always be visible.
    crate::color::parse_color_spec(spec, ColorCapability::FULL).unwrap_or(Color::NONE).downgrade(cap)
}

/// Walk the theme's enabled-segment list, look each up, apply visibility
/// and per-segment `show` overrides, render, and collect only the
/// non-empty results with their resolved colors (spec.md §4.3
/// "Visible-segment collection" + "Color resolution per segment").
fn collect_visible_segments(
    ctx: &PromptContext,
    theme: &Theme,
    registry: &SegmentRegistry,
) -> Vec<ResolvedSegment> {
    let mut out = Vec::new();
    for name in theme.enabled_segments() {
        let Some(descriptor) = registry.get(name) else { continue };
        if let Some(visible) = descriptor.visible
            && !visible(ctx)
        {
            continue;
        }
        if let Some(over) = theme.override_for(name)
            && over.show == Some(false)
        {
            continue;
        }
        let SegmentOutput { content, is_empty } = (descriptor.render)(ctx, theme);
        if is_empty {
            continue;
        }

        let mut fg = Color::truecolor(255, 255, 255).bold();
        let mut bg = resolve_color(default_bg_hex(name), ctx.color);
        if let Some(text_color) = theme.colors.text {
            fg = text_color;
        }
        if let Some(over) = theme.override_for(name) {
            if let Some(over_fg) = over.fg {
                fg = over_fg;
            }
            if let Some(over_bg) = over.bg {
                bg = over_bg;
            }
        }
        fg = fg.downgrade(ctx.color);
        bg = bg.downgrade(ctx.color);

        out.push(ResolvedSegment { content: strip_ansi(&content), fg, bg });
    }
    out
}

/// Left-to-right assembly for PS1 (spec.md §4.3).
pub fn render_ps1(
    ctx: &PromptContext,
    theme: &Theme,
    registry: &SegmentRegistry,
) -> String {
    let segments = collect_visible_segments(ctx, theme, registry);
    let mut out = String::new();
    let sep = &theme.symbols.separator_left;
    for (i, seg) in segments.iter().enumerate() {
        out.push_str(&seg.bg.emit_bg());
        out.push_str(&seg.fg.emit_fg());
        out.push(' ');
        out.push_str(&seg.content);
        out.push(' ');
        if let Some(next) = segments.get(i + 1) {
            out.push_str(&seg.bg.emit_fg());
            out.push_str(&next.bg.emit_bg());
            out.push_str(sep);
        } else {
            out.push_str("\x1b[0m");
            out.push_str(&seg.bg.emit_fg());
            out.push_str(sep);
            out.push_str("\x1b[0m");
        }
    }
    out
}

/// Right-to-left assembly for RPROMPT (spec.md §4.3).
pub fn render_rprompt(
    ctx: &PromptContext,
    theme: &Theme,
    registry: &SegmentRegistry,
) -> String {
    let segments = collect_visible_segments(ctx, theme, registry);
    let mut out = String::new();
    let sep = &theme.symbols.separator_right;
    for (i, seg) in segments.iter().enumerate() {
        if i == 0 {
            out.push_str(&seg.bg.emit_fg());
            out.push_str(sep);
        } else {
            let prev = &segments[i - 1];
            out.push_str(&seg.bg.emit_fg());
            out.push_str(&prev.bg.emit_bg());
            out.push_str(sep);
        }
        out.push_str(&seg.bg.emit_bg());
        out.push_str(&seg.fg.emit_fg());
        out.push(' ');
        out.push_str(&seg.content);
        out.push(' ');
    }
    if !segments.is_empty() {
        out.push_str("\x1b[0m");
    }
    out
}

/// Visible-segment count as it will appear in `render_ps1`'s output —
/// exposed for the separator-count invariant (spec.md §8 property 6).
pub fn visible_segment_count(ctx: &PromptContext, theme: &Theme, registry: &SegmentRegistry) -> usize {
    collect_visible_segments(ctx, theme, registry).len()
}
