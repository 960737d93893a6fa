//! Prompt composer (spec.md §4.4): orchestrates the template/escape and
//! powerline render paths, caches output, and reacts to shell events.

use crate::context::PromptContext;
use crate::error::PromptResult;
use crate::events::{EventHandler, ShellEvent, ShellEventBus, SubscriptionHandle};
use crate::segment::SegmentRegistry;
use crate::symtab::{PromptVar, SymbolTableMirror};
use crate::template::TemplateContext;
use crate::theme::{RenderStyle, Theme};

#[derive(Debug, Clone, Default)]
struct RenderedOutput {
    ps1: String,
    ps2: String,
    ps1_visual_width: usize,
    ps2_visual_width: usize,
    dirty: bool,
}

/// Owns a [`PromptContext`] and the cached rendered output, per spec.md
/// §4.4. `themes` is a small named registry since a shell session may hold
/// more than one loaded theme but renders with exactly one active at a
/// time.
pub struct Composer {
    context: PromptContext,
    registry: SegmentRegistry,
    themes: Vec<Theme>,
    active_theme: usize,
    cache: RenderedOutput,
    subscriptions: Vec<SubscriptionHandle>,
    /// Format-string bookkeeping for `PS1`/`PS2`/`PROMPT` (spec.md §6). Seeded
    /// from the active theme's layout formats; `set_prompt_format` is the
    /// only way shell code is meant to change them afterward, so the
    /// `PS1`/`PROMPT` mirroring invariant always holds for whatever the
    /// composer renders.
    symtab: SymbolTableMirror,
}

impl Composer {
    /// spec.md §4.4 `init(segments, themes)`.
    pub fn init(registry: SegmentRegistry, themes: Vec<Theme>) -> PromptResult<Self> {
        if themes.is_empty() {
            return Err(crate::error::PromptError::InvalidParameter);
        }
        let mut symtab = SymbolTableMirror::new();
        symtab.set(PromptVar::Ps1, themes[0].layout.ps1_format.clone());
        symtab.set(PromptVar::Ps2, themes[0].layout.ps2_format.clone());
        Ok(Self {
            context: PromptContext::from_environment(),
            registry,
            themes,
            active_theme: 0,
            cache: RenderedOutput { dirty: true, ..Default::default() },
            subscriptions: Vec::new(),
            symtab,
        })
    }

    /// spec.md §6: record a shell-level write to `PS1`/`PS2`/`PROMPT`.
    /// Writing `Ps1` or `Prompt` mirrors into the other per
    /// [`SymbolTableMirror::set`]; either one invalidates the cached PS1.
    /// Writing `Ps2` invalidates the cached PS2 only.
    pub fn set_prompt_format(&mut self, var: PromptVar, format: impl Into<String>) {
        self.symtab.set(var, format);
        match var {
            PromptVar::Ps1 | PromptVar::Prompt => self.notify_ps1_changed(),
            PromptVar::Ps2 => self.notify_ps2_changed(),
        }
    }

    /// The live `PS1` format string, read through the `PS1`/`PROMPT` mirror
    /// rather than the theme's default layout (spec.md §6: `PS1` read as
    /// format; never overwritten with rendered output).
    pub fn prompt_format(&self) -> &str {
        self.symtab.ps1()
    }

    pub fn context(&self) -> &PromptContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PromptContext {
        &mut self.context
    }

    fn active_theme(&self) -> &Theme {
        &self.themes[self.active_theme]
    }

    /// spec.md §4.4 `set_theme(name)`. Unknown names are an error — unlike
    /// unknown *segment* names in a theme's enabled list (which are
    /// silently skipped at render time per spec.md §3), selecting a theme
    /// that doesn't exist is a programming error the caller should see.
    pub fn set_theme(&mut self, name: &str) -> PromptResult<()> {
        let index = self
            .themes
            .iter()
            .position(|t| t.name == name)
            .ok_or(crate::error::PromptError::InvalidParameter)?;
        self.active_theme = index;
        self.symtab.set(PromptVar::Ps1, self.themes[index].layout.ps1_format.clone());
        self.symtab.set(PromptVar::Ps2, self.themes[index].layout.ps2_format.clone());
        self.cache.dirty = true;
        Ok(())
    }

    /// spec.md §4.4 `create_render_ctx() → template_ctx`: synthesize the
    /// Pass 1 template context from the current [`PromptContext`] and the
    /// segment registry's outputs.
    pub fn create_render_ctx(&self) -> TemplateContext {
        let mut tpl = TemplateContext::new();
        let theme = self.active_theme();
        for name in theme.enabled_segments() {
            let Some(descriptor) = self.registry.get(name) else { continue };
            let output = (descriptor.render)(&self.context, theme);
            tpl.set(name.clone(), crate::line::strip_ansi(&output.content));
        }
        tpl.set_condition("dirty", self.context.git_status.as_ref().is_some_and(|s| {
            s.staged_count + s.unstaged_count + s.untracked_count > 0
        }));
        tpl
    }

    /// spec.md §4.4 `render(→ output)`. Falls back to the minimal prompt on
    /// any failure (spec.md §7) rather than propagating an error.
    pub fn render(&mut self) -> (&str, &str) {
        if self.cache.dirty {
            let theme = self.active_theme();
            if theme.layout.style == RenderStyle::Powerline {
                self.cache.ps1 =
                    crate::powerline::render_ps1(&self.context, theme, &self.registry);
            } else {
                let tpl = self.create_render_ctx();
                let format = self.symtab.ps1().to_string();
                self.cache.ps1 = crate::expand::expand(&format, &tpl, &self.context)
                    .unwrap_or_else(|_| crate::expand::fallback_prompt());
            }
            let tpl = self.create_render_ctx();
            let ps2_format = self.symtab.ps2().to_string();
            self.cache.ps2 = crate::expand::expand(&ps2_format, &tpl, &self.context)
                .unwrap_or_else(|_| crate::expand::fallback_prompt());
            self.cache.ps1_visual_width = unicode_width::UnicodeWidthStr::width(
                crate::line::strip_ansi(&self.cache.ps1).as_str(),
            );
            self.cache.ps2_visual_width = unicode_width::UnicodeWidthStr::width(
                crate::line::strip_ansi(&self.cache.ps2).as_str(),
            );
            self.cache.dirty = false;
        }
        (&self.cache.ps1, &self.cache.ps2)
    }

    pub fn ps1_visual_width(&self) -> usize {
        self.cache.ps1_visual_width
    }

    pub fn ps2_visual_width(&self) -> usize {
        self.cache.ps2_visual_width
    }

    /// spec.md §4.4 `update_context(last_exit, duration)`. `duration` is
    /// accepted but unused beyond invalidating the cache — timing display
    /// is a segment's job, not the composer's, and no built-in segment
    /// reads it yet.
    pub fn update_context(&mut self, last_exit: i32, _duration: std::time::Duration) {
        self.context.last_exit_code = last_exit;
        self.notify_ps1_changed();
    }

    /// spec.md §4.4 `refresh_directory()`.
    pub fn refresh_directory(&mut self) {
        self.context.refresh_directory();
        self.notify_ps1_changed();
    }

    pub fn notify_ps1_changed(&mut self) {
        self.cache.dirty = true;
    }

    pub fn notify_ps2_changed(&mut self) {
        self.cache.dirty = true;
    }

    /// spec.md §4.4 "Event subscriptions": wire `chpwd`/`precmd`/`preexec`
    /// into cache invalidation. The bus only needs `&self` at fire time, so
    /// the composer can't close over `&mut self` directly here — the
    /// caller's `on_dirty` closure is expected to reach the composer
    /// through a shared handle (e.g. `Rc<RefCell<Composer>>`) and call
    /// [`Composer::notify_ps1_changed`] itself, matching spec.md §9's
    /// "callback contract ... must not touch main-thread-owned state
    /// directly" note — the event bus only signals, it never mutates.
    pub fn register_shell_events(
        &mut self,
        bus: &mut dyn ShellEventBus,
        on_dirty: impl Fn() + Send + Clone + 'static,
    ) {
        for event in [ShellEvent::Chpwd, ShellEvent::Precmd, ShellEvent::Preexec] {
            let handler: EventHandler = Box::new(on_dirty.clone());
            let handle = bus.subscribe(event, handler);
            self.subscriptions.push(handle);
        }
    }

    pub fn unregister_shell_events(&mut self, bus: &mut dyn ShellEventBus) {
        for handle in self.subscriptions.drain(..) {
            bus.unsubscribe(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::RenderStyle;

    fn registry_and_theme() -> (SegmentRegistry, Theme) {
        let registry = SegmentRegistry::with_builtins();
        let mut theme = Theme::new("default");
        theme.set_enabled_segments(["user".to_string(), "directory".to_string()]);
        theme.layout.style = RenderStyle::Plain;
        theme.layout.ps1_format = r"\u@\h ".to_string();
        (registry, theme)
    }

    #[test]
    fn init_rejects_empty_theme_list() {
        let registry = SegmentRegistry::with_builtins();
        assert!(Composer::init(registry, Vec::new()).is_err());
    }

    #[test]
    fn render_caches_until_marked_dirty() {
        let (registry, theme) = registry_and_theme();
        let mut composer = Composer::init(registry, vec![theme]).unwrap();
        let (ps1_first, _) = composer.render();
        let first = ps1_first.to_string();
        composer.context_mut().username = "changed".to_string();
        let (ps1_second, _) = composer.render();
        // Cache wasn't invalidated, so the username change isn't visible yet.
        assert_eq!(ps1_second, first);
    }

    #[test]
    fn notify_ps1_changed_forces_rerender() {
        let (registry, theme) = registry_and_theme();
        let mut composer = Composer::init(registry, vec![theme]).unwrap();
        let _ = composer.render();
        composer.context_mut().username = "changed".to_string();
        composer.notify_ps1_changed();
        let (ps1, _) = composer.render();
        assert!(ps1.contains("changed"));
    }

    #[test]
    fn set_theme_rejects_unknown_name() {
        let (registry, theme) = registry_and_theme();
        let mut composer = Composer::init(registry, vec![theme]).unwrap();
        assert!(composer.set_theme("nonexistent").is_err());
    }

    #[test]
    fn shell_events_fire_the_registered_handler() {
        use crate::events::InMemoryEventBus;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let (registry, theme) = registry_and_theme();
        let mut composer = Composer::init(registry, vec![theme]).unwrap();
        let mut bus = InMemoryEventBus::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        composer.register_shell_events(&mut bus, move || { f.fetch_add(1, Ordering::SeqCst); });

        bus.fire(ShellEvent::Chpwd);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        composer.unregister_shell_events(&mut bus);
        bus.fire(ShellEvent::Chpwd);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn setting_prompt_mirrors_into_ps1_rendering() {
        let (registry, theme) = registry_and_theme();
        let mut composer = Composer::init(registry, vec![theme]).unwrap();
        let _ = composer.render();
        composer.set_prompt_format(PromptVar::Prompt, "custom> ");
        assert_eq!(composer.prompt_format(), "custom> ");
        let (ps1, _) = composer.render();
        assert_eq!(ps1, "custom> ");
    }

    #[test]
    fn update_context_marks_cache_dirty() {
        let (registry, theme) = registry_and_theme();
        let mut composer = Composer::init(registry, vec![theme]).unwrap();
        let _ = composer.render();
        composer.update_context(1, std::time::Duration::from_millis(5));
        assert_eq!(composer.context().last_exit_code, 1);
    }
}
