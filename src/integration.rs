//! Shell integration lifecycle (spec.md §4.6): the single top-level owner
//! wiring the composer to real shell events, and the three-tier reset
//! hierarchy used for error recovery.
//!
//! spec.md §3 "Shell integration root" describes an arena-rooted object
//! graph destroyed by a single arena teardown. No crate in this corpus
//! provides a bump/arena allocator, and spec.md §1 scopes the arena
//! allocator itself as an external collaborator referenced only by its
//! contract — so [`IntegrationRoot`] below models the session-scoped
//! object graph with ordinary Rust ownership (ordinary fields, dropped in
//! declaration order) instead of a real arena. The externally-owned editor
//! and history collaborators are represented as opaque trait objects.

use std::time::{Duration, Instant};

use crate::composer::Composer;

/// The editor collaborator (spec.md §1 "the line editor itself ... Each
/// appears only as a narrow interface the core consumes"). Implementations
/// live outside this crate.
pub trait LineEditor {
    fn reset_buffer(&mut self);
    fn reset_history_cursor(&mut self);
    fn recreate(&mut self);
    /// Flush in-memory history to its backing store. Called as the first
    /// step of a hard reset, before the editor is destroyed and recreated
    /// (spec.md §4.6 "Hard reset": "Persist history").
    fn persist_history(&mut self);
}

/// spec.md §4.6 three-tier reset hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTier {
    Soft,
    Hard,
    Nuclear,
}

/// Terminal RIS sequence written to stdout on a nuclear reset.
const TERMINAL_RESET_SEQUENCE: &str = "\x1bc";
const NUCLEAR_RESET_SLEEP: Duration = Duration::from_millis(50);

/// Threshold at which a recorded error enters recovery mode and triggers a
/// hard reset (spec.md §4.6 "Automatic triggers").
const ERROR_RECOVERY_THRESHOLD: u32 = 10;

/// Ctrl-G presses within this window count toward a panic-triggered hard
/// reset (spec.md §4.6, §8 "Panic recovery" scenario: three presses).
const PANIC_WINDOW: Duration = Duration::from_millis(750);
const PANIC_RESET_COUNT: u32 = 3;

/// Counters and state spec.md §3 assigns to the shell integration root:
/// errors, Ctrl-G panic presses, and reset tiers.
#[derive(Debug, Default)]
pub struct IntegrationCounters {
    pub error_count: u32,
    pub hard_reset_count: u32,
    pub nuclear_reset_count: u32,
    last_ctrl_g: Option<Instant>,
    ctrl_g_count: u32,
    pub last_reset_time: Option<Instant>,
    pub abort_requested: bool,
}

/// Single per-session owner (spec.md §3, §4.6). `editor` is a trait object
/// because its implementation is external; `write_reset_sequence` is
/// injected so tests don't write real RIS bytes to stdout.
pub struct IntegrationRoot<E: LineEditor> {
    editor: E,
    composer: Composer,
    counters: IntegrationCounters,
    at_exit_ran: bool,
}

impl<E: LineEditor> IntegrationRoot<E> {
    pub fn new(editor: E, composer: Composer) -> Self {
        Self { editor, composer, counters: IntegrationCounters::default(), at_exit_ran: false }
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    pub fn counters(&self) -> &IntegrationCounters {
        &self.counters
    }

    /// spec.md §4.6 "Soft reset": no subsystem destruction.
    pub fn soft_reset(&mut self) {
        self.counters.abort_requested = true;
        self.editor.reset_buffer();
        self.editor.reset_history_cursor();
    }

    /// spec.md §4.6 "Hard reset": persist history, recreate the editor,
    /// zero the error and Ctrl-G counters, stamp the reset time.
    pub fn hard_reset(&mut self) {
        self.editor.persist_history();
        self.editor.recreate();
        self.counters.error_count = 0;
        self.counters.ctrl_g_count = 0;
        self.counters.hard_reset_count += 1;
        self.counters.last_reset_time = Some(Instant::now());
    }

    /// spec.md §4.6 "Nuclear reset": hard reset, then RIS + 50ms sleep.
    pub fn nuclear_reset(&mut self) {
        self.hard_reset();
        self.write_reset_sequence();
        std::thread::sleep(NUCLEAR_RESET_SLEEP);
        self.counters.nuclear_reset_count += 1;
    }

    fn write_reset_sequence(&self) {
        use std::io::Write;
        let _ = std::io::stdout().write_all(TERMINAL_RESET_SEQUENCE.as_bytes());
    }

    pub fn apply(&mut self, tier: ResetTier) {
        match tier {
            ResetTier::Soft => self.soft_reset(),
            ResetTier::Hard => self.hard_reset(),
            ResetTier::Nuclear => self.nuclear_reset(),
        }
    }

    /// spec.md §4.6 "Recording an error increments `error_count`; when it
    /// reaches a threshold, enter recovery mode and invoke hard reset."
    pub fn record_error(&mut self) {
        self.counters.error_count += 1;
        if self.counters.error_count >= ERROR_RECOVERY_THRESHOLD {
            self.hard_reset();
        }
    }

    /// spec.md §4.6 "Recording a Ctrl-G press": within the panic window of
    /// the previous press, increment; at panic count invoke hard reset and
    /// zero the counter. Otherwise restart the count.
    pub fn record_ctrl_g(&mut self) {
        let now = Instant::now();
        let within_window = self.counters.last_ctrl_g.is_some_and(|prev| now - prev <= PANIC_WINDOW);
        self.counters.ctrl_g_count = if within_window { self.counters.ctrl_g_count + 1 } else { 1 };
        self.counters.last_ctrl_g = Some(now);
        if self.counters.ctrl_g_count >= PANIC_RESET_COUNT {
            self.hard_reset();
            self.counters.ctrl_g_count = 0;
        }
    }

    /// Run the at-exit handler exactly once, guarded against double-entry
    /// (spec.md §3 "destroyed at exit via a registered at-exit handler
    /// guarded against double-entry").
    pub fn run_at_exit(&mut self) {
        if self.at_exit_ran {
            return;
        }
        self.at_exit_ran = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentRegistry;
    use crate::theme::Theme;

    #[derive(Default)]
    struct FakeEditor {
        buffer_reset_count: u32,
        recreate_count: u32,
        persist_history_count: u32,
    }

    impl LineEditor for FakeEditor {
        fn reset_buffer(&mut self) {
            self.buffer_reset_count += 1;
        }
        fn reset_history_cursor(&mut self) {}
        fn recreate(&mut self) {
            self.recreate_count += 1;
        }
        fn persist_history(&mut self) {
            self.persist_history_count += 1;
        }
    }

    fn root() -> IntegrationRoot<FakeEditor> {
        let registry = SegmentRegistry::with_builtins();
        let theme = Theme::new("default");
        let composer = Composer::init(registry, vec![theme]).unwrap();
        IntegrationRoot::new(FakeEditor::default(), composer)
    }

    #[test]
    fn soft_reset_sets_abort_flag_without_recreating_editor() {
        let mut root = root();
        root.soft_reset();
        assert!(root.counters().abort_requested);
        assert_eq!(root.editor.recreate_count, 0);
        assert_eq!(root.editor.buffer_reset_count, 1);
    }

    #[test]
    fn hard_reset_zeroes_counters_and_recreates_editor() {
        let mut root = root();
        root.counters.error_count = 5;
        root.hard_reset();
        assert_eq!(root.counters().error_count, 0);
        assert_eq!(root.editor.recreate_count, 1);
        assert_eq!(root.editor.persist_history_count, 1);
        assert_eq!(root.counters().hard_reset_count, 1);
    }

    #[test]
    fn error_threshold_triggers_hard_reset() {
        let mut root = root();
        for _ in 0..ERROR_RECOVERY_THRESHOLD {
            root.record_error();
        }
        assert_eq!(root.counters().hard_reset_count, 1);
        assert_eq!(root.counters().error_count, 0);
    }

    #[test]
    fn three_ctrl_g_within_window_triggers_exactly_one_hard_reset() {
        let mut root = root();
        root.record_ctrl_g();
        root.record_ctrl_g();
        root.record_ctrl_g();
        assert_eq!(root.counters().hard_reset_count, 1);
        assert_eq!(root.counters().ctrl_g_count, 0);
    }

    #[test]
    fn at_exit_runs_only_once() {
        let mut root = root();
        root.run_at_exit();
        let ran_once = root.at_exit_ran;
        root.run_at_exit();
        assert!(ran_once);
        assert!(root.at_exit_ran);
    }
}
