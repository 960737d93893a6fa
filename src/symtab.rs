//! PS1/PS2/PROMPT mirroring helper (spec.md §6: "`PROMPT` mirrored
//! bidirectionally with `PS1`: set one → the other syncs").
//!
//! Split out from [`crate::composer`] because it carries its own invariant
//! worth testing in isolation: never overwrite the format variable with
//! rendered output (spec.md §6 "`PS1` read as format; never overwritten
//! with rendered output").

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVar {
    Ps1,
    Ps2,
    Prompt,
}

/// Tracks the current format strings for `PS1`/`PS2`/`PROMPT` and the
/// mirroring invariant between `PS1` and `PROMPT`. Does not touch the real
/// symbol table — that's the external collaborator (spec.md §6); this is
/// the bookkeeping the composer drives it with.
#[derive(Debug, Clone, Default)]
pub struct SymbolTableMirror {
    ps1: String,
    ps2: String,
}

impl SymbolTableMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ps1(&self) -> &str {
        &self.ps1
    }

    pub fn ps2(&self) -> &str {
        &self.ps2
    }

    /// `PROMPT` is an alias of `PS1` — reading it returns the same format.
    pub fn prompt(&self) -> &str {
        &self.ps1
    }

    /// Record a write to `var` from shell code. Writing `Prompt` mirrors
    /// into `ps1` and vice versa, per spec.md §6.
    pub fn set(&mut self, var: PromptVar, format: impl Into<String>) {
        let format = format.into();
        match var {
            PromptVar::Ps1 | PromptVar::Prompt => self.ps1 = format,
            PromptVar::Ps2 => self.ps2 = format,
        }
    }
}
