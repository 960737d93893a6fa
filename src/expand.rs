//! Public two-pass expansion contract (spec.md §4.2): `expand(format, ...)`
//! runs [`crate::template`]'s Pass 1 then [`crate::escape`]'s Pass 2 over
//! the result, returning a NUL-free Rust `String` (the NUL-termination and
//! buffer-size contract of the original C-shaped interface is modelled by
//! the caller choosing how to write `expand`'s return value into its own
//! buffer; this crate's job stops at producing the byte string).

use crate::context::PromptContext;
use crate::error::{PromptError, PromptResult};
use crate::template::TemplateContext;

/// Expand `format` against `template_ctx` (Pass 1) and `runtime_ctx`
/// (Pass 2). An empty `format` is rejected with [`PromptError::NullPointer`]
/// — the nearest Rust analogue of spec.md §4.2's "null pointer or
/// zero-sized buffer" precondition, since this API takes an owned `&str`
/// rather than a raw pointer/length pair.
pub fn expand(
    format: &str,
    template_ctx: &TemplateContext,
    runtime_ctx: &PromptContext,
) -> PromptResult<String> {
    if format.is_empty() {
        return Err(PromptError::NullPointer);
    }
    let pass1 = crate::template::expand_templates(format, template_ctx);
    Ok(crate::escape::expand_escapes(&pass1, runtime_ctx))
}

/// The minimal fallback prompt spec.md §7 mandates on any render-time
/// failure: `"# "` for uid 0, `"$ "` otherwise.
pub fn fallback_prompt() -> String {
    if crate::posix::effective_uid_is_root() { "# ".to_string() } else { "$ ".to_string() }
}
