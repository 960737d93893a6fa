//! Theme registry (spec.md §3 "Theme", §2 "Theme registry"): the named
//! record selecting layout, symbols, colors, and enabled segments for a
//! render. Theme *values* are modelled and registrable here; discovering
//! and parsing theme files under `lush/themes/` is the external
//! collaborator's job (spec.md §6) and out of scope for this crate.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Bound on the enabled-segment list (spec.md §3 Theme invariant).
pub const MAX_ENABLED_SEGMENTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderStyle {
    #[default]
    Plain,
    Powerline,
}

/// The layout fields an external theme-file loader would deserialize
/// (spec.md §6) before handing values to [`Theme`] through its setters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Layout {
    pub style: RenderStyle,
    pub ps1_format: String,
    pub ps2_format: String,
    pub enable_transient: bool,
    pub transient_format: String,
    pub newline_before_prompt: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            style: RenderStyle::Plain,
            ps1_format: r"\u@\h:\w\$ ".to_string(),
            ps2_format: "> ".to_string(),
            enable_transient: false,
            transient_format: r"\$ ".to_string(),
            newline_before_prompt: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SymbolSet {
    pub separator_left: String,
    pub separator_right: String,
    pub branch_icon: String,
    pub dirty_icon: String,
    pub ahead_icon: String,
    pub behind_icon: String,
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self {
            separator_left: "\u{e0b0}".to_string(),
            separator_right: "\u{e0b2}".to_string(),
            branch_icon: String::new(),
            dirty_icon: "*".to_string(),
            ahead_icon: "\u{2191}".to_string(),
            behind_icon: "\u{2193}".to_string(),
        }
    }
}

/// Resolved color values, set programmatically once the loader has parsed
/// its `fg`/`bg` spec strings through [`crate::color::parse_color_spec`] —
/// `Color` itself has no wire format, so this type is never (de)serialized
/// directly.
#[derive(Debug, Clone, Default)]
pub struct ColorSet {
    pub text: Option<Color>,
    pub accent: Option<Color>,
}

/// Per-segment color/visibility override. Each field distinguishes "unset"
/// (`None`, fall through to the segment's computed default) from "set"
/// (spec.md §3 Theme invariant) — `show: Some(false)` explicitly hides a
/// segment even if its own visibility predicate returns true.
#[derive(Debug, Clone, Default)]
pub struct SegmentOverride {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub show: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub layout: Layout,
    pub symbols: SymbolSet,
    pub colors: ColorSet,
    enabled_segments: Vec<String>,
    overrides: IndexMap<String, SegmentOverride>,
}

impl Theme {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: Layout::default(),
            symbols: SymbolSet::default(),
            colors: ColorSet::default(),
            enabled_segments: Vec::new(),
            overrides: IndexMap::new(),
        }
    }

    /// Set the enabled-segment list, silently truncating to
    /// [`MAX_ENABLED_SEGMENTS`] entries (order preserved) rather than
    /// erroring — consistent with the rest of the render path's
    /// silent-truncation-over-failure posture (spec.md §7).
    pub fn set_enabled_segments(&mut self, names: impl IntoIterator<Item = String>) -> &mut Self {
        self.enabled_segments = names.into_iter().take(MAX_ENABLED_SEGMENTS).collect();
        self
    }

    pub fn enabled_segments(&self) -> &[String] {
        &self.enabled_segments
    }

    pub fn set_override(&mut self, segment: impl Into<String>, over: SegmentOverride) -> &mut Self {
        self.overrides.insert(segment.into(), over);
        self
    }

    pub fn override_for(&self, segment: &str) -> Option<&SegmentOverride> {
        self.overrides.get(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_segments_truncate_at_bound() {
        let mut theme = Theme::new("big");
        let names: Vec<String> = (0..40).map(|i| format!("seg{i}")).collect();
        theme.set_enabled_segments(names);
        assert_eq!(theme.enabled_segments().len(), MAX_ENABLED_SEGMENTS);
        assert_eq!(theme.enabled_segments()[0], "seg0");
    }

    #[test]
    fn unknown_segment_override_is_none() {
        let theme = Theme::new("t");
        assert!(theme.override_for("nope").is_none());
    }

    #[test]
    fn override_show_false_is_distinguishable_from_unset() {
        let mut theme = Theme::new("t");
        theme.set_override("git", SegmentOverride { show: Some(false), ..Default::default() });
        assert_eq!(theme.override_for("git").unwrap().show, Some(false));
        assert!(theme.override_for("jobs").is_none());
    }

    /// `Layout`/`SymbolSet` are the wire shape an external theme-file loader
    /// deserializes (spec.md §6); round-trip it through JSON to pin that
    /// shape, since nothing else in this crate exercises the derives.
    #[test]
    fn layout_round_trips_through_json() {
        let layout = Layout::default();
        let json = serde_json::to_string(&layout).unwrap();
        let back: Layout = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ps1_format, layout.ps1_format);
        assert_eq!(back.style, layout.style);
    }

    #[test]
    fn layout_json_schema_has_expected_properties() {
        let schema = schemars::schema_for!(Layout);
        let json = serde_json::to_value(&schema).unwrap();
        let properties = json["properties"].as_object().unwrap();
        assert!(properties.contains_key("ps1_format"));
        assert!(properties.contains_key("style"));
    }
}
