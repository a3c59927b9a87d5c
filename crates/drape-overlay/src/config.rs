#![forbid(unsafe_code)]

//! Message-alert configuration and the thread-local defaults it falls back to.
//!
//! [`MessageAlertOptions`] holds per-overlay overrides. Every unset option
//! is filled from an [`AlertDefaults`] value when the overlay is built; the
//! result is a concrete [`MessageAlertStyle`]. Overlays never observe later
//! changes to the global defaults.

use std::cell::RefCell;

use bitflags::bitflags;
use drape_core::PackedRgba;

thread_local! {
    static GLOBAL_DEFAULTS: RefCell<AlertDefaults> = RefCell::new(AlertDefaults::default());
}

bitflags! {
    /// Text attributes used in place of fonts.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct TextAttrs: u8 {
        const BOLD      = 0b0001;
        const ITALIC    = 0b0010;
        const DIM       = 0b0100;
        const UNDERLINE = 0b1000;
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

/// How action views are drawn, which determines their width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionViewType {
    /// Bracketed button: `[ label ]`.
    #[default]
    Button,
    /// Bare label with one column of padding on each side.
    Plain,
}

impl ActionViewType {
    /// Columns the view adds around its label.
    #[inline]
    pub const fn chrome_width(self) -> i32 {
        match self {
            Self::Button => 4,
            Self::Plain => 2,
        }
    }
}

/// Arrangement of an action group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionLayoutType {
    /// Horizontal when every action fits the width, vertical otherwise.
    #[default]
    Auto,
    Horizontal,
    Vertical,
}

/// Process-wide (thread-local) fallback values for message alerts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AlertDefaults {
    pub title_alignment: Alignment,
    pub title_color: PackedRgba,
    pub title_font: TextAttrs,
    pub message_alignment: Alignment,
    pub message_color: PackedRgba,
    pub message_font: TextAttrs,
    pub corner_radius: u8,
    pub action_view_type: ActionViewType,
    pub action_layout_type: ActionLayoutType,
}

impl Default for AlertDefaults {
    fn default() -> Self {
        Self {
            title_alignment: Alignment::Center,
            title_color: PackedRgba::WHITE,
            title_font: TextAttrs::BOLD,
            message_alignment: Alignment::Center,
            message_color: PackedRgba::rgb(200, 200, 200),
            message_font: TextAttrs::empty(),
            corner_radius: 1,
            action_view_type: ActionViewType::Button,
            action_layout_type: ActionLayoutType::Auto,
        }
    }
}

impl AlertDefaults {
    /// Snapshot of the global defaults (thread-local).
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_DEFAULTS.with(|d| d.borrow().clone())
    }

    /// Replace the global defaults. Overlays built earlier keep their style.
    pub fn set_global(defaults: Self) {
        GLOBAL_DEFAULTS.with(|d| *d.borrow_mut() = defaults);
    }

    /// Modify the global defaults in place.
    pub fn update_global(f: impl FnOnce(&mut Self)) {
        GLOBAL_DEFAULTS.with(|d| f(&mut d.borrow_mut()));
    }
}

/// Per-overlay overrides; `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MessageAlertOptions {
    pub title_alignment: Option<Alignment>,
    pub title_color: Option<PackedRgba>,
    pub title_font: Option<TextAttrs>,
    pub message_alignment: Option<Alignment>,
    pub message_color: Option<PackedRgba>,
    pub message_font: Option<TextAttrs>,
    pub corner_radius: Option<u8>,
    pub action_view_type: Option<ActionViewType>,
    pub action_layout_type: Option<ActionLayoutType>,
}

impl MessageAlertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title_alignment(mut self, alignment: Alignment) -> Self {
        self.title_alignment = Some(alignment);
        self
    }

    pub fn title_color(mut self, color: PackedRgba) -> Self {
        self.title_color = Some(color);
        self
    }

    pub fn title_font(mut self, font: TextAttrs) -> Self {
        self.title_font = Some(font);
        self
    }

    pub fn message_alignment(mut self, alignment: Alignment) -> Self {
        self.message_alignment = Some(alignment);
        self
    }

    pub fn message_color(mut self, color: PackedRgba) -> Self {
        self.message_color = Some(color);
        self
    }

    pub fn message_font(mut self, font: TextAttrs) -> Self {
        self.message_font = Some(font);
        self
    }

    pub fn corner_radius(mut self, radius: u8) -> Self {
        self.corner_radius = Some(radius);
        self
    }

    pub fn action_view_type(mut self, view_type: ActionViewType) -> Self {
        self.action_view_type = Some(view_type);
        self
    }

    pub fn action_layout_type(mut self, layout_type: ActionLayoutType) -> Self {
        self.action_layout_type = Some(layout_type);
        self
    }

    /// Fill every unset option from `defaults`.
    #[must_use]
    pub fn resolve(&self, defaults: &AlertDefaults) -> MessageAlertStyle {
        MessageAlertStyle {
            title_alignment: self.title_alignment.unwrap_or(defaults.title_alignment),
            title_color: self.title_color.unwrap_or(defaults.title_color),
            title_font: self.title_font.unwrap_or(defaults.title_font),
            message_alignment: self.message_alignment.unwrap_or(defaults.message_alignment),
            message_color: self.message_color.unwrap_or(defaults.message_color),
            message_font: self.message_font.unwrap_or(defaults.message_font),
            corner_radius: self.corner_radius.unwrap_or(defaults.corner_radius),
            action_view_type: self.action_view_type.unwrap_or(defaults.action_view_type),
            action_layout_type: self
                .action_layout_type
                .unwrap_or(defaults.action_layout_type),
        }
    }
}

/// Fully resolved message-alert style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageAlertStyle {
    pub title_alignment: Alignment,
    pub title_color: PackedRgba,
    pub title_font: TextAttrs,
    pub message_alignment: Alignment,
    pub message_color: PackedRgba,
    pub message_font: TextAttrs,
    pub corner_radius: u8,
    pub action_view_type: ActionViewType,
    pub action_layout_type: ActionLayoutType,
}

impl Default for MessageAlertStyle {
    fn default() -> Self {
        MessageAlertOptions::default().resolve(&AlertDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_options_fall_back_to_defaults() {
        let defaults = AlertDefaults {
            corner_radius: 3,
            ..AlertDefaults::default()
        };
        let style = MessageAlertOptions::new()
            .title_font(TextAttrs::ITALIC | TextAttrs::UNDERLINE)
            .resolve(&defaults);
        assert_eq!(style.corner_radius, 3);
        assert_eq!(style.title_font, TextAttrs::ITALIC | TextAttrs::UNDERLINE);
        assert_eq!(style.message_font, defaults.message_font);
    }

    #[test]
    fn global_defaults_are_snapshotted() {
        let before = AlertDefaults::global();
        AlertDefaults::update_global(|d| d.action_layout_type = ActionLayoutType::Vertical);
        let resolved = MessageAlertOptions::new().resolve(&AlertDefaults::global());
        assert_eq!(resolved.action_layout_type, ActionLayoutType::Vertical);

        AlertDefaults::set_global(before.clone());
        assert_eq!(resolved.action_layout_type, ActionLayoutType::Vertical);
        assert_eq!(AlertDefaults::global(), before);
    }

    #[test]
    fn chrome_width_matches_view_type() {
        assert_eq!(ActionViewType::Button.chrome_width(), 4);
        assert_eq!(ActionViewType::Plain.chrome_width(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_defaults_deserialize_over_builtins() {
        let json = r#"{ "corner_radius": 2, "action_layout_type": "Vertical" }"#;
        let defaults: AlertDefaults = serde_json::from_str(json).unwrap();
        assert_eq!(defaults.corner_radius, 2);
        assert_eq!(defaults.action_layout_type, ActionLayoutType::Vertical);
        assert_eq!(defaults.title_font, AlertDefaults::default().title_font);

        let options: MessageAlertOptions = serde_json::from_str(r#"{ "message_alignment": "Left" }"#).unwrap();
        assert_eq!(options.message_alignment, Some(Alignment::Left));
        assert_eq!(options.corner_radius, None);
    }
}
