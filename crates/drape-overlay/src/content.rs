#![forbid(unsafe_code)]

//! Overlay content: what sits inside the container.
//!
//! Content only participates in layout: it reports a natural size for a
//! proposed size and receives the frame it was given. Drawing is the host's
//! business.

use std::any::Any;

use drape_core::{Rect, Size};
use unicode_width::UnicodeWidthStr;

use crate::config::MessageAlertStyle;

/// Horizontal padding inside message content, per side.
const PADDING_X: i32 = 2;
/// Vertical padding inside message content, per side.
const PADDING_Y: i32 = 1;

/// Custom content hosted by an overlay.
pub trait OverlayContent: Any {
    /// Natural size within `proposed`. May exceed it; coordinators clamp.
    fn measure(&self, proposed: Size) -> Size;

    /// Receive the frame resolved for the container.
    fn layout(&mut self, _frame: Rect) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Content with a fixed natural size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedContent {
    pub size: Size,
    frame: Rect,
}

impl FixedContent {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            frame: Rect::ZERO,
        }
    }

    /// Last frame received from layout.
    pub fn frame(&self) -> Rect {
        self.frame
    }
}

impl OverlayContent for FixedContent {
    fn measure(&self, _proposed: Size) -> Size {
        self.size
    }

    fn layout(&mut self, frame: Rect) {
        self.frame = frame;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Title + message text, wrapped to the container width.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageContent {
    title: Option<String>,
    message: Option<String>,
    style: MessageAlertStyle,
    frame: Rect,
}

impl MessageContent {
    /// # Panics
    ///
    /// Panics if both `title` and `message` are `None`.
    pub fn new(title: Option<String>, message: Option<String>, style: MessageAlertStyle) -> Self {
        assert!(
            title.is_some() || message.is_some(),
            "message content needs a title or a message"
        );
        Self {
            title,
            message,
            style,
            frame: Rect::ZERO,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn style(&self) -> &MessageAlertStyle {
        &self.style
    }

    /// Last frame received from layout.
    pub fn frame(&self) -> Rect {
        self.frame
    }

    fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.title.as_deref().into_iter().chain(self.message.as_deref())
    }
}

impl OverlayContent for MessageContent {
    fn measure(&self, proposed: Size) -> Size {
        let natural = self.texts().flat_map(str::lines).map(display_width).max().unwrap_or(0);
        let width = (natural + 2 * PADDING_X).min(proposed.width);
        let inner = (width - 2 * PADDING_X).max(1);

        let blocks = self.texts().count() as i32;
        let rows: i32 = self.texts().map(|text| wrapped_rows(text, inner)).sum();
        // One blank row between title and message.
        Size::new(width, rows + (blocks - 1).max(0) + 2 * PADDING_Y)
    }

    fn layout(&mut self, frame: Rect) {
        self.frame = frame;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn display_width(line: &str) -> i32 {
    i32::try_from(UnicodeWidthStr::width(line)).unwrap_or(i32::MAX)
}

/// Rows `text` occupies when wrapped at `width` columns.
fn wrapped_rows(text: &str, width: i32) -> i32 {
    let rows: i32 = text
        .lines()
        .map(|line| {
            let w = display_width(line);
            ((w + width - 1) / width).max(1)
        })
        .sum();
    rows.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(title: Option<&str>, message: Option<&str>) -> MessageContent {
        MessageContent::new(
            title.map(str::to_owned),
            message.map(str::to_owned),
            MessageAlertStyle::default(),
        )
    }

    #[test]
    fn measures_title_and_message() {
        let c = content(Some("Saved"), Some("All changes are on disk."));
        // 24 columns of text, 2 columns of padding per side.
        assert_eq!(c.measure(Size::new(80, 24)), Size::new(28, 5));
    }

    #[test]
    fn wraps_to_proposed_width() {
        let c = content(None, Some("abcdefghij"));
        // inner width 4 -> 3 rows.
        assert_eq!(c.measure(Size::new(8, 24)), Size::new(8, 5));
    }

    #[test]
    fn wide_graphemes_use_display_width() {
        let c = content(Some("日本語"), None);
        assert_eq!(c.measure(Size::new(80, 24)), Size::new(10, 3));
    }

    #[test]
    #[should_panic(expected = "title or a message")]
    fn empty_message_content_panics() {
        let _ = content(None, None);
    }

    #[test]
    fn downcast_through_trait_object() {
        let mut boxed: Box<dyn OverlayContent> = Box::new(content(None, Some("a")));
        if let Some(message) = boxed.as_any_mut().downcast_mut::<MessageContent>() {
            message.set_message("b");
        }
        let message = boxed.as_any().downcast_ref::<MessageContent>();
        assert_eq!(message.and_then(MessageContent::message), Some("b"));
    }
}
