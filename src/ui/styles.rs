//! Console styles for the room view.

use crossterm::style::{Attribute, Color, ContentStyle};

fn fg(color: Color) -> ContentStyle {
    ContentStyle {
        foreground_color: Some(color),
        ..ContentStyle::default()
    }
}

/// Sender name above a group of messages (bold, cyan).
pub fn sender_style() -> ContentStyle {
    ContentStyle {
        attributes: Attribute::Bold.into(),
        ..fg(Color::Cyan)
    }
}

pub fn time_style() -> ContentStyle {
    fg(Color::DarkGrey)
}

/// System and notification lines.
pub fn system_style() -> ContentStyle {
    ContentStyle {
        attributes: Attribute::Italic.into(),
        ..fg(Color::Yellow)
    }
}

pub fn status_ok_style() -> ContentStyle {
    fg(Color::Green)
}

pub fn status_warn_style() -> ContentStyle {
    fg(Color::Red)
}
