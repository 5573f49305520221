//! UI components and layouts.
//!
//! Server-rendered HTML for the single chat view. Components are plain Rust
//! values that render to markup; live updates arrive over the `/api/events`
//! SSE stream.
//!
//! # Structure
//!
//! - [`chat`]: chat-specific components and the [`ChatView`](chat::ChatView) shell
//! - [`theme`]: light/dark theme selection

pub mod chat;
pub mod theme;

pub use chat::{ChatInput, ChatView};
pub use theme::Theme;

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
