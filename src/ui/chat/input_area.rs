//! Chat message input component.

use crate::ui::escape_html;

/// Placeholder shown in the empty text field.
pub const INPUT_PLACEHOLDER: &str = "Type your message...";

/// Text input with a send button.
///
/// Holds the local text buffer. Submitting hands the raw buffer to the
/// caller, blank text included (validation belongs to the store), and clears
/// the buffer. While a reply is loading the whole form is disabled.
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    value: String,
    loading: bool,
    focused: bool,
}

impl ChatInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current buffer contents.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// The text field is disabled while a reply is loading.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.loading
    }

    /// Whether the send button is enabled.
    #[must_use]
    pub fn can_send(&self) -> bool {
        !self.loading && !self.value.trim().is_empty()
    }

    #[must_use]
    pub fn button_label(&self) -> &'static str {
        if self.loading { "..." } else { "Send" }
    }

    /// Take the buffer for sending.
    ///
    /// Returns `None` while loading; otherwise the raw text, after which the
    /// buffer is empty.
    pub fn submit(&mut self) -> Option<String> {
        if self.loading {
            return None;
        }
        Some(std::mem::take(&mut self.value))
    }

    /// Give the text field focus, e.g. once a reply has finished.
    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Render the input form.
    #[must_use]
    pub fn render(&self) -> String {
        let value = escape_html(&self.value);
        let input_disabled = if self.is_disabled() { " disabled" } else { "" };
        let autofocus = if self.focused { " autofocus" } else { "" };
        let button_disabled = if self.can_send() { "" } else { " disabled" };
        let label = self.button_label();

        format!(
            r#"<form class="chat-input">
    <input type="text" name="message" placeholder="{INPUT_PLACEHOLDER}" value="{value}" autocomplete="off"{input_disabled}{autofocus}>
    <button type="submit"{button_disabled}>{label}</button>
</form>"#
        )
    }
}
