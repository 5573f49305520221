//! Chat message list component.

use crate::message::Message;
use crate::ui::escape_html;

/// Text of the indicator shown while a reply is loading.
pub const TYPING_INDICATOR: &str = "AI is typing...";

/// Render the messages in order, plus the typing indicator iff `loading`.
///
/// Each item carries its sender as a class (`message user` / `message ai`)
/// and its id as `data-id`, which the page script uses to apply deltas.
pub fn render_message_list(messages: &[Message], loading: bool) -> String {
    let mut html = String::from(
        r#"<div class="messages" id="messages" aria-live="polite" aria-label="Chat messages">"#,
    );

    for message in messages {
        html.push_str(&format!(
            r#"<div class="message {sender}" data-id="{id}">{text}</div>"#,
            sender = message.sender,
            id = escape_html(&message.id),
            text = escape_html(&message.text),
        ));
    }

    if loading {
        html.push_str(&format!(
            r#"<div class="typing-indicator">{TYPING_INDICATOR}</div>"#
        ));
    }

    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Sender;

    fn message(id: &str, sender: Sender, text: &str) -> Message {
        Message {
            id: id.to_string(),
            sender,
            text: text.to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn test_empty_list() {
        let html = render_message_list(&[], false);
        assert!(html.contains(r#"class="messages""#));
        assert!(!html.contains(r#"class="message "#));
        assert!(!html.contains("typing-indicator"));
    }

    #[test]
    fn test_messages_in_order_with_sender_class() {
        let messages = [
            message("1", Sender::User, "Hello"),
            message("2", Sender::Ai, "Hi there!"),
        ];
        let html = render_message_list(&messages, false);

        let user = html
            .find(r#"<div class="message user" data-id="1">Hello</div>"#)
            .unwrap();
        let ai = html
            .find(r#"<div class="message ai" data-id="2">Hi there!</div>"#)
            .unwrap();
        assert!(user < ai);
    }

    #[test]
    fn test_typing_indicator_only_while_loading() {
        let html = render_message_list(&[], true);
        assert!(html.contains(r#"<div class="typing-indicator">AI is typing...</div>"#));
        assert!(!render_message_list(&[], false).contains(TYPING_INDICATOR));
    }

    #[test]
    fn test_message_text_is_escaped() {
        let messages = [message("1", Sender::User, "<script>alert(1)</script>")];
        let html = render_message_list(&messages, false);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
