//! Chat view shell.
//!
//! Composes the header, message list and input into the page, and connects
//! input submissions to the [`ConversationStore`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::store::{ConversationStore, SendHooks, StoreError};
use crate::ui::Theme;

use super::{ChatInput, render_header, render_message_list};

/// Title shown in the page header.
pub const APP_TITLE: &str = "AI Chat Demo";

const PAGE_STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; }
html.light body { background: #f5f5f5; color: #222; }
html.dark body { background: #1e1e1e; color: #eee; }
.app-header { display: flex; justify-content: space-between; align-items: center; padding: 0 1rem; }
.chat-window { max-width: 48rem; margin: 0 auto; display: flex; flex-direction: column; height: 80vh; }
.messages { flex: 1; overflow-y: auto; padding: 1rem; }
.message { margin: 0.5rem 0; padding: 0.5rem 0.75rem; border-radius: 0.5rem; white-space: pre-wrap; }
.message.user { background: #2563eb; color: #fff; margin-left: 20%; }
.message.ai { background: #e5e7eb; color: #111; margin-right: 20%; }
.typing-indicator { font-style: italic; opacity: 0.7; }
.chat-input { display: flex; gap: 0.5rem; padding: 1rem; }
.chat-input input { flex: 1; }
"#;

const PAGE_SCRIPT: &str = r#"
(function () {
  const list = document.getElementById('messages');
  const form = document.querySelector('form.chat-input');
  const input = form.querySelector('input[name=message]');
  const button = form.querySelector('button');

  function scrollToBottom() { list.scrollTop = list.scrollHeight; }

  function syncButton() {
    button.disabled = input.disabled || input.value.trim() === '';
  }

  function setLoading(loading) {
    input.disabled = loading;
    button.textContent = loading ? '...' : 'Send';
    let indicator = list.querySelector('.typing-indicator');
    if (loading && !indicator) {
      indicator = document.createElement('div');
      indicator.className = 'typing-indicator';
      indicator.textContent = 'AI is typing...';
      list.appendChild(indicator);
    } else if (!loading && indicator) {
      indicator.remove();
      input.focus();
    }
    syncButton();
  }

  function appendMessage(message) {
    const item = document.createElement('div');
    item.className = 'message ' + message.sender;
    item.dataset.id = message.id;
    item.textContent = message.text;
    const indicator = list.querySelector('.typing-indicator');
    list.insertBefore(item, indicator);
    scrollToBottom();
  }

  const events = new EventSource('/api/events');
  events.addEventListener('message.appended', (e) => appendMessage(JSON.parse(e.data).data.message));
  events.addEventListener('message.delta', (e) => {
    const delta = JSON.parse(e.data).data;
    const item = list.querySelector('[data-id="' + delta.id + '"]');
    if (item) { item.textContent += delta.text; scrollToBottom(); }
  });
  events.addEventListener('loading.changed', (e) => setLoading(JSON.parse(e.data).data.loading));
  const clearList = () => list.querySelectorAll('.message').forEach((m) => m.remove());
  events.addEventListener('chat.cleared', clearList);
  events.addEventListener('chat.reset', clearList);

  input.addEventListener('input', syncButton);
  form.addEventListener('submit', (e) => {
    e.preventDefault();
    if (input.disabled) { return; }
    const message = input.value;
    input.value = '';
    syncButton();
    fetch('/api/chat', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ message }),
    });
  });
  scrollToBottom();
})();
"#;

/// The single chat screen.
///
/// Cloning is cheap; clones share the store, the input state and the scroll
/// request counter.
#[derive(Clone, Debug)]
pub struct ChatView {
    store: ConversationStore,
    input: Arc<Mutex<ChatInput>>,
    scroll_requests: Arc<AtomicU64>,
}

impl ChatView {
    pub fn new(store: ConversationStore) -> Self {
        Self {
            store,
            input: Arc::new(Mutex::new(ChatInput::new())),
            scroll_requests: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Type `text` into the input, replacing its buffer.
    pub fn set_input(&self, text: impl Into<String>) {
        self.lock_input().set_value(text);
    }

    pub fn input_value(&self) -> String {
        self.lock_input().value().to_string()
    }

    /// Submit whatever the input holds and forward it to the store.
    ///
    /// Returns `Ok(false)` when the input refused because a reply is
    /// loading; the buffer is then left untouched.
    pub async fn submit_input(&self) -> Result<bool, StoreError> {
        let submitted = {
            let mut input = self.lock_input();
            input.set_loading(self.store.loading());
            input.submit()
        };
        match submitted {
            Some(text) => self.submit(&text).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Run `text` through the input as one submission.
    ///
    /// `None` while a reply is loading, in which case the input is not
    /// touched. Used by callers that hold the text themselves, such as the
    /// HTTP handler.
    pub fn take_submission(&self, text: &str) -> Option<String> {
        let mut input = self.lock_input();
        input.set_loading(self.store.loading());
        if input.is_disabled() {
            return None;
        }
        input.set_value(text);
        input.submit()
    }

    /// Send `text` through the store.
    ///
    /// Every chunk requests a scroll to the bottom of the list; completion
    /// returns focus to the input.
    pub async fn submit(&self, text: &str) -> Result<(), StoreError> {
        self.lock_input().blur();

        let scroll_requests = Arc::clone(&self.scroll_requests);
        let input = Arc::clone(&self.input);
        let hooks = SendHooks::new()
            .on_chunk(move || {
                scroll_requests.fetch_add(1, Ordering::Relaxed);
            })
            .on_complete(move || {
                input.lock().unwrap_or_else(PoisonError::into_inner).focus();
            });

        self.store.send_message_with(text, hooks).await
    }

    /// Number of scroll-to-bottom requests made so far.
    pub fn scroll_requests(&self) -> u64 {
        self.scroll_requests.load(Ordering::Relaxed)
    }

    pub fn input_focused(&self) -> bool {
        self.lock_input().is_focused()
    }

    /// Render the full page for the current store state.
    pub fn render(&self, theme: Theme) -> String {
        let loading = self.store.loading();
        let messages = self.store.messages();

        // Rendered from a snapshot so page views never change the input.
        let input_html = {
            let mut input = self.lock_input().clone();
            input.set_loading(loading);
            input.render()
        };

        let mut html = format!(
            r#"<!DOCTYPE html>
<html lang="en" class="{theme}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{APP_TITLE}</title>
    <style>{PAGE_STYLE}</style>
</head>
<body>
"#,
            theme = theme.as_str(),
        );
        html.push_str(&render_header(APP_TITLE, theme));
        html.push_str(r#"<main class="app-content"><div class="chat-view"><div class="chat-window">"#);
        html.push_str(&render_message_list(&messages, loading));
        html.push_str(&input_html);
        html.push_str("</div></div></main>\n<script>");
        html.push_str(PAGE_SCRIPT);
        html.push_str("</script>\n</body>\n</html>\n");
        html
    }

    fn lock_input(&self) -> MutexGuard<'_, ChatInput> {
        self.input.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ScriptedGenerator;
    use crate::message::Sender;
    use std::time::Duration;

    fn view(generator: ScriptedGenerator) -> ChatView {
        ChatView::new(ConversationStore::new(Arc::new(generator)))
    }

    #[tokio::test]
    async fn test_submit_streams_into_store() {
        let view = view(ScriptedGenerator::new(["Hi ", "there! "]));

        view.submit("Hello").await.unwrap();

        let messages = view.store().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].text, "Hi there! ");
        assert_eq!(view.scroll_requests(), 2);
        assert!(view.input_focused());
    }

    #[tokio::test]
    async fn test_blank_submit_is_ignored() {
        let view = view(ScriptedGenerator::new(["unused "]));

        view.submit("   ").await.unwrap();

        assert_eq!(view.store().message_count(), 0);
        assert_eq!(view.scroll_requests(), 0);
        assert!(!view.input_focused());
    }

    #[tokio::test]
    async fn test_failed_submit_still_refocuses() {
        let view = view(ScriptedGenerator::failing("boom"));

        let err = view.submit("Hello").await.unwrap_err();

        assert!(matches!(err, StoreError::Generator(_)));
        assert_eq!(view.store().message_count(), 2);
        assert!(!view.store().loading());
        assert!(view.input_focused());
    }

    #[tokio::test]
    async fn test_typed_text_flows_through_input_to_store() {
        let view = view(ScriptedGenerator::new(["Hi "]));

        view.set_input("  Hello  ");
        assert!(view.submit_input().await.unwrap());

        assert_eq!(view.input_value(), "");
        let messages = view.store().messages();
        assert_eq!(messages[0].text, "  Hello  ");
        assert_eq!(messages[1].text, "Hi ");
        assert!(view.input_focused());
    }

    #[tokio::test]
    async fn test_blank_input_is_forwarded_and_ignored() {
        let view = view(ScriptedGenerator::new(["unused "]));

        view.set_input("   ");
        assert!(view.submit_input().await.unwrap());

        assert_eq!(view.input_value(), "");
        assert_eq!(view.store().message_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_refuses_while_reply_loads() {
        let view = view(
            ScriptedGenerator::new(["a ", "b "]).with_chunk_delay(Duration::from_millis(10)),
        );
        let sender = view.clone();
        let pending = tokio::spawn(async move { sender.submit("first").await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(view.store().loading());

        view.set_input("second");
        assert!(!view.submit_input().await.unwrap());
        assert_eq!(view.input_value(), "second");
        assert_eq!(view.take_submission("third"), None);
        assert_eq!(view.input_value(), "second");

        let html = view.render(Theme::Light);
        assert!(html.contains(r#"<div class="typing-indicator">AI is typing...</div>"#));
        assert!(html.contains(r#"<button type="submit" disabled>...</button>"#));

        pending.await.unwrap().unwrap();
        assert_eq!(view.store().message_count(), 2);
        assert_eq!(view.take_submission("third").as_deref(), Some("third"));
        assert_eq!(view.input_value(), "");
    }

    #[tokio::test]
    async fn test_render_does_not_disturb_typed_text() {
        let view = view(ScriptedGenerator::new(["Hi "]));
        view.set_input("draft");

        let html = view.render(Theme::Light);

        assert!(html.contains(r#"value="draft""#));
        assert_eq!(view.input_value(), "draft");
    }

    #[tokio::test]
    async fn test_render_page() {
        let view = view(ScriptedGenerator::new(["Hi "]));
        view.submit("Hello <you>").await.unwrap();

        let html = view.render(Theme::Dark);

        assert!(html.contains(r#"<html lang="en" class="dark">"#));
        assert!(html.contains("<h1>AI Chat Demo</h1>"));
        assert!(html.contains("☀️ Light"));
        assert!(html.contains("Hello &lt;you&gt;"));
        assert!(html.contains(r#"class="message ai""#));
        assert!(!html.contains(r#"<div class="typing-indicator">"#));
        assert!(html.contains(r#"placeholder="Type your message...""#));
        assert!(html.contains("new EventSource('/api/events')"));
    }
}
