//! Conversation store and the send state machine.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use crate::events::StoreEvent;
use crate::generator::{ResponseGenerator, generate};
use crate::message::Message;

use super::StoreError;

/// Capacity of the change-notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Optional side effects for a single send.
///
/// `on_chunk` runs once per generator chunk (after the chunk was applied or
/// dropped); `on_complete` runs exactly once when the send finishes, whether
/// it succeeded or failed.
#[derive(Default)]
pub struct SendHooks {
    on_chunk: Option<Box<dyn FnMut() + Send>>,
    on_complete: Option<Box<dyn FnOnce() + Send>>,
}

impl std::fmt::Debug for SendHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendHooks")
            .field("on_chunk", &self.on_chunk.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl SendHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` after every chunk, e.g. to keep the list scrolled to the bottom.
    #[must_use]
    pub fn on_chunk(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_chunk = Some(Box::new(f));
        self
    }

    /// Run `f` once the send is over, e.g. to refocus the input.
    #[must_use]
    pub fn on_complete(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

/// Shared conversation: ordered messages plus the loading flag.
///
/// Cloning yields another handle to the same conversation. The store is the
/// only writer; readers take snapshots or [`subscribe`](Self::subscribe) to
/// change notifications.
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: RwLock<ConversationState>,
    generator: Arc<dyn ResponseGenerator>,
    events: RwLock<Option<broadcast::Sender<StoreEvent>>>,
}

#[derive(Debug, Default)]
struct ConversationState {
    messages: Vec<Message>,
    /// Sends that have started and not yet finished. Loading is `in_flight > 0`.
    in_flight: usize,
    /// Bumped by `reset` and `dispose`; sends started in an older epoch no
    /// longer count towards `in_flight`.
    epoch: u64,
    disposed: bool,
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("ConversationStore")
            .field("message_count", &state.messages.len())
            .field("loading", &(state.in_flight > 0))
            .field("disposed", &state.disposed)
            .field("generator", &"ResponseGenerator")
            .finish()
    }
}

impl ConversationStore {
    /// Create an empty, idle conversation backed by `generator`.
    #[must_use]
    pub fn new(generator: Arc<dyn ResponseGenerator>) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(ConversationState::default()),
                generator,
                events: RwLock::new(Some(sender)),
            }),
        }
    }

    /// Snapshot of the messages in send order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.read().messages.clone()
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.read().messages.len()
    }

    /// Whether a send is in flight.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.read().in_flight > 0
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.read().disposed
    }

    /// Receive every change made after this call.
    ///
    /// After [`dispose`](Self::dispose) the returned receiver is already closed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        let guard = self
            .inner
            .events
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = guard.as_ref() {
            sender.subscribe()
        } else {
            let (_, receiver) = broadcast::channel(1);
            receiver
        }
    }

    /// Send `text` without side-effect hooks.
    pub async fn send_message(&self, text: &str) -> Result<(), StoreError> {
        self.send_message_with(text, SendHooks::default()).await
    }

    /// Send `text`, stream the reply into a placeholder and run `hooks`.
    ///
    /// Blank input (empty after trimming) is ignored: nothing is appended, no
    /// hook runs and `Ok(())` is returned.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Generator`] if the generator fails. Loading is already
    ///   off and `on_complete` has already run when this is returned.
    /// - [`StoreError::Disposed`] if the store was disposed. Nothing is
    ///   appended, but `on_complete` still runs.
    pub async fn send_message_with(&self, text: &str, hooks: SendHooks) -> Result<(), StoreError> {
        if text.trim().is_empty() {
            tracing::debug!(text_length = text.len(), "Ignoring blank message");
            return Ok(());
        }

        let SendHooks {
            mut on_chunk,
            on_complete,
        } = hooks;

        let (placeholder_id, epoch) = match self.begin_send(text) {
            Ok(started) => started,
            Err(e) => {
                if let Some(hook) = on_complete {
                    hook();
                }
                return Err(e);
            }
        };

        tracing::info!(
            placeholder_id = %placeholder_id,
            text_length = text.len(),
            "Sending message"
        );

        let mut chunk_count = 0_usize;
        let result = generate(self.inner.generator.as_ref(), text, |chunk| {
            chunk_count += 1;
            self.apply_chunk(&placeholder_id, chunk);
            if let Some(hook) = on_chunk.as_mut() {
                hook();
            }
        })
        .await;

        self.finish_send(epoch);
        if let Some(hook) = on_complete {
            hook();
        }

        match result {
            Ok(reply) => {
                tracing::info!(
                    placeholder_id = %placeholder_id,
                    chunk_count = chunk_count,
                    reply_length = reply.text.len(),
                    "Reply complete"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    placeholder_id = %placeholder_id,
                    chunk_count = chunk_count,
                    error = %e,
                    "Reply failed"
                );
                self.publish(StoreEvent::SendFailed {
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Remove all messages. Loading is left as it is.
    pub fn clear_chat(&self) {
        let removed = {
            let mut state = self.write();
            let removed = state.messages.len();
            state.messages.clear();
            removed
        };
        tracing::debug!(removed = removed, "Chat cleared");
        self.publish(StoreEvent::Cleared);
    }

    /// Restore the initial state: no messages, not loading.
    pub fn reset(&self) {
        let was_loading = {
            let mut state = self.write();
            let was_loading = state.in_flight > 0;
            state.messages.clear();
            state.in_flight = 0;
            state.epoch += 1;
            was_loading
        };
        tracing::debug!(was_loading = was_loading, "Conversation reset");
        self.publish(StoreEvent::Reset);
        if was_loading {
            self.publish(StoreEvent::LoadingChanged { loading: false });
        }
    }

    /// Tear the conversation down.
    ///
    /// Clears all state, closes every subscription and rejects further sends.
    /// Calling it again has no effect.
    pub fn dispose(&self) {
        {
            let mut state = self.write();
            if state.disposed {
                return;
            }
            state.messages.clear();
            state.in_flight = 0;
            state.epoch += 1;
            state.disposed = true;
        }
        self.inner
            .events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::info!("Conversation store disposed");
    }

    /// Append the user message and placeholder; returns the placeholder id
    /// and the epoch the send belongs to.
    fn begin_send(&self, text: &str) -> Result<(String, u64), StoreError> {
        let user = Message::user(text);
        let placeholder = Message::placeholder();
        let placeholder_id = placeholder.id.clone();

        let (started_loading, epoch) = {
            let mut state = self.write();
            if state.disposed {
                return Err(StoreError::Disposed);
            }
            state.messages.push(user.clone());
            state.in_flight += 1;
            state.messages.push(placeholder.clone());
            (state.in_flight == 1, state.epoch)
        };

        self.publish(StoreEvent::MessageAppended { message: user });
        if started_loading {
            self.publish(StoreEvent::LoadingChanged { loading: true });
        }
        self.publish(StoreEvent::MessageAppended {
            message: placeholder,
        });

        Ok((placeholder_id, epoch))
    }

    /// Append `chunk` to the placeholder with `id`, if it still exists.
    fn apply_chunk(&self, id: &str, chunk: &str) -> bool {
        let applied = {
            let mut state = self.write();
            match state.messages.iter_mut().rev().find(|m| m.id == id) {
                Some(message) => {
                    message.text.push_str(chunk);
                    true
                }
                None => false,
            }
        };

        if applied {
            self.publish(StoreEvent::MessageDelta {
                id: id.to_string(),
                text: chunk.to_string(),
            });
        } else {
            tracing::debug!(placeholder_id = %id, "Dropping chunk for missing placeholder");
        }
        applied
    }

    fn finish_send(&self, epoch: u64) {
        let stopped_loading = {
            let mut state = self.write();
            if state.epoch != epoch {
                // Already discounted by a reset or dispose.
                return;
            }
            state.in_flight = state.in_flight.saturating_sub(1);
            state.in_flight == 0
        };
        if stopped_loading {
            self.publish(StoreEvent::LoadingChanged { loading: false });
        }
    }

    fn publish(&self, event: StoreEvent) {
        let guard = self
            .inner
            .events
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = guard.as_ref() {
            // No subscribers is fine.
            let _ = sender.send(event);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ConversationState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConversationState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::StreamExt;

    use super::*;
    use crate::generator::{ChunkStream, GeneratorError, GeneratorEvent, ScriptedGenerator};
    use crate::message::Sender;

    fn store_with(generator: ScriptedGenerator) -> (ConversationStore, ScriptedGenerator) {
        let store = ConversationStore::new(Arc::new(generator.clone()));
        (store, generator)
    }

    fn counter_hook(counter: &Arc<AtomicUsize>) -> impl FnMut() + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn drain(rx: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Streams the user's text back one character at a time.
    struct EchoGenerator {
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl ResponseGenerator for EchoGenerator {
        async fn stream(&self, user_text: &str) -> Result<ChunkStream, GeneratorError> {
            let text = user_text.to_string();
            let delay = self.delay;
            let out = async_stream::stream! {
                for c in text.chars() {
                    tokio::time::sleep(delay).await;
                    yield Ok::<_, GeneratorError>(GeneratorEvent::Chunk(c.to_string()));
                }
                yield Ok(GeneratorEvent::Complete(Message::ai(text.clone())));
            };
            Ok(Box::pin(out))
        }
    }

    #[test]
    fn test_new_store_is_empty_and_idle() {
        let (store, _) = store_with(ScriptedGenerator::new(["x"]));
        assert!(store.messages().is_empty());
        assert_eq!(store.message_count(), 0);
        assert!(!store.loading());
        assert!(!store.is_disposed());
    }

    #[tokio::test]
    async fn test_blank_messages_are_ignored() {
        let (store, generator) = store_with(ScriptedGenerator::new(["x"]));
        let mut rx = store.subscribe();
        let chunks = Arc::new(AtomicUsize::new(0));
        let completions = Arc::new(AtomicUsize::new(0));

        for text in ["", "   ", "\n\t "] {
            let hooks = SendHooks::new()
                .on_chunk(counter_hook(&chunks))
                .on_complete({
                    let completions = Arc::clone(&completions);
                    move || {
                        completions.fetch_add(1, Ordering::SeqCst);
                    }
                });
            store.send_message_with(text, hooks).await.unwrap();
        }

        assert!(store.messages().is_empty());
        assert!(!store.loading());
        assert_eq!(generator.call_count(), 0);
        assert_eq!(chunks.load(Ordering::SeqCst), 0);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_send_appends_user_then_placeholder() {
        let (store, generator) =
            store_with(ScriptedGenerator::new(Vec::<String>::new()).with_final_text("AI response"));

        store.send_message("Hello").await.unwrap();

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "Hello");
        assert_eq!(messages[1].sender, Sender::Ai);
        // Text comes from chunks only, never from the final message.
        assert_eq!(messages[1].text, "");
        assert_ne!(messages[0].id, messages[1].id);
        assert_eq!(generator.calls(), ["Hello"]);
    }

    #[tokio::test]
    async fn test_user_text_is_kept_untrimmed() {
        let (store, generator) = store_with(ScriptedGenerator::new(["ok"]));
        store.send_message("  padded  ").await.unwrap();
        assert_eq!(store.messages()[0].text, "  padded  ");
        assert_eq!(generator.calls(), ["  padded  "]);
    }

    #[tokio::test]
    async fn test_chunks_fill_the_placeholder() {
        let (store, _) =
            store_with(ScriptedGenerator::new(["Hello ", "world"]).with_final_text("Hello world"));

        store.send_message("Test").await.unwrap();

        assert_eq!(store.messages()[1].text, "Hello world");
    }

    #[tokio::test]
    async fn test_loading_is_on_during_send() {
        let (store, _) = store_with(ScriptedGenerator::new(["a", "b"]));
        let observed = Arc::new(Mutex::new(Vec::new()));

        let hooks = SendHooks::new().on_chunk({
            let store = store.clone();
            let observed = Arc::clone(&observed);
            move || observed.lock().unwrap().push(store.loading())
        });

        assert!(!store.loading());
        store.send_message_with("Hello", hooks).await.unwrap();

        assert_eq!(*observed.lock().unwrap(), [true, true]);
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn test_on_chunk_runs_once_per_chunk_in_order() {
        let (store, _) = store_with(ScriptedGenerator::new(["chunk1", "chunk2"]));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let hooks = SendHooks::new().on_chunk({
            let store = store.clone();
            let seen = Arc::clone(&seen);
            move || {
                let text = store.messages()[1].text.clone();
                seen.lock().unwrap().push(text);
            }
        });

        store.send_message_with("Test", hooks).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), ["chunk1", "chunk1chunk2"]);
    }

    #[tokio::test]
    async fn test_on_complete_runs_once() {
        let (store, _) = store_with(ScriptedGenerator::new(["x"]));
        let completions = Arc::new(AtomicUsize::new(0));
        let loading_at_complete = Arc::new(AtomicBool::new(true));

        let hooks = SendHooks::new().on_complete({
            let completions = Arc::clone(&completions);
            let loading_at_complete = Arc::clone(&loading_at_complete);
            let store = store.clone();
            move || {
                completions.fetch_add(1, Ordering::SeqCst);
                loading_at_complete.store(store.loading(), Ordering::SeqCst);
            }
        });

        store.send_message_with("Test", hooks).await.unwrap();

        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(!loading_at_complete.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failure_cleans_up_then_propagates() {
        let (store, _) = store_with(ScriptedGenerator::failing("API Error"));
        let completions = Arc::new(AtomicUsize::new(0));
        let mut rx = store.subscribe();

        let hooks = SendHooks::new().on_complete({
            let completions = Arc::clone(&completions);
            move || {
                completions.fetch_add(1, Ordering::SeqCst);
            }
        });

        let err = store.send_message_with("Test", hooks).await.unwrap_err();

        assert_eq!(err, StoreError::Generator(GeneratorError::failed("API Error")));
        assert_eq!(err.to_string(), "API Error");
        assert!(!store.loading());
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(store.message_count(), 2);

        let events = drain(&mut rx);
        assert_eq!(
            events.last(),
            Some(&StoreEvent::SendFailed {
                message: "API Error".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_failure_after_chunks_keeps_partial_text() {
        let (store, _) = store_with(ScriptedGenerator::new(["par", "tial"]).then_fail("lost"));
        let chunks = Arc::new(AtomicUsize::new(0));

        let result = store
            .send_message_with("Test", SendHooks::new().on_chunk(counter_hook(&chunks)))
            .await;

        assert!(matches!(result, Err(StoreError::Generator(_))));
        assert_eq!(chunks.load(Ordering::SeqCst), 2);
        assert_eq!(store.messages()[1].text, "partial");
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn test_events_follow_the_send() {
        let (store, _) = store_with(ScriptedGenerator::new(["Hi"]));
        let mut rx = store.subscribe();

        store.send_message("Yo").await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 5);
        assert!(matches!(&events[0], StoreEvent::MessageAppended { message } if message.is_user()));
        assert_eq!(events[1], StoreEvent::LoadingChanged { loading: true });
        let placeholder_id = match &events[2] {
            StoreEvent::MessageAppended { message } if message.is_ai() => message.id.clone(),
            other => panic!("unexpected event: {other:?}"),
        };
        assert_eq!(
            events[3],
            StoreEvent::MessageDelta {
                id: placeholder_id,
                text: "Hi".to_string()
            }
        );
        assert_eq!(events[4], StoreEvent::LoadingChanged { loading: false });
    }

    #[tokio::test]
    async fn test_clear_chat_keeps_loading_and_drops_later_chunks() {
        let (store, _) = store_with(ScriptedGenerator::new(["first", "second"]));
        let loading_after_clear = Arc::new(AtomicBool::new(false));
        let chunks = Arc::new(AtomicUsize::new(0));

        let hooks = SendHooks::new().on_chunk({
            let store = store.clone();
            let loading_after_clear = Arc::clone(&loading_after_clear);
            let chunks = Arc::clone(&chunks);
            move || {
                if chunks.fetch_add(1, Ordering::SeqCst) == 0 {
                    store.clear_chat();
                    loading_after_clear.store(store.loading(), Ordering::SeqCst);
                }
            }
        });

        store.send_message_with("Test", hooks).await.unwrap();

        assert!(loading_after_clear.load(Ordering::SeqCst));
        assert_eq!(chunks.load(Ordering::SeqCst), 2);
        assert!(store.messages().is_empty());
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn test_clear_chat_when_idle() {
        let (store, _) = store_with(ScriptedGenerator::new(["x"]));
        store.send_message("one").await.unwrap();
        store.send_message("two").await.unwrap();
        assert_eq!(store.message_count(), 4);

        store.clear_chat();

        assert!(store.messages().is_empty());
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn test_reset_forces_loading_off() {
        let (store, _) = store_with(ScriptedGenerator::new(["a", "b"]));
        let loading_after_reset = Arc::new(AtomicBool::new(true));

        let hooks = SendHooks::new().on_chunk({
            let store = store.clone();
            let loading_after_reset = Arc::clone(&loading_after_reset);
            move || {
                store.reset();
                loading_after_reset.store(store.loading(), Ordering::SeqCst);
            }
        });

        store.send_message_with("Test", hooks).await.unwrap();

        assert!(!loading_after_reset.load(Ordering::SeqCst));
        assert!(store.messages().is_empty());
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn test_dispose_closes_subscribers_and_rejects_sends() {
        let (store, generator) = store_with(ScriptedGenerator::new(["x"]));
        store.send_message("before").await.unwrap();
        let mut rx = store.subscribe();

        store.dispose();
        store.dispose();

        assert!(store.is_disposed());
        assert!(store.messages().is_empty());
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert_eq!(
            store.send_message("after").await,
            Err(StoreError::Disposed)
        );
        assert_eq!(generator.call_count(), 1);

        let mut late = store.subscribe();
        assert!(matches!(
            late.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_send_after_dispose_still_runs_on_complete() {
        let (store, generator) = store_with(ScriptedGenerator::new(["x"]));
        store.dispose();
        let chunks = Arc::new(AtomicUsize::new(0));
        let completions = Arc::new(AtomicUsize::new(0));

        let hooks = SendHooks::new()
            .on_chunk(counter_hook(&chunks))
            .on_complete(counter_hook(&completions));
        let result = store.send_message_with("hi", hooks).await;

        assert_eq!(result, Err(StoreError::Disposed));
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(chunks.load(Ordering::SeqCst), 0);
        assert_eq!(generator.call_count(), 0);
        assert!(store.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_started_before_reset_does_not_end_later_loading() {
        let (store, _) = store_with(
            ScriptedGenerator::new(["a", "b", "c"]).with_chunk_delay(Duration::from_millis(10)),
        );
        let mut rx = store.subscribe();

        let stale = store.clone();
        let fresh = store.clone();
        let resetter = store.clone();
        let sampler = store.clone();

        // The stale send finishes at 30ms, the fresh one at 45ms.
        let watcher = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(35)).await;
            sampler.loading()
        });

        let (a, b, ()) = tokio::join!(
            stale.send_message("old"),
            async {
                tokio::time::sleep(Duration::from_millis(15)).await;
                fresh.send_message("new").await
            },
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                resetter.reset();
            },
        );
        a.unwrap();
        b.unwrap();

        assert!(watcher.await.unwrap());
        assert!(!store.loading());

        let texts: Vec<_> = store.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["new", "abc"]);

        let loading_changes: Vec<bool> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                StoreEvent::LoadingChanged { loading } => Some(loading),
                _ => None,
            })
            .collect();
        assert_eq!(loading_changes, [true, false, true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_sends_keep_their_own_placeholders() {
        let store = ConversationStore::new(Arc::new(EchoGenerator {
            delay: Duration::from_millis(10),
        }));

        let first = store.clone();
        let second = store.clone();
        let probe = store.clone();

        let watcher = tokio::spawn(async move {
            let mut loading_samples = Vec::new();
            for _ in 0..3 {
                tokio::time::sleep(Duration::from_millis(12)).await;
                loading_samples.push(probe.loading());
            }
            loading_samples
        });

        let (a, b) = tokio::join!(first.send_message("abcd"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            second.send_message("wxyz").await
        });
        a.unwrap();
        b.unwrap();

        let texts: Vec<_> = store.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["abcd", "abcd", "wxyz", "wxyz"]);
        assert!(!store.loading());
        assert_eq!(watcher.await.unwrap(), [true, true, true]);
    }

    #[tokio::test]
    async fn test_subscriber_stream_sees_deltas() {
        let (store, _) = store_with(ScriptedGenerator::new(["a", "b", "c"]));
        let rx = store.subscribe();

        store.send_message("go").await.unwrap();
        store.dispose();

        let deltas: Vec<String> = tokio_stream::wrappers::BroadcastStream::new(rx)
            .filter_map(|event| async move {
                match event {
                    Ok(StoreEvent::MessageDelta { text, .. }) => Some(text),
                    _ => None,
                }
            })
            .collect()
            .await;
        assert_eq!(deltas, ["a", "b", "c"]);
    }
}
