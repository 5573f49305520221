//! Deterministic generator with scripted output.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::message::Message;

use super::{ChunkStream, GeneratorError, GeneratorEvent, ResponseGenerator};

/// Generator that replays a fixed script.
///
/// Emits the configured chunks in order and completes with the configured
/// final text (by default the concatenation of the chunks), or fails with a
/// scripted error. Every invocation's user text is recorded.
///
/// Clones share the recorded invocations.
#[derive(Debug, Clone)]
pub struct ScriptedGenerator {
    chunks: Vec<String>,
    final_text: Option<String>,
    failure: Option<Failure>,
    chunk_delay: Duration,
    calls: Arc<Mutex<Vec<String>>>,
}

#[derive(Debug, Clone)]
enum Failure {
    /// Reject before any chunk is produced.
    OnStart(String),
    /// Reject after the scripted chunks.
    AfterChunks(String),
}

impl ScriptedGenerator {
    /// Script that emits `chunks` and then completes.
    #[must_use]
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            final_text: None,
            failure: None,
            chunk_delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script that fails immediately with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let mut generator = Self::new(Vec::<String>::new());
        generator.failure = Some(Failure::OnStart(message.into()));
        generator
    }

    /// Complete with `text` instead of the concatenated chunks.
    #[must_use]
    pub fn with_final_text(mut self, text: impl Into<String>) -> Self {
        self.final_text = Some(text.into());
        self
    }

    /// Fail with `message` once all chunks were emitted.
    #[must_use]
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(Failure::AfterChunks(message.into()));
        self
    }

    /// Sleep before each chunk.
    #[must_use]
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// User texts this generator was invoked with, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait::async_trait]
impl ResponseGenerator for ScriptedGenerator {
    async fn stream(&self, user_text: &str) -> Result<ChunkStream, GeneratorError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(user_text.to_string());

        if let Some(Failure::OnStart(message)) = &self.failure {
            tracing::debug!(error = %message, "Scripted generator failing on start");
            return Err(GeneratorError::failed(message.clone()));
        }

        let chunks = self.chunks.clone();
        let final_text = self
            .final_text
            .clone()
            .unwrap_or_else(|| chunks.concat());
        let late_failure = match &self.failure {
            Some(Failure::AfterChunks(message)) => Some(message.clone()),
            _ => None,
        };
        let delay = self.chunk_delay;

        let out = async_stream::stream! {
            for chunk in chunks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok::<_, GeneratorError>(GeneratorEvent::Chunk(chunk));
            }

            if let Some(message) = late_failure {
                yield Err(GeneratorError::Failed(message));
            } else {
                yield Ok(GeneratorEvent::Complete(Message::ai(final_text)));
            }
        };

        Ok(Box::pin(out))
    }
}
