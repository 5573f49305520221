//! Simulated AI that streams canned responses word by word.
//!
//! There is no model behind this generator: it picks one of a handful of
//! canned replies at random and emits it one word at a time, sleeping before
//! every word to imitate network latency.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;

use crate::message::Message;

use super::{ChunkStream, GeneratorError, GeneratorEvent, ResponseGenerator};

/// Delay before each word when none is configured.
pub const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(150);

/// Reply used when no canned response is available.
pub const FALLBACK_RESPONSE: &str = "I don't have a response for that.";

/// Built-in canned replies.
pub const DEFAULT_RESPONSES: [&str; 6] = [
    "That's a fascinating perspective! I think you're onto something really important here. This kind of approach could revolutionize how we think about problem-solving in complex systems.",
    "I completely agree with your analysis. The way you've broken down this concept shows a deep understanding of the underlying principles. Let me elaborate on why this matters so much in the broader context.",
    "You've raised an excellent question that gets to the heart of the matter. This is exactly the kind of critical thinking we need more of. Your observation about the interconnected nature of these systems is particularly insightful.",
    "What you're describing reminds me of some groundbreaking research I've come across recently. The implications of this approach could extend far beyond what we initially imagined, potentially transforming entire industries.",
    "I find your reasoning quite compelling, and it aligns perfectly with some emerging trends I've been analyzing. The data suggests that this methodology could yield significant improvements in efficiency and outcomes.",
    "Your insight touches on a fundamental principle that many people overlook. This holistic approach you're suggesting could address multiple challenges simultaneously, which is exactly what we need in today's complex environment.",
];

/// Canned-response generator with a per-word delay.
#[derive(Debug, Clone)]
pub struct SimulatedGenerator {
    responses: Arc<[String]>,
    word_delay: Duration,
}

impl Default for SimulatedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedGenerator {
    /// Generator over [`DEFAULT_RESPONSES`] with [`DEFAULT_WORD_DELAY`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: DEFAULT_RESPONSES.iter().map(ToString::to_string).collect(),
            word_delay: DEFAULT_WORD_DELAY,
        }
    }

    /// Replace the canned replies. An empty list means every reply is
    /// [`FALLBACK_RESPONSE`].
    #[must_use]
    pub fn with_responses<I, S>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses = responses.into_iter().map(Into::into).collect();
        self
    }

    /// Set the delay before each word. Zero disables sleeping.
    #[must_use]
    pub fn with_word_delay(mut self, delay: Duration) -> Self {
        self.word_delay = delay;
        self
    }

    #[must_use]
    pub fn word_delay(&self) -> Duration {
        self.word_delay
    }

    #[must_use]
    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    fn pick_response(&self) -> String {
        self.responses
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| FALLBACK_RESPONSE.to_string())
    }
}

/// Split a reply into word chunks, each followed by a single space.
pub fn word_chunks(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(' ').map(|word| format!("{word} "))
}

#[async_trait::async_trait]
impl ResponseGenerator for SimulatedGenerator {
    async fn stream(&self, user_text: &str) -> Result<ChunkStream, GeneratorError> {
        let text = self.pick_response();
        let delay = self.word_delay;

        tracing::debug!(
            user_text_length = user_text.len(),
            reply_length = text.len(),
            word_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Simulating streamed reply"
        );

        let out = async_stream::stream! {
            let chunks: Vec<String> = word_chunks(&text).collect();
            for chunk in chunks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok::<_, GeneratorError>(GeneratorEvent::Chunk(chunk));
            }

            yield Ok(GeneratorEvent::Complete(Message::ai(text)));
        };

        Ok(Box::pin(out))
    }
}
