//! Response generator traits and implementations.
//!
//! A response generator turns the user's submitted text into an AI reply that
//! is delivered incrementally. The [`ResponseGenerator`] trait exposes the
//! reply as a stream of [`GeneratorEvent`]s: zero or more
//! [`GeneratorEvent::Chunk`]s in emission order, terminated by exactly one
//! [`GeneratorEvent::Complete`] carrying the final [`Message`].
//!
//! # Generators
//!
//! - [`SimulatedGenerator`]: canned responses streamed word by word with an
//!   artificial delay standing in for network latency
//! - [`ScriptedGenerator`]: deterministic chunks or a scripted failure
//!
//! # Example
//!
//! ```rust
//! use streaming_chat_demo::generator::{ScriptedGenerator, generate};
//!
//! # tokio_test_block(async {
//! let generator = ScriptedGenerator::new(["Hello ", "world"]);
//! let mut seen = Vec::new();
//! let reply = generate(&generator, "Test", |chunk| seen.push(chunk.to_string()))
//!     .await
//!     .unwrap();
//! assert_eq!(seen, ["Hello ", "world"]);
//! assert_eq!(reply.text, "Hello world");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod scripted;
pub mod simulated;

pub use scripted::ScriptedGenerator;
pub use simulated::SimulatedGenerator;

use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::message::Message;

/// One item of a generator's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorEvent {
    /// A fragment of reply text, to be appended to what came before.
    Chunk(String),
    /// The reply is finished. The message's sender is always AI.
    Complete(Message),
}

/// Errors surfaced by a response generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    /// The generator could not produce a reply.
    #[error("{0}")]
    Failed(String),
    /// The stream ended before a final message was delivered.
    #[error("response stream ended without a final message")]
    Incomplete,
}

impl GeneratorError {
    /// Convenience constructor for [`GeneratorError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Boxed stream of generator output.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GeneratorEvent, GeneratorError>> + Send>>;

/// Trait for streaming response generators.
#[async_trait::async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Start generating a reply to `user_text`.
    ///
    /// # Errors
    ///
    /// Returns an error if generation cannot start. Failures after the
    /// stream has started are delivered as `Err` items.
    async fn stream(&self, user_text: &str) -> Result<ChunkStream, GeneratorError>;
}

/// Drive a generator to completion, handing each chunk to `on_chunk`.
///
/// Chunks are delivered in emission order. Returns the generator's final
/// message; the caller decides whether to use its text or the chunks.
///
/// # Errors
///
/// Returns the first error raised by the generator, or
/// [`GeneratorError::Incomplete`] if the stream ends without a final message.
pub async fn generate<G, F>(
    generator: &G,
    user_text: &str,
    mut on_chunk: F,
) -> Result<Message, GeneratorError>
where
    G: ResponseGenerator + ?Sized,
    F: FnMut(&str) + Send,
{
    let mut stream = generator.stream(user_text).await?;

    while let Some(item) = stream.next().await {
        match item? {
            GeneratorEvent::Chunk(text) => on_chunk(&text),
            GeneratorEvent::Complete(message) => return Ok(message),
        }
    }

    Err(GeneratorError::Incomplete)
}
