//! Conversation state management.
//!
//! This module provides the single authority over the chat: the ordered
//! message list and the loading flag. All sends go through
//! [`ConversationStore::send_message`], which enforces the send state machine:
//!
//! 1. blank input is ignored
//! 2. the user message is appended immediately
//! 3. loading turns on and an empty AI placeholder is appended
//! 4. generator chunks are appended to the placeholder in place
//! 5. loading turns off and the completion hook fires, even on failure
//! 6. generator failures are returned to the caller after cleanup
//!
//! # Architecture
//!
//! - [`ConversationStore`]: cloneable handle to the shared conversation
//! - [`SendHooks`]: optional per-chunk and completion side effects
//! - [`StoreError`]: failures surfaced by a send
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use streaming_chat_demo::generator::ScriptedGenerator;
//! use streaming_chat_demo::store::ConversationStore;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = ConversationStore::new(Arc::new(ScriptedGenerator::new(["Hello ", "world"])));
//! store.send_message("Test").await.unwrap();
//!
//! let messages = store.messages();
//! assert_eq!(messages.len(), 2);
//! assert_eq!(messages[1].text, "Hello world");
//! assert!(!store.loading());
//! # });
//! ```

mod conversation;

pub use conversation::{ConversationStore, SendHooks};

use crate::generator::GeneratorError;

/// Errors returned by [`ConversationStore::send_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The response generator failed; the store has already cleaned up.
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    /// The store was disposed and accepts no more sends.
    #[error("conversation store has been disposed")]
    Disposed,
}
