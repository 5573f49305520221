//! Store change notifications and their SSE encoding.
//!
//! Every mutation of the [`ConversationStore`](crate::store::ConversationStore)
//! is published as a [`StoreEvent`]. Subscribers (the SSE route, tests, any
//! re-rendering consumer) observe the conversation through these events rather
//! than by polling.
//!
//! # Example
//!
//! ```rust
//! use streaming_chat_demo::events::{StoreEvent, sse_event};
//!
//! let event = StoreEvent::LoadingChanged { loading: true };
//! let sse = sse_event(&event);
//! assert!(sse.starts_with("event: loading.changed\n"));
//! ```

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Observable change to the conversation state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum StoreEvent {
    /// A message was appended to the end of the conversation.
    #[serde(rename = "message.appended")]
    MessageAppended {
        /// The appended message as it was at insertion time.
        message: Message,
    },

    /// A chunk was appended to a streaming AI message.
    #[serde(rename = "message.delta")]
    MessageDelta {
        /// Id of the message that grew.
        id: String,
        /// The text fragment that was appended.
        text: String,
    },

    /// The loading flag flipped.
    #[serde(rename = "loading.changed")]
    LoadingChanged { loading: bool },

    /// All messages were removed; loading untouched.
    #[serde(rename = "chat.cleared")]
    Cleared,

    /// Messages removed and loading forced off.
    #[serde(rename = "chat.reset")]
    Reset,

    /// A send finished with a generator failure.
    #[serde(rename = "send.failed")]
    SendFailed {
        /// Human-readable error.
        message: String,
    },
}

/// Get the SSE event name for a [`StoreEvent`].
pub fn event_name(evt: &StoreEvent) -> &'static str {
    match evt {
        StoreEvent::MessageAppended { .. } => "message.appended",
        StoreEvent::MessageDelta { .. } => "message.delta",
        StoreEvent::LoadingChanged { .. } => "loading.changed",
        StoreEvent::Cleared => "chat.cleared",
        StoreEvent::Reset => "chat.reset",
        StoreEvent::SendFailed { .. } => "send.failed",
    }
}

/// Convert a [`StoreEvent`] to an SSE-formatted frame.
///
/// The frame carries an `event:` line for `EventSource` listeners and a
/// `data:` line with the JSON payload.
pub fn sse_event(evt: &StoreEvent) -> String {
    let json = serde_json::to_string(evt).unwrap_or_else(|e| {
        serde_json::json!({ "type": "send.failed", "data": { "message": e.to_string() } })
            .to_string()
    });

    let event_name = event_name(evt);

    format!("event: {event_name}\ndata: {json}\n\n")
}
