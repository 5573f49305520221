//! Streaming Chat Demo
//!
//! A single-conversation chat where every reply is streamed word by word from
//! a simulated response generator into a placeholder message.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server with SSE streaming
//! - **Store**: Conversation state machine driving sends and replies
//! - **Generator**: Pluggable streaming reply source
//! - **UI**: Server-rendered HTML kept live by store events
//!
//! # Modules
//!
//! - [`message`]: Chat message model
//! - [`generator`]: Response generator trait and implementations
//! - [`store`]: Conversation store
//! - [`events`]: Store events and their SSE encoding
//! - [`ui`]: Page components
//! - [`server`]: HTTP routes
//! - [`config`]: Layered configuration

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod events;
pub mod generator;
pub mod message;
pub mod server;
pub mod store;
pub mod ui;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::generator::ResponseGenerator;
use crate::store::ConversationStore;
use crate::ui::ChatView;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The chat screen and the conversation behind it.
    pub view: ChatView,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, generator: Arc<dyn ResponseGenerator>) -> Self {
        Self {
            view: ChatView::new(ConversationStore::new(generator)),
            config,
        }
    }
}
