//! Chat-specific UI components.
//!
//! These components provide the layout and structure for the chat interface.
//! [`ChatView`] is the composition root: it owns the store handle and wires
//! the input's submissions to it.

mod header;
mod input_area;
mod message_list;
mod shell;

pub use header::render_header;
pub use input_area::{ChatInput, INPUT_PLACEHOLDER};
pub use message_list::{TYPING_INDICATOR, render_message_list};
pub use shell::{APP_TITLE, ChatView};
