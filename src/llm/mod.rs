pub mod client;
pub mod types;

pub use client::{ChatClient, ChatProvider};
pub use types::{ChatMessage, ChatRequest};
