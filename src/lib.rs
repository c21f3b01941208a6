pub mod config;
pub mod core;
pub mod corpus;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod rerank;
pub mod server;
pub mod state;
