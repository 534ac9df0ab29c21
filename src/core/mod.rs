pub mod accumulator;
pub mod chat_stream;
pub mod config;
pub mod conversation;
pub mod frame;
pub mod message;
pub mod render;
pub mod session;
pub mod transcripts;
