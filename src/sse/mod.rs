mod client;
mod parser;

pub use client::{ConnectionStatus, EventStreamClient};
pub use parser::SseParser;
