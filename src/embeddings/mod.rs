// Embeddings module
// This module handles OpenAI integration and content chunking

pub mod chunking;
pub mod openai;

pub use chunking::{SplitterConfig, TextChunk, split_documents, split_text};
pub use openai::{ChatMessage, ChatRole, OpenAiClient};
