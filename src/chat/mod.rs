// Conversational query loop
// Retrieval chain over the documents table with in-memory history

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::io::{BufRead, Write};
use tracing::{debug, error};

use crate::database::postgres::Database;
use crate::embeddings::openai::{ChatMessage, ChatRole, OpenAiClient};

pub const FALLBACK_ANSWER: &str =
    "I apologize, but I encountered an error processing your request.";

const QUIT_COMMAND: &str = "quit";
const DEFAULT_RETRIEVAL_LIMIT: i64 = 4;
const SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about a school's \
archive. Use the provided context excerpts to answer. If the context does not contain the \
answer, say so.";

/// An answer plus the metadata of every source chunk used to produce it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainResponse {
    pub answer: String,
    pub sources: Vec<Value>,
}

/// Seam between the interactive loop and the retrieval chain
#[async_trait]
pub trait QuestionAnswerer {
    async fn ask(&mut self, question: &str) -> ChainResponse;
}

/// Conversational retrieval chain: embed the question, retrieve the closest
/// chunks, and answer with the chat model conditioned on them and on the
/// conversation so far.
pub struct RagChain {
    database: Database,
    client: OpenAiClient,
    history: Vec<ChatMessage>,
    retrieval_limit: i64,
}

impl RagChain {
    #[inline]
    pub fn new(database: Database, client: OpenAiClient) -> Self {
        Self {
            database,
            client,
            history: Vec::new(),
            retrieval_limit: DEFAULT_RETRIEVAL_LIMIT,
        }
    }

    async fn answer(&mut self, question: &str) -> Result<ChainResponse> {
        let embedding = self
            .client
            .embed(question)
            .context("Failed to embed question")?;

        let documents = self
            .database
            .similarity_search(&embedding, self.retrieval_limit)
            .await?;

        debug!("Answering with {} retrieved chunk(s)", documents.len());

        let context_block = documents
            .iter()
            .map(|document| document.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage {
            role: ChatRole::System,
            content: format!("{SYSTEM_PROMPT}\n\nContext:\n{context_block}"),
        });
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage {
            role: ChatRole::User,
            content: question.to_string(),
        });

        let answer = self
            .client
            .chat(&messages)
            .context("Failed to generate answer")?;

        self.history.push(ChatMessage {
            role: ChatRole::User,
            content: question.to_string(),
        });
        self.history.push(ChatMessage {
            role: ChatRole::Assistant,
            content: answer.clone(),
        });

        let sources = documents
            .into_iter()
            .map(|document| document.metadata.unwrap_or(Value::Null))
            .collect();

        Ok(ChainResponse { answer, sources })
    }
}

#[async_trait]
impl QuestionAnswerer for RagChain {
    /// Errors never escape a query: the loop degrades to a fixed apology
    /// with no sources and keeps running.
    async fn ask(&mut self, question: &str) -> ChainResponse {
        match self.answer(question).await {
            Ok(response) => response,
            Err(error) => {
                error!("Error querying chain: {error:#}");
                ChainResponse {
                    answer: FALLBACK_ANSWER.to_string(),
                    sources: Vec::new(),
                }
            }
        }
    }
}

/// Interactive read-eval loop over the given input and output. Terminates
/// on a case-insensitive `quit` or at end of input.
#[inline]
pub async fn run_repl<A, R, W>(chain: &mut A, mut input: R, mut output: W) -> Result<()>
where
    A: QuestionAnswerer + Send,
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "\nEnter your question (or 'quit' to exit): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let question = line.trim();
        if question.eq_ignore_ascii_case(QUIT_COMMAND) {
            return Ok(());
        }

        let response = chain.ask(question).await;

        writeln!(output, "\nAnswer: {}", response.answer)?;
        writeln!(output, "\nSources:")?;
        for source in &response.sources {
            writeln!(output, "- {source}")?;
        }
    }
}
