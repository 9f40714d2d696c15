use anyhow::{Context, Result};
use std::io::{BufReader, stdout};
use tracing::info;

use crate::chat::{RagChain, run_repl};
use crate::config::{Config, SupabaseConfig};
use crate::database::postgres::Database;
use crate::embeddings::openai::OpenAiClient;
use crate::ingest::Ingestor;

/// Provision tables, the vector extension, and indexes. Credentials are
/// checked before any other work; re-running fails once the schema exists.
#[inline]
pub async fn run_setup() -> Result<()> {
    let supabase = SupabaseConfig::from_env()?;

    let database = Database::connect(&supabase)
        .await
        .context("Failed to connect to database")?;

    database.provision().await?;

    println!("Database provisioning complete.");
    Ok(())
}

/// Run the batch ingestion pipeline over the configured source directories
#[inline]
pub async fn run_ingest(config: &Config) -> Result<()> {
    let supabase = SupabaseConfig::from_env()?;

    let database = Database::connect(&supabase)
        .await
        .context("Failed to connect to database")?;

    let embeddings =
        OpenAiClient::new(&config.openai).context("Failed to create OpenAI client")?;

    let ingestor = Ingestor::new(database, embeddings, config);
    let stats = ingestor.process_all().await?;

    println!("Ingestion complete.");
    println!("  Files processed: {}", stats.files_processed);
    println!("  Chunks created: {}", stats.chunks_created);
    println!("  Rows inserted: {}", stats.rows_inserted);
    if stats.rows_rejected > 0 {
        println!("  Rows rejected: {}", stats.rows_rejected);
    }

    Ok(())
}

/// Start the interactive question answering loop on stdin/stdout
#[inline]
pub async fn run_chat(config: &Config) -> Result<()> {
    let supabase = SupabaseConfig::from_env()?;

    let database = Database::connect(&supabase)
        .await
        .context("Failed to connect to database")?;

    let client = OpenAiClient::new(&config.openai).context("Failed to create OpenAI client")?;

    info!("Starting conversational query loop");

    let mut chain = RagChain::new(database, client);
    run_repl(&mut chain, BufReader::new(std::io::stdin()), stdout()).await
}

/// Show connectivity and ingestion status
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("📊 SGS-RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🗄️  Database Status:");
    let database = match SupabaseConfig::from_env() {
        Ok(supabase) => match Database::connect(&supabase).await {
            Ok(database) => {
                println!("   ✅ Postgres: Connected");
                Some(database)
            }
            Err(error) => {
                println!("   ❌ Postgres: Failed to connect - {error}");
                None
            }
        },
        Err(error) => {
            println!("   ❌ Postgres: {error}");
            None
        }
    };

    println!("🤖 OpenAI Status:");
    match OpenAiClient::new(&config.openai) {
        Ok(_client) => {
            println!("   ✅ OpenAI: Client configured");
            println!("   📋 Embedding Model: {}", config.openai.embedding_model);
            println!("   📋 Chat Model: {}", config.openai.chat_model);
        }
        Err(error) => {
            println!("   ❌ OpenAI: {error}");
        }
    }

    if let Some(database) = database {
        println!();
        println!("📚 Document Overview:");
        match database.document_counts().await {
            Ok(stats) if stats.is_empty() => {
                println!("   📭 No documents ingested yet");
            }
            Ok(stats) => {
                for entry in &stats {
                    println!("   📄 {}: {} chunks", entry.document_type, entry.row_count);
                    if let Some(last) = entry.last_created_at {
                        println!("      Last ingested: {}", last.format("%Y-%m-%d %H:%M:%S"));
                    }
                }
            }
            Err(error) => {
                println!("   ❌ Failed to load document statistics: {error}");
            }
        }
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'sgs-rag setup' once to provision the database schema");
    println!("   • Use 'sgs-rag ingest' to process the document directories");
    println!("   • Use 'sgs-rag chat' to ask questions about the archive");

    Ok(())
}
