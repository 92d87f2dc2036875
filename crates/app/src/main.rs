use chrono::Utc;
use clap::{Parser, Subcommand};
use doc_assist_core::{
    build_index, build_system, build_user, load_profile, retrieve, ChatClient, ChunkParams,
    ChromaStore, LopdfExtractor, OllamaChat, OllamaEmbedder, RetrievalParams, NO_CONTEXT_NOTE,
};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod server;

#[derive(Parser)]
#[command(name = "doc-assist", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Ollama base URL
    #[arg(long, env = "OLLAMA_URL", default_value = "http://127.0.0.1:11434")]
    ollama_url: String,

    /// Embedding model name
    #[arg(long, env = "EMBED_MODEL", default_value = "nomic-embed-text")]
    embed_model: String,

    /// Chat model name
    #[arg(long, env = "CHAT_MODEL", default_value = "phi3")]
    chat_model: String,

    /// Chroma base URL
    #[arg(long, env = "CHROMA_URL", default_value = "http://127.0.0.1:8000")]
    chroma_url: String,

    /// Collection name
    #[arg(long, env = "COLLECTION", default_value = "training")]
    collection: String,

    /// Chunk window width, in characters
    #[arg(long, env = "MAX_CHARS", default_value_t = 2_800)]
    max_chars: usize,

    /// Overlap between consecutive windows, in characters
    #[arg(long, env = "OVERLAP_CHARS", default_value_t = 400)]
    overlap_chars: usize,

    /// Tails shorter than this merge into the previous chunk
    #[arg(long, env = "MIN_TAIL_MERGE", default_value_t = 300)]
    min_tail_merge: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Sweep a folder of PDFs and (re-)index every document.
    Index {
        /// Folder containing the training PDFs.
        #[arg(long, env = "DOCS_PATH", default_value = "./materials")]
        docs: String,
    },
    /// Ask a single question grounded in the indexed material.
    Ask {
        /// The question to answer.
        message: String,
        /// Profile id (file under the profiles directory).
        #[arg(long, default_value = "ana")]
        user: String,
        /// Profiles directory.
        #[arg(long, env = "PROFILES_PATH", default_value = "./profiles")]
        profiles: String,
        /// Number of neighbors to consider.
        #[arg(long, default_value_t = 4)]
        k: usize,
        /// Maximum cosine distance for a neighbor to count as relevant.
        #[arg(long, default_value_t = 0.4)]
        threshold: f32,
        /// Sampling temperature for the answer.
        #[arg(long, default_value_t = 0.3)]
        temperature: f32,
    },
    /// Serve the HTTP API (health, sources, ingest, chat).
    Serve {
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
        /// Profiles directory.
        #[arg(long, env = "PROFILES_PATH", default_value = "./profiles")]
        profiles: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let embedder = OllamaEmbedder::new(&cli.ollama_url, &cli.embed_model)?;
    let chat = OllamaChat::new(&cli.ollama_url, &cli.chat_model)?;
    let store = ChromaStore::new(&cli.chroma_url, &cli.collection)?;
    let chunk_params = ChunkParams {
        max_chars: cli.max_chars,
        overlap_chars: cli.overlap_chars,
        min_tail_merge: cli.min_tail_merge,
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "doc-assist boot"
    );

    match cli.command {
        Command::Index { docs } => {
            let dim = embedder.probe().await?;
            info!(dim, model = %cli.embed_model, "embedding model ready");

            let stats = build_index(
                Path::new(&docs),
                &chunk_params,
                &LopdfExtractor,
                &embedder,
                &store,
            )
            .await?;

            println!(
                "indexed {} files, {} fragments written, collection total {}",
                stats.files, stats.chunks, stats.total_after
            );
        }
        Command::Ask {
            message,
            user,
            profiles,
            k,
            threshold,
            temperature,
        } => {
            let profile = load_profile(Path::new(&profiles), &user);
            let params = RetrievalParams {
                k,
                threshold,
                fallback_if_empty: true,
            };

            let result = retrieve(&message, &params, &embedder, &store).await?;

            let system_prompt = build_system(&profile);
            let mut user_prompt = build_user(&message, &result.context);
            if result.used_count == 0 {
                user_prompt.push_str(NO_CONTEXT_NOTE);
            }

            let answer = chat.chat(&system_prompt, &user_prompt, temperature).await?;

            println!("\n--- Answer ---\n");
            println!("{answer}");
            if !result.citations.is_empty() {
                println!("\n--- Sources ---");
                for tag in &result.citations {
                    println!(" - {tag}");
                }
            }
        }
        Command::Serve { port, profiles } => {
            let dim = embedder.probe().await?;
            info!(dim, model = %cli.embed_model, "embedding model ready");

            let state = server::AppState::new(
                embedder,
                chat,
                store,
                chunk_params,
                profiles.into(),
                cli.chat_model.clone(),
            );
            server::run(state, port).await?;
        }
    }

    Ok(())
}
