//! # Ask a Document
//!
//! Index one `.pdf`, `.txt` or `.docx` file and ask questions about it.
//! Answers quote the most relevant excerpts; nothing is generated.
//!
//! The embedding provider comes from `EMBEDDINGS_PROVIDER` (`local` or
//! `openai`, read from `.env` too) unless `--provider` overrides it.
//!
//! Run:
//! - `cargo run -p docqa-demos -- handbook.pdf`
//! - `OPENAI_API_KEY=... cargo run -p docqa-demos --features openai -- handbook.pdf --provider openai -q "What is the refund policy?"`

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use docqa_rag::{
    EmbeddingsConfig, ExtractiveComposer, ProviderKind, RagAnswer, RagConfig, RagPipeline,
    SessionState, SourceCitation, create_embedding_provider,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ask-document")]
#[command(about = "Grounded question answering over a single document")]
struct Args {
    /// Document to index (.pdf, .txt or .docx)
    path: PathBuf,

    /// Question to ask; repeat for several. Without one, questions are read from stdin.
    #[arg(short, long = "question")]
    questions: Vec<String>,

    /// Number of chunks to retrieve (2-10)
    #[arg(short, long, default_value_t = docqa_rag::config::DEFAULT_TOP_K)]
    k: usize,

    /// Maximum characters per chunk
    #[arg(long, default_value_t = docqa_rag::config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, default_value_t = docqa_rag::config::DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    /// Embedding provider (local or openai), overriding EMBEDDINGS_PROVIDER
    #[arg(long)]
    provider: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if args.json_logs {
        docqa_telemetry::init_json_telemetry("ask-document")?;
    } else {
        docqa_telemetry::init_telemetry("ask-document")?;
    }

    let config = RagConfig::builder()
        .chunk_size(args.chunk_size)
        .chunk_overlap(args.chunk_overlap)
        .top_k(args.k)
        .build()?;

    let mut embeddings = EmbeddingsConfig::from_env()?;
    if let Some(provider) = &args.provider {
        embeddings.provider = provider.parse::<ProviderKind>()?;
    }
    let provider = create_embedding_provider(&embeddings)
        .with_context(|| format!("cannot create the {} embedding provider", embeddings.provider))?;

    let pipeline = RagPipeline::builder().config(config).embedding_provider(provider).build()?;

    let document = pipeline
        .index_document(&args.path)
        .await
        .with_context(|| format!("failed to index {}", args.path.display()))?;
    println!("Indexed {} ({} chunks)", document.name(), document.chunk_count());

    let session = SessionState::new();
    session.activate(document).await;
    let composer = ExtractiveComposer::new();

    if !args.questions.is_empty() {
        for question in &args.questions {
            let answer = session.ask(question, &composer).await?;
            print_answer(question, &answer);
        }
        return Ok(());
    }

    println!("Ask a question, or \"quit\" to exit.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let question = line?;
        if matches!(question.trim(), "quit" | "exit") {
            break;
        }

        match session.ask(&question, &composer).await {
            Ok(answer) => print_answer(&question, &answer),
            Err(e) => eprintln!("error: {e}"),
        }
    }

    info!(messages = session.history().await.len(), "session finished");
    Ok(())
}

fn print_answer(question: &str, answer: &RagAnswer) {
    if !question.trim().is_empty() {
        println!("\nQ: {question}");
    }
    println!("{}\n", answer.answer);

    for citation in SourceCitation::from_results(&answer.sources) {
        println!("[{}]", citation.label);
        println!("{}\n", citation.snippet);
    }
}
